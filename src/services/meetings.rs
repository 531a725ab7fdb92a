// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Meeting listing, local creation, and guest check-in.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::config::Config;
use crate::error::AppError;
use crate::models::{GuestAttendee, GuestInfo, Meeting, MeetingCategory, NewMeeting};
use crate::services::rooms::RoomService;
use crate::store::{MeetingFilter, MeetingStore};

/// Listing row with attendee tallies.
#[derive(Debug, Clone, Serialize)]
pub struct MeetingSummary {
    pub id: i64,
    pub title: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Organizer display name, when known
    pub organizer: Option<String>,
    pub location: Option<String>,
    pub category: MeetingCategory,
    pub attendee_count: usize,
    pub guest_count: usize,
    pub external_event_id: Option<String>,
}

/// Request to create a meeting locally (no external counterpart).
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateMeetingRequest {
    #[validate(length(min = 1, message = "title is required"))]
    pub title: String,
    pub description: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[validate(length(min = 1, message = "location is required"))]
    pub location: String,
    #[validate(email(message = "invalid organizer email"))]
    pub organizer_email: String,
    /// Defaults to the team-meeting category when omitted
    pub category: Option<MeetingCategory>,
}

pub struct MeetingService {
    store: Arc<dyn MeetingStore>,
    rooms: RoomService,
    company_domain: String,
}

impl MeetingService {
    pub fn new(store: Arc<dyn MeetingStore>, config: &Config) -> Self {
        Self {
            rooms: RoomService::new(store.clone()),
            store,
            company_domain: config.company_domain.to_lowercase(),
        }
    }

    /// List meetings matching the filter with attendee and guest tallies,
    /// sorted by start time.
    pub async fn list_meetings(
        &self,
        filter: &MeetingFilter,
    ) -> Result<Vec<MeetingSummary>, AppError> {
        let meetings = self.store.list_meetings(filter).await?;

        let mut summaries = Vec::with_capacity(meetings.len());
        for meeting in meetings {
            let counts = self.store.attendance_counts(meeting.id).await?;
            summaries.push(MeetingSummary {
                id: meeting.id,
                title: meeting.title,
                start_time: meeting.start_time,
                end_time: meeting.end_time,
                organizer: meeting.organizer_name,
                location: meeting.location,
                category: meeting.category,
                attendee_count: counts.attendees,
                guest_count: counts.guests,
                external_event_id: meeting.external_event_id,
            });
        }
        Ok(summaries)
    }

    /// The closed set of meeting categories.
    pub fn categories() -> &'static [MeetingCategory] {
        &MeetingCategory::ALL
    }

    /// Create a meeting if the organizer exists and the room is free for the
    /// whole interval.
    pub async fn create_meeting(&self, request: CreateMeetingRequest) -> Result<Meeting, AppError> {
        request
            .validate()
            .map_err(|e| AppError::BadRequest(e.to_string()))?;

        if request.end_time <= request.start_time {
            return Err(AppError::BadRequest(
                "end time must be after start time".to_string(),
            ));
        }

        let organizer = self
            .store
            .find_user_by_email(&request.organizer_email)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Organizer {}", request.organizer_email))
            })?;

        if self
            .rooms
            .check_create_conflict(&request.location, request.start_time, request.end_time)
            .await?
        {
            return Err(AppError::Conflict(
                "Room is fully booked for the selected time".to_string(),
            ));
        }

        let meeting = self
            .store
            .insert_meeting(NewMeeting {
                title: request.title,
                description: request.description,
                start_time: request.start_time,
                end_time: request.end_time,
                location: request.location,
                organizer_id: organizer.id,
                organizer_name: Some(organizer.full_name),
                organizer_email: Some(organizer.email),
                category: request.category.unwrap_or_default(),
                company_domain: self.company_domain.clone(),
            })
            .await?;

        tracing::info!(
            meeting_id = meeting.id,
            title = %meeting.title,
            location = ?meeting.location,
            "Created meeting"
        );
        Ok(meeting)
    }

    /// Register a guest check-in against a meeting starting on `date` (UTC).
    pub async fn guest_checkin(
        &self,
        meeting_id: i64,
        guest: GuestInfo,
        date: NaiveDate,
    ) -> Result<(), AppError> {
        guest
            .validate()
            .map_err(|e| AppError::BadRequest(e.to_string()))?;

        let meeting = self
            .store
            .get_meeting(meeting_id)
            .await?
            .filter(|m| m.start_time.date_naive() == date)
            .ok_or_else(|| {
                AppError::NotFound("Meeting not found for selected date".to_string())
            })?;

        self.store
            .insert_guest(GuestAttendee {
                meeting_id: meeting.id,
                name: guest.name,
                email: guest.email,
                company: guest.company,
            })
            .await?;

        tracing::info!(meeting_id = meeting.id, "Guest checked in");
        Ok(())
    }
}
