// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-memory store backed by concurrent maps.
//!
//! Provides typed operations for:
//! - Meetings (mirrored external events and locally created ones)
//! - Attendance (per meeting/user status relations)
//! - Guests (append-only check-in records)
//! - Users (organizer and attendee resolution)

use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::error::AppError;
use crate::models::{
    AttendanceStatus, GuestAttendee, Meeting, MeetingAttendee, MeetingCandidate, MeetingCategory,
    NewMeeting, NewUser, User,
};
use crate::store::{AttendanceCounts, MeetingFilter, MeetingStore, UpsertOutcome};

/// Concurrent in-memory meeting store.
///
/// The external-id index entry is held for the whole upsert, so two
/// concurrent upserts with the same external event id serialize on that
/// entry: one inserts, the other sees the index hit and updates in place.
pub struct MemoryStore {
    meetings: DashMap<i64, Meeting>,
    /// external event id -> meeting id
    external_index: DashMap<String, i64>,
    attendance: DashMap<(i64, i64), MeetingAttendee>,
    guests: DashMap<i64, Vec<GuestAttendee>>,
    users: DashMap<i64, User>,
    /// lowercased email -> user id
    user_email_index: DashMap<String, i64>,
    next_meeting_id: AtomicI64,
    next_user_id: AtomicI64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            meetings: DashMap::new(),
            external_index: DashMap::new(),
            attendance: DashMap::new(),
            guests: DashMap::new(),
            users: DashMap::new(),
            user_email_index: DashMap::new(),
            next_meeting_id: AtomicI64::new(1),
            next_user_id: AtomicI64::new(1),
        }
    }

    fn next_meeting_id(&self) -> i64 {
        self.next_meeting_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Overwrite the externally-sourced fields of an existing meeting.
    ///
    /// `id` and `category` are locally owned and survive updates.
    fn apply_candidate(meeting: &mut Meeting, candidate: &MeetingCandidate, organizer_id: Option<i64>) {
        meeting.title = candidate.title.clone();
        meeting.description = candidate.description.clone();
        meeting.start_time = candidate.start_time;
        meeting.end_time = candidate.end_time;
        meeting.location = candidate.location.clone();
        meeting.organizer_id = organizer_id;
        meeting.organizer_name = candidate.organizer_name.clone();
        meeting.organizer_email = candidate.organizer_email.clone();
        meeting.is_recurring = candidate.is_recurring;
        meeting.company_domain = candidate.company_domain.clone();
    }

    fn matches(filter: &MeetingFilter, meeting: &Meeting) -> bool {
        if let Some(date) = filter.date {
            if meeting.start_time.date_naive() != date {
                return false;
            }
        }
        if let Some(domain) = &filter.domain {
            if !meeting.company_domain.eq_ignore_ascii_case(domain) {
                return false;
            }
        }
        if let Some(category) = filter.category {
            if meeting.category != category {
                return false;
            }
        }
        if let Some(search) = &filter.search {
            let needle = search.to_lowercase();
            let title_hit = meeting.title.to_lowercase().contains(&needle);
            let location_hit = meeting
                .location
                .as_deref()
                .is_some_and(|l| l.to_lowercase().contains(&needle));
            if !title_hit && !location_hit {
                return false;
            }
        }
        true
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MeetingStore for MemoryStore {
    // ─── Meeting Operations ──────────────────────────────────────

    async fn upsert_by_external_id(
        &self,
        candidate: &MeetingCandidate,
        organizer_id: Option<i64>,
    ) -> Result<UpsertOutcome, AppError> {
        match self.external_index.entry(candidate.external_event_id.clone()) {
            Entry::Occupied(slot) => {
                let meeting_id = *slot.get();
                let mut existing = self.meetings.get_mut(&meeting_id).ok_or_else(|| {
                    AppError::Store(format!(
                        "external index points at missing meeting {}",
                        meeting_id
                    ))
                })?;
                Self::apply_candidate(&mut existing, candidate, organizer_id);
                tracing::debug!(
                    external_event_id = %candidate.external_event_id,
                    meeting_id,
                    "Updated meeting from external event"
                );
                Ok(UpsertOutcome::Updated(existing.clone()))
            }
            Entry::Vacant(slot) => {
                let meeting_id = self.next_meeting_id();
                let meeting = Meeting {
                    id: meeting_id,
                    external_event_id: Some(candidate.external_event_id.clone()),
                    title: candidate.title.clone(),
                    description: candidate.description.clone(),
                    start_time: candidate.start_time,
                    end_time: candidate.end_time,
                    location: candidate.location.clone(),
                    organizer_id,
                    organizer_name: candidate.organizer_name.clone(),
                    organizer_email: candidate.organizer_email.clone(),
                    category: MeetingCategory::default(),
                    is_recurring: candidate.is_recurring,
                    company_domain: candidate.company_domain.clone(),
                };
                // Publish the meeting before the index entry so a reader that
                // finds the index always finds the row.
                self.meetings.insert(meeting_id, meeting.clone());
                slot.insert(meeting_id);
                tracing::debug!(
                    external_event_id = %candidate.external_event_id,
                    meeting_id,
                    "Inserted meeting from external event"
                );
                Ok(UpsertOutcome::Inserted(meeting))
            }
        }
    }

    async fn insert_meeting(&self, new: NewMeeting) -> Result<Meeting, AppError> {
        let meeting_id = self.next_meeting_id();
        let meeting = Meeting {
            id: meeting_id,
            external_event_id: None,
            title: new.title,
            description: new.description,
            start_time: new.start_time,
            end_time: new.end_time,
            location: Some(new.location),
            organizer_id: Some(new.organizer_id),
            organizer_name: new.organizer_name,
            organizer_email: new.organizer_email,
            category: new.category,
            is_recurring: false,
            company_domain: new.company_domain,
        };
        self.meetings.insert(meeting_id, meeting.clone());
        Ok(meeting)
    }

    async fn get_meeting(&self, meeting_id: i64) -> Result<Option<Meeting>, AppError> {
        Ok(self.meetings.get(&meeting_id).map(|m| m.clone()))
    }

    async fn find_meeting_by_external_id(
        &self,
        external_event_id: &str,
    ) -> Result<Option<Meeting>, AppError> {
        let Some(meeting_id) = self.external_index.get(external_event_id).map(|id| *id) else {
            return Ok(None);
        };
        let meeting = self.meetings.get(&meeting_id).map(|m| m.clone()).ok_or_else(|| {
            AppError::Store(format!(
                "external index points at missing meeting {}",
                meeting_id
            ))
        })?;
        Ok(Some(meeting))
    }

    async fn list_meetings(&self, filter: &MeetingFilter) -> Result<Vec<Meeting>, AppError> {
        let mut out: Vec<Meeting> = self
            .meetings
            .iter()
            .filter(|entry| Self::matches(filter, entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        out.sort_by_key(|m| m.start_time);
        Ok(out)
    }

    async fn meetings_overlapping(
        &self,
        location: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Meeting>, AppError> {
        // Half-open overlap test; locations compare as exact strings.
        let mut out: Vec<Meeting> = self
            .meetings
            .iter()
            .filter(|entry| {
                let m = entry.value();
                m.location.as_deref() == Some(location)
                    && m.start_time < end
                    && m.end_time > start
            })
            .map(|entry| entry.value().clone())
            .collect();
        out.sort_by_key(|m| m.start_time);
        Ok(out)
    }

    // ─── Attendance Operations ───────────────────────────────────

    async fn upsert_attendance(
        &self,
        meeting_id: i64,
        user_id: i64,
        status: AttendanceStatus,
    ) -> Result<(), AppError> {
        self.attendance.insert(
            (meeting_id, user_id),
            MeetingAttendee {
                meeting_id,
                user_id,
                status,
            },
        );
        Ok(())
    }

    async fn get_attendance(
        &self,
        meeting_id: i64,
        user_id: i64,
    ) -> Result<Option<MeetingAttendee>, AppError> {
        Ok(self.attendance.get(&(meeting_id, user_id)).map(|a| a.clone()))
    }

    async fn attendance_counts(&self, meeting_id: i64) -> Result<AttendanceCounts, AppError> {
        let attendees = self
            .attendance
            .iter()
            .filter(|entry| entry.key().0 == meeting_id)
            .count();
        let guests = self.guests.get(&meeting_id).map(|g| g.len()).unwrap_or(0);
        Ok(AttendanceCounts { attendees, guests })
    }

    async fn insert_guest(&self, guest: GuestAttendee) -> Result<(), AppError> {
        self.guests.entry(guest.meeting_id).or_default().push(guest);
        Ok(())
    }

    // ─── User Operations ─────────────────────────────────────────

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let key = email.trim().to_lowercase();
        let Some(user_id) = self.user_email_index.get(&key).map(|id| *id) else {
            return Ok(None);
        };
        let user = self.users.get(&user_id).map(|u| u.clone()).ok_or_else(|| {
            AppError::Store(format!("email index points at missing user {}", user_id))
        })?;
        Ok(Some(user))
    }

    async fn insert_user(&self, new: NewUser) -> Result<User, AppError> {
        let email = new.email.trim().to_lowercase();
        match self.user_email_index.entry(email.clone()) {
            Entry::Occupied(_) => Err(AppError::Conflict(format!(
                "user with email {} already exists",
                email
            ))),
            Entry::Vacant(slot) => {
                let user_id = self.next_user_id.fetch_add(1, Ordering::Relaxed);
                let user = User {
                    id: user_id,
                    email,
                    full_name: new.full_name,
                    is_active: true,
                };
                self.users.insert(user_id, user.clone());
                slot.insert(user_id);
                Ok(user)
            }
        }
    }
}
