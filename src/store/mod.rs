// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Persistence layer.
//!
//! `MeetingStore` is the boundary the sync engine and the services write
//! through. The crate ships one implementation, the DashMap-backed
//! [`MemoryStore`]; a SQL-backed store would implement the same trait with a
//! unique index on `external_event_id` standing in for the entry guard.

pub mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use crate::error::AppError;
use crate::models::{
    AttendanceStatus, GuestAttendee, Meeting, MeetingAttendee, MeetingCandidate, MeetingCategory,
    NewMeeting, NewUser, User,
};

/// Result of an idempotent upsert keyed by external event id.
#[derive(Debug, Clone)]
pub enum UpsertOutcome {
    /// No meeting with this external id existed; a new row was created.
    Inserted(Meeting),
    /// An existing meeting was found and its externally-sourced fields
    /// overwritten in place.
    Updated(Meeting),
}

impl UpsertOutcome {
    pub fn meeting(&self) -> &Meeting {
        match self {
            UpsertOutcome::Inserted(m) | UpsertOutcome::Updated(m) => m,
        }
    }
}

/// Filters for listing meetings. All fields are conjunctive; `None` means
/// "don't filter on this".
#[derive(Debug, Clone, Default)]
pub struct MeetingFilter {
    /// Meetings whose start time falls on this UTC day.
    pub date: Option<NaiveDate>,
    /// Exact match on the meeting's company domain.
    pub domain: Option<String>,
    /// Case-insensitive substring match on title or location.
    pub search: Option<String>,
    pub category: Option<MeetingCategory>,
}

/// Attendee tallies for one meeting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AttendanceCounts {
    pub attendees: usize,
    pub guests: usize,
}

/// Storage operations the sync engine and services depend on.
///
/// Implementations must make `upsert_by_external_id` atomic per external
/// event id: two concurrent upserts with the same id must resolve to a single
/// meeting row, one insert and one update, in either order.
#[async_trait]
pub trait MeetingStore: Send + Sync {
    /// Insert or update the meeting identified by the candidate's external
    /// event id.
    ///
    /// Only externally-sourced fields are written. Attendance and guest
    /// relations hanging off an existing meeting are never touched, and the
    /// internal id of an updated meeting never changes.
    async fn upsert_by_external_id(
        &self,
        candidate: &MeetingCandidate,
        organizer_id: Option<i64>,
    ) -> Result<UpsertOutcome, AppError>;

    /// Insert a locally-created meeting (no external event id).
    async fn insert_meeting(&self, new: NewMeeting) -> Result<Meeting, AppError>;

    async fn get_meeting(&self, meeting_id: i64) -> Result<Option<Meeting>, AppError>;

    async fn find_meeting_by_external_id(
        &self,
        external_event_id: &str,
    ) -> Result<Option<Meeting>, AppError>;

    /// List meetings matching the filter, sorted by start time ascending.
    async fn list_meetings(&self, filter: &MeetingFilter) -> Result<Vec<Meeting>, AppError>;

    /// All meetings at `location` whose interval overlaps `[start, end)`.
    async fn meetings_overlapping(
        &self,
        location: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Meeting>, AppError>;

    /// Record an attendance status, creating the (meeting, user) relation on
    /// first use.
    async fn upsert_attendance(
        &self,
        meeting_id: i64,
        user_id: i64,
        status: AttendanceStatus,
    ) -> Result<(), AppError>;

    async fn get_attendance(
        &self,
        meeting_id: i64,
        user_id: i64,
    ) -> Result<Option<MeetingAttendee>, AppError>;

    async fn attendance_counts(&self, meeting_id: i64) -> Result<AttendanceCounts, AppError>;

    /// Append a guest check-in. Guests are never deduplicated.
    async fn insert_guest(&self, guest: GuestAttendee) -> Result<(), AppError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    async fn insert_user(&self, new: NewUser) -> Result<User, AppError>;
}
