// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Attendance updates: local commit first, then a best-effort push of the
//! decision to the external calendar.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::config::Config;
use crate::error::AppError;
use crate::models::{email_domain, AttendanceStatus};
use crate::services::graph::{CalendarDirectory, EventResponse};
use crate::store::MeetingStore;

/// Outcome of one attendance update.
///
/// `local_committed` is always true when this struct is returned at all; a
/// failed local write surfaces as an error instead. The push outcome is an
/// advisory.
#[derive(Debug, Clone, Serialize)]
pub struct AttendanceUpdate {
    pub local_committed: bool,
    pub external_pushed: bool,
    pub error: Option<String>,
}

pub struct AttendanceService {
    store: Arc<dyn MeetingStore>,
    directory: Arc<dyn CalendarDirectory>,
    company_domain: String,
    push_timeout: Duration,
}

impl AttendanceService {
    pub fn new(
        store: Arc<dyn MeetingStore>,
        directory: Arc<dyn CalendarDirectory>,
        config: &Config,
    ) -> Self {
        Self {
            store,
            directory,
            company_domain: config.company_domain.to_lowercase(),
            push_timeout: Duration::from_secs(config.push_timeout_secs),
        }
    }

    /// Record an attendance status for a user and push the decision to the
    /// external calendar.
    ///
    /// The local write is the source of truth and commits before any
    /// external call; push failure or timeout never undoes it.
    pub async fn update_attendance(
        &self,
        meeting_id: i64,
        user_email: &str,
        status: AttendanceStatus,
    ) -> Result<AttendanceUpdate, AppError> {
        let user = self
            .store
            .find_user_by_email(user_email)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {}", user_email)))?;

        if email_domain(&user.email).as_deref() != Some(self.company_domain.as_str()) {
            return Err(AppError::BadRequest(format!(
                "Email domain not allowed: {}",
                user.email
            )));
        }

        let meeting = self
            .store
            .get_meeting(meeting_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Meeting {}", meeting_id)))?;

        self.store
            .upsert_attendance(meeting.id, user.id, status)
            .await?;
        tracing::info!(
            meeting_id = meeting.id,
            user_id = user.id,
            status = %status,
            "Attendance recorded"
        );

        let Some(external_event_id) = meeting.external_event_id.as_deref() else {
            // Locally created meeting: nothing to push to
            return Ok(AttendanceUpdate {
                local_committed: true,
                external_pushed: false,
                error: None,
            });
        };

        match self
            .push_response(external_event_id, &user.email, status)
            .await
        {
            Ok(()) => Ok(AttendanceUpdate {
                local_committed: true,
                external_pushed: true,
                error: None,
            }),
            Err(e) => {
                tracing::warn!(
                    meeting_id = meeting.id,
                    user = %user.email,
                    error = %e,
                    transient = e.is_transient(),
                    "Attendance push failed, local status kept"
                );
                Ok(AttendanceUpdate {
                    local_committed: true,
                    external_pushed: false,
                    error: Some(e.to_string()),
                })
            }
        }
    }

    /// Resolve the directory identity, verify the mailbox, map the status
    /// and push. The whole chain is bounded by the push timeout; directory
    /// lookup failure, liveness failure and the call itself failing all
    /// collapse to a single push error.
    async fn push_response(
        &self,
        external_event_id: &str,
        email: &str,
        status: AttendanceStatus,
    ) -> Result<(), AppError> {
        let push = async {
            let account = self
                .directory
                .find_account(email)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Directory account {}", email)))?;

            if !self.directory.probe_mailbox(&account.id).await? {
                return Err(AppError::GraphApi(format!(
                    "Mailbox not active for {}",
                    email
                )));
            }

            let (response, comment) = map_status(status);
            self.directory
                .respond_to_event(email, external_event_id, response, &comment)
                .await
        };

        match tokio::time::timeout(self.push_timeout, push).await {
            Ok(result) => result,
            Err(_) => Err(AppError::GraphApi(format!(
                "Push timed out after {}s",
                self.push_timeout.as_secs()
            ))),
        }
    }
}

/// Map a local status to the external response verb and its comment.
/// Everything that is neither present nor absent answers tentative.
fn map_status(status: AttendanceStatus) -> (EventResponse, String) {
    match status {
        AttendanceStatus::Present => (EventResponse::Accept, "Marked as present".to_string()),
        AttendanceStatus::Absent => (EventResponse::Decline, "Marked as absent".to_string()),
        other => (
            EventResponse::Tentative,
            format!("Attendance status: {}", other),
        ),
    }
}
