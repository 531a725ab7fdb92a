// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared fixtures: a configurable in-memory calendar directory fake plus
//! builders for accounts, events, and candidates.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Timelike, Utc};
use meeting_tracker::error::AppError;
use meeting_tracker::models::{DirectoryAccount, MeetingCandidate};
use meeting_tracker::services::graph::{
    CalendarEvent, EmailAddress, EventDateTime, EventLocation, EventOrganizer,
};
use meeting_tracker::services::{CalendarDirectory, EventResponse};

/// One recorded external event response.
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub struct RecordedPush {
    pub mail: String,
    pub event_id: String,
    pub action: &'static str,
    pub comment: String,
}

/// Configurable directory fake. All setup methods take `&self` so tests can
/// reconfigure it between sync runs while it is shared behind an `Arc`.
#[derive(Default)]
pub struct MockDirectory {
    accounts: Mutex<Vec<DirectoryAccount>>,
    /// Account id -> calendar events
    events: Mutex<HashMap<String, Vec<CalendarEvent>>>,
    /// Mails whose free-busy probe answers "busy"
    busy_mails: Mutex<HashSet<String>>,
    /// Account ids whose mailbox probe answers "not provisioned"
    dead_mailboxes: Mutex<HashSet<String>>,
    /// Account ids whose event fetch fails
    failing_fetches: Mutex<HashSet<String>>,
    push_delay: Mutex<Option<Duration>>,
    fail_pushes: AtomicBool,
    fetched: Mutex<Vec<String>>,
    pushes: Mutex<Vec<RecordedPush>>,
}

#[allow(dead_code)]
impl MockDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an account whose UPN matches its mail.
    pub fn add_account(&self, id: &str, mail: &str, name: &str) {
        self.add_account_with_upn(id, mail, mail, name);
    }

    pub fn add_account_with_upn(&self, id: &str, mail: &str, upn: &str, name: &str) {
        self.accounts.lock().unwrap().push(DirectoryAccount {
            id: id.to_string(),
            mail: Some(mail.to_string()),
            display_name: name.to_string(),
            user_principal_name: Some(upn.to_string()),
        });
    }

    /// Replace the account's event list and mark its mailbox busy so the
    /// free-busy gate lets the fetch through.
    pub fn set_events(&self, account_id: &str, events: Vec<CalendarEvent>) {
        let mail = self
            .accounts
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.id == account_id)
            .and_then(|a| a.mail.clone());
        if let Some(mail) = mail {
            self.busy_mails.lock().unwrap().insert(mail);
        }
        self.events
            .lock()
            .unwrap()
            .insert(account_id.to_string(), events);
    }

    /// Mark a mailbox busy without giving it any events.
    pub fn mark_busy(&self, mail: &str) {
        self.busy_mails.lock().unwrap().insert(mail.to_string());
    }

    pub fn set_probe_dead(&self, account_id: &str) {
        self.dead_mailboxes
            .lock()
            .unwrap()
            .insert(account_id.to_string());
    }

    pub fn fail_fetch(&self, account_id: &str) {
        self.failing_fetches
            .lock()
            .unwrap()
            .insert(account_id.to_string());
    }

    pub fn set_push_delay(&self, delay: Duration) {
        *self.push_delay.lock().unwrap() = Some(delay);
    }

    pub fn set_push_failure(&self) {
        self.fail_pushes.store(true, Ordering::SeqCst);
    }

    /// Account ids whose events were actually fetched, in call order.
    pub fn fetched_accounts(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }

    pub fn pushes(&self) -> Vec<RecordedPush> {
        self.pushes.lock().unwrap().clone()
    }
}

#[async_trait]
impl CalendarDirectory for MockDirectory {
    async fn list_accounts(&self) -> Result<Vec<DirectoryAccount>, AppError> {
        Ok(self.accounts.lock().unwrap().clone())
    }

    async fn probe_mailbox(&self, account_id: &str) -> Result<bool, AppError> {
        Ok(!self.dead_mailboxes.lock().unwrap().contains(account_id))
    }

    async fn has_busy(
        &self,
        mail: &str,
        _start: DateTime<Utc>,
        _end: DateTime<Utc>,
        _interval_minutes: u32,
    ) -> Result<bool, AppError> {
        Ok(self.busy_mails.lock().unwrap().contains(mail))
    }

    async fn fetch_events(
        &self,
        account_id: &str,
        _start: DateTime<Utc>,
        _end: DateTime<Utc>,
    ) -> Result<Vec<CalendarEvent>, AppError> {
        self.fetched.lock().unwrap().push(account_id.to_string());
        if self.failing_fetches.lock().unwrap().contains(account_id) {
            return Err(AppError::GraphApi("calendar fetch failed".to_string()));
        }
        Ok(self
            .events
            .lock()
            .unwrap()
            .get(account_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn find_account(&self, email: &str) -> Result<Option<DirectoryAccount>, AppError> {
        Ok(self
            .accounts
            .lock()
            .unwrap()
            .iter()
            .find(|a| {
                a.mail
                    .as_deref()
                    .is_some_and(|m| m.eq_ignore_ascii_case(email))
            })
            .cloned())
    }

    async fn respond_to_event(
        &self,
        mail: &str,
        external_event_id: &str,
        response: EventResponse,
        comment: &str,
    ) -> Result<(), AppError> {
        let delay = *self.push_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_pushes.load(Ordering::SeqCst) {
            return Err(AppError::GraphApi("push rejected".to_string()));
        }
        self.pushes.lock().unwrap().push(RecordedPush {
            mail: mail.to_string(),
            event_id: external_event_id.to_string(),
            action: response.action(),
            comment: comment.to_string(),
        });
        Ok(())
    }
}

/// Timestamp shorthand for fixtures.
#[allow(dead_code)]
pub fn ts(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, minute, 0)
        .unwrap()
}

/// Graph-shaped event fixture. Timestamps are rendered the way Graph reports
/// them, as a naive value with a seven-digit fraction.
#[allow(dead_code)]
pub fn graph_event(
    id: &str,
    subject: &str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    room: &str,
    organizer_mail: &str,
) -> CalendarEvent {
    CalendarEvent {
        id: id.to_string(),
        subject: Some(subject.to_string()),
        body_preview: None,
        start: wire_time(start),
        end: wire_time(end),
        location: Some(EventLocation {
            display_name: Some(room.to_string()),
        }),
        organizer: Some(EventOrganizer {
            email_address: Some(EmailAddress {
                name: Some("Organizer".to_string()),
                address: Some(organizer_mail.to_string()),
            }),
        }),
        recurrence: None,
    }
}

/// Event whose start timestamp cannot be parsed.
#[allow(dead_code)]
pub fn malformed_event(id: &str) -> CalendarEvent {
    CalendarEvent {
        id: id.to_string(),
        subject: Some("Broken".to_string()),
        body_preview: None,
        start: EventDateTime {
            date_time: "not a timestamp".to_string(),
            time_zone: None,
        },
        end: wire_time(ts(2026, 3, 10, 11, 0)),
        location: None,
        organizer: None,
        recurrence: None,
    }
}

/// Candidate fixture for direct store upserts.
#[allow(dead_code)]
pub fn candidate(
    external_id: &str,
    title: &str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> MeetingCandidate {
    MeetingCandidate {
        external_event_id: external_id.to_string(),
        title: title.to_string(),
        description: None,
        start_time: start,
        end_time: end,
        location: Some("Room A".to_string()),
        organizer_name: Some("Organizer".to_string()),
        organizer_email: Some("organizer@example.com".to_string()),
        is_recurring: false,
        company_domain: "example.com".to_string(),
    }
}

fn wire_time(t: DateTime<Utc>) -> EventDateTime {
    // chrono has no 7-digit fraction specifier (only %.3f/%.6f/%.9f), so the
    // Graph-style fraction is rendered by hand in 100ns units.
    EventDateTime {
        date_time: format!(
            "{}.{:07}",
            t.format("%Y-%m-%dT%H:%M:%S"),
            t.nanosecond() / 100
        ),
        time_zone: Some("UTC".to_string()),
    }
}
