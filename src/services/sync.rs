// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Calendar sync pipeline: directory filter, per-account event fetch, and
//! reconciliation into the store.
//!
//! One `run_once` call covers one time window. Per-account failures are
//! logged and counted but never abort the run; only a directory listing
//! failure does, since without it there is no population to sync.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures_util::{stream, StreamExt};

use crate::config::Config;
use crate::error::AppError;
use crate::models::{DirectoryAccount, MeetingCandidate};
use crate::services::directory::DirectoryFilter;
use crate::services::graph::{CalendarDirectory, CalendarEvent};
use crate::services::reconcile::{Reconciler, SyncReport};
use crate::store::MeetingStore;

/// The sync pipeline, wired once at startup and shared by the scheduler.
pub struct SyncEngine {
    directory: Arc<dyn CalendarDirectory>,
    filter: DirectoryFilter,
    reconciler: Reconciler,
    config: Config,
}

/// Per-account fetch result, merged across the fan-out.
#[derive(Default)]
struct AccountFetch {
    candidates: Vec<MeetingCandidate>,
    malformed: usize,
    failed: bool,
}

impl SyncEngine {
    pub fn new(
        directory: Arc<dyn CalendarDirectory>,
        store: Arc<dyn MeetingStore>,
        config: Config,
    ) -> Self {
        let filter = DirectoryFilter::new(directory.clone(), &config.company_domain);
        Self {
            directory,
            filter,
            reconciler: Reconciler::new(store),
            config,
        }
    }

    /// Run the full pipeline once for `[window_start, window_end)`.
    pub async fn run_once(
        &self,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<SyncReport, AppError> {
        let accounts = self.filter.company_accounts().await?;

        let (candidates, account_errors, malformed) =
            self.fetch_all(&accounts, window_start, window_end).await;

        let mut report = self.reconciler.reconcile(candidates).await;
        report.errors += account_errors;
        report.rejected += malformed;

        tracing::info!(
            window_start = %window_start,
            window_end = %window_end,
            accounts = accounts.len(),
            inserted = report.inserted,
            updated = report.updated,
            rejected = report.rejected,
            errors = report.errors,
            "Sync run complete"
        );
        Ok(report)
    }

    /// Fetch events for every account with bounded concurrency, then merge
    /// and deduplicate by external event id (last seen wins).
    async fn fetch_all(
        &self,
        accounts: &[DirectoryAccount],
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> (Vec<MeetingCandidate>, usize, usize) {
        // Futures are built eagerly so the stream holds no borrowing closure;
        // a closure here trips rustc's higher-ranked auto-trait check
        // (rust-lang/rust#102211) and the spawned sync task stops being Send.
        let account_futures: Vec<_> = accounts
            .iter()
            .map(|account| self.fetch_account(account, start, end))
            .collect();
        let fetches = stream::iter(account_futures)
            .buffer_unordered(self.config.fetch_concurrency)
            .collect::<Vec<AccountFetch>>()
            .await;

        let mut by_external_id: HashMap<String, MeetingCandidate> = HashMap::new();
        let mut account_errors = 0;
        let mut malformed = 0;
        for fetch in fetches {
            if fetch.failed {
                account_errors += 1;
            }
            malformed += fetch.malformed;
            for candidate in fetch.candidates {
                by_external_id.insert(candidate.external_event_id.clone(), candidate);
            }
        }

        let candidates: Vec<MeetingCandidate> = by_external_id.into_values().collect();
        tracing::debug!(
            accounts = accounts.len(),
            candidates = candidates.len(),
            account_errors,
            "Event fetch complete"
        );
        (candidates, account_errors, malformed)
    }

    /// Probe, free-busy gate, then detail fetch for one account. Sequential
    /// within the account; the caller runs accounts in parallel.
    async fn fetch_account(
        &self,
        account: &DirectoryAccount,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AccountFetch {
        let label = account.mail.as_deref().unwrap_or(&account.id);

        if !self.filter.is_live(account).await {
            return AccountFetch::default();
        }

        // Identity filtering guarantees mail is present for accounts that
        // reach this point.
        let Some(mail) = account.mail.as_deref() else {
            return AccountFetch::default();
        };

        let busy = match self
            .directory
            .has_busy(mail, start, end, self.config.freebusy_interval_minutes)
            .await
        {
            Ok(busy) => busy,
            Err(e) => {
                tracing::warn!(
                    account = %label,
                    error = %e,
                    transient = e.is_transient(),
                    "Free-busy lookup failed, skipping account"
                );
                return AccountFetch {
                    failed: true,
                    ..Default::default()
                };
            }
        };

        if !busy {
            tracing::debug!(account = %label, "No busy slots in window, skipping detail fetch");
            return AccountFetch::default();
        }

        let events = match self.directory.fetch_events(&account.id, start, end).await {
            Ok(events) => events,
            Err(e) => {
                tracing::warn!(
                    account = %label,
                    error = %e,
                    transient = e.is_transient(),
                    "Event fetch failed, skipping account"
                );
                return AccountFetch {
                    failed: true,
                    ..Default::default()
                };
            }
        };

        let mut fetch = AccountFetch::default();
        for event in events {
            match normalize_event(event, &self.config.company_domain) {
                Some(candidate) => fetch.candidates.push(candidate),
                None => fetch.malformed += 1,
            }
        }
        if fetch.malformed > 0 {
            tracing::warn!(
                account = %label,
                malformed = fetch.malformed,
                "Skipped events with unparseable times"
            );
        }
        tracing::debug!(account = %label, events = fetch.candidates.len(), "Fetched calendar events");
        fetch
    }
}

/// Map a wire event to the canonical candidate shape.
///
/// Returns `None` only when a timestamp cannot be parsed; missing or empty
/// text fields flow through for the reconciler's validation to judge.
fn normalize_event(event: CalendarEvent, company_domain: &str) -> Option<MeetingCandidate> {
    let start_time = event.start.to_utc()?;
    let end_time = event.end.to_utc()?;

    let (organizer_name, organizer_email) = match event.organizer.and_then(|o| o.email_address) {
        Some(addr) => (addr.name, addr.address),
        None => (None, None),
    };

    Some(MeetingCandidate {
        external_event_id: event.id,
        title: event.subject.unwrap_or_default(),
        description: event.body_preview,
        start_time,
        end_time,
        location: event.location.and_then(|l| l.display_name),
        organizer_name,
        organizer_email,
        is_recurring: event.recurrence.is_some(),
        company_domain: company_domain.to_string(),
    })
}
