// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Reconciler: merge fetched meeting candidates into the store.
//!
//! Upserts are keyed by external event id and idempotent; running the same
//! batch twice converges on the same rows. Malformed candidates and failed
//! upserts are counted, never fatal to the batch.

use std::sync::Arc;

use serde::Serialize;

use crate::models::MeetingCandidate;
use crate::store::{MeetingStore, UpsertOutcome};

/// Outcome counters for one sync run. Observability only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub inserted: usize,
    pub updated: usize,
    /// Candidates dropped for data reasons (missing field, bad interval,
    /// unparseable event times).
    pub rejected: usize,
    /// Operational failures that were caught and skipped (account fetches,
    /// record upserts).
    pub errors: usize,
}

/// Merges candidates into the store.
pub struct Reconciler {
    store: Arc<dyn MeetingStore>,
}

impl Reconciler {
    pub fn new(store: Arc<dyn MeetingStore>) -> Self {
        Self { store }
    }

    /// Upsert every candidate sequentially.
    ///
    /// The store contract makes each upsert atomic per external event id, so
    /// this is safe to run concurrently with meeting-creation requests and
    /// with an overlapping run.
    pub async fn reconcile(&self, candidates: Vec<MeetingCandidate>) -> SyncReport {
        let mut report = SyncReport::default();

        for candidate in candidates {
            if let Err(reason) = candidate.validate() {
                tracing::warn!(
                    external_event_id = %candidate.external_event_id,
                    reason,
                    "Rejected malformed candidate"
                );
                report.rejected += 1;
                continue;
            }

            let organizer_id = self.resolve_organizer(&candidate).await;

            match self.store.upsert_by_external_id(&candidate, organizer_id).await {
                Ok(UpsertOutcome::Inserted(_)) => report.inserted += 1,
                Ok(UpsertOutcome::Updated(_)) => report.updated += 1,
                Err(e) => {
                    tracing::error!(
                        external_event_id = %candidate.external_event_id,
                        error = %e,
                        transient = e.is_transient(),
                        "Upsert failed"
                    );
                    report.errors += 1;
                }
            }
        }

        report
    }

    /// Resolve the organizer email to a local user id, when one exists.
    /// Lookup failure stores the meeting without a local organizer.
    async fn resolve_organizer(&self, candidate: &MeetingCandidate) -> Option<i64> {
        let email = candidate.organizer_email.as_deref()?;
        match self.store.find_user_by_email(email).await {
            Ok(user) => user.map(|u| u.id),
            Err(e) => {
                tracing::warn!(
                    organizer = %email,
                    error = %e,
                    "Organizer lookup failed, storing without local organizer"
                );
                None
            }
        }
    }
}
