// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Periodic sync driver.
//!
//! Runs the pipeline once at startup and then on a fixed interval. A single
//! idle/running flag is the source of truth for sync state; a tick that fires
//! while a run is still in flight is skipped, never queued.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::Config;
use crate::services::reconcile::SyncReport;
use crate::services::sync::SyncEngine;
use crate::time_utils::utc_day_window;

/// Outcome of the most recent completed sync run.
#[derive(Debug, Clone, Serialize)]
pub struct LastRun {
    pub run_id: u64,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Counters when the run completed
    pub report: Option<SyncReport>,
    /// Error text when the run failed before producing a report
    pub error: Option<String>,
}

pub struct SyncScheduler {
    engine: Arc<SyncEngine>,
    interval: Duration,
    running: AtomicBool,
    run_counter: AtomicU64,
    last_run: Mutex<Option<LastRun>>,
}

impl SyncScheduler {
    pub fn new(engine: Arc<SyncEngine>, config: &Config) -> Self {
        Self {
            engine,
            interval: Duration::from_secs(config.sync_interval_secs),
            running: AtomicBool::new(false),
            run_counter: AtomicU64::new(0),
            last_run: Mutex::new(None),
        }
    }

    /// Whether a sync run is currently in flight.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Outcome of the most recent completed run, if any run has finished.
    pub fn last_run(&self) -> Option<LastRun> {
        self.last_run.lock().ok().and_then(|guard| guard.clone())
    }

    /// Run one sync pass over the current UTC day unless a run is already in
    /// flight. Returns `false` when this call was skipped.
    pub async fn tick(&self) -> bool {
        // Idle -> running transition; losing the race means a run is active.
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::info!("Sync already in progress, skipping this tick");
            return false;
        }

        let run_id = self.run_counter.fetch_add(1, Ordering::SeqCst) + 1;
        let started_at = Utc::now();
        let (window_start, window_end) = utc_day_window(started_at);

        tracing::info!(
            run_id,
            window_start = %window_start,
            window_end = %window_end,
            "Starting sync run"
        );

        let result = self.engine.run_once(window_start, window_end).await;
        let finished_at = Utc::now();

        let entry = match result {
            Ok(report) => {
                tracing::info!(
                    run_id,
                    inserted = report.inserted,
                    updated = report.updated,
                    rejected = report.rejected,
                    errors = report.errors,
                    "Sync run finished"
                );
                LastRun {
                    run_id,
                    started_at,
                    finished_at,
                    report: Some(report),
                    error: None,
                }
            }
            Err(e) => {
                tracing::error!(run_id, error = %e, "Sync run failed");
                LastRun {
                    run_id,
                    started_at,
                    finished_at,
                    report: None,
                    error: Some(e.to_string()),
                }
            }
        };

        if let Ok(mut guard) = self.last_run.lock() {
            *guard = Some(entry);
        }

        self.running.store(false, Ordering::SeqCst);
        true
    }

    /// Spawn the periodic loop. The first tick fires immediately, then every
    /// `sync_interval_secs`.
    pub fn spawn(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            // A run longer than the interval should not trigger a catch-up burst
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                self.tick().await;
            }
        })
    }
}
