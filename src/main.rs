// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Meeting-Tracker sync daemon
//!
//! Mirrors organization calendars from Microsoft Graph into the local
//! meeting store on a fixed schedule and keeps attendance decisions in
//! both places.

use meeting_tracker::{
    config::Config,
    services::{
        AttendanceService, GraphClient, MeetingService, RoomService, SyncEngine, SyncScheduler,
    },
    store::MemoryStore,
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(
        domain = %config.company_domain,
        interval_secs = config.sync_interval_secs,
        "Starting Meeting-Tracker sync daemon"
    );

    // One long-lived Graph client, shared by scheduler runs and attendance
    // pushes
    let graph = Arc::new(GraphClient::from_config(&config));
    tracing::info!("Graph client initialized");

    let store = Arc::new(MemoryStore::new());

    let engine = Arc::new(SyncEngine::new(
        graph.clone(),
        store.clone(),
        config.clone(),
    ));
    let scheduler = Arc::new(SyncScheduler::new(engine, &config));

    // Build shared state
    let state = Arc::new(AppState {
        meeting_service: MeetingService::new(store.clone(), &config),
        room_service: RoomService::new(store.clone()),
        attendance_service: AttendanceService::new(store.clone(), graph, &config),
        scheduler: scheduler.clone(),
        store,
        config,
    });

    // First sync fires immediately, then on the configured interval
    let sync_task = state.scheduler.clone().spawn();
    tracing::info!("Sync scheduler started");

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down");
    sync_task.abort();

    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("meeting_tracker=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
