// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Meeting-Tracker: mirror organization calendars into a local meeting store
//!
//! This crate syncs Microsoft Graph calendars for every account on the
//! company domain, reconciles the events into local meeting records, tracks
//! attendance, and pushes attendance decisions back to the source calendar.

pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod store;
pub mod time_utils;

use std::sync::Arc;

use config::Config;
use services::{AttendanceService, MeetingService, RoomService, SyncScheduler};
use store::MeetingStore;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn MeetingStore>,
    pub meeting_service: MeetingService,
    pub room_service: RoomService,
    pub attendance_service: AttendanceService,
    pub scheduler: Arc<SyncScheduler>,
}
