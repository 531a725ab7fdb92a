// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod attendance;
pub mod directory;
pub mod graph;
pub mod meetings;
pub mod reconcile;
pub mod rooms;
pub mod scheduler;
pub mod sync;

pub use attendance::{AttendanceService, AttendanceUpdate};
pub use directory::DirectoryFilter;
pub use graph::{CalendarDirectory, EventResponse, GraphClient};
pub use meetings::{CreateMeetingRequest, MeetingService, MeetingSummary};
pub use reconcile::{Reconciler, SyncReport};
pub use rooms::{RoomAvailability, RoomService};
pub use scheduler::{LastRun, SyncScheduler};
pub use sync::SyncEngine;
