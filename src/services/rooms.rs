// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Room availability queries over the mirrored meeting records.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;

use crate::error::AppError;
use crate::models::Meeting;
use crate::store::MeetingStore;
use crate::time_utils::day_start;

/// Cumulative booked hours at which a day counts as fully booked.
const FULLY_BOOKED_HOURS: f64 = 8.0;

/// Availability report for one room over a date range.
#[derive(Debug, Clone, Serialize)]
pub struct RoomAvailability {
    /// Every booking overlapping the range, sorted by start time.
    pub bookings: Vec<Meeting>,
    /// Days within the range with at least eight booked hours.
    pub fully_booked: Vec<NaiveDate>,
}

/// Overlap and saturation queries for rooms.
///
/// Rooms are free-text location strings compared exactly; two spellings of
/// the same physical room are different rooms here.
pub struct RoomService {
    store: Arc<dyn MeetingStore>,
}

impl RoomService {
    pub fn new(store: Arc<dyn MeetingStore>) -> Self {
        Self { store }
    }

    /// Bookings and fully-booked days for `location` over the inclusive day
    /// range `[from_day, to_day]` (UTC days).
    ///
    /// Hours are attributed to the UTC day a booking starts on; a booking
    /// spanning midnight contributes all its hours to its start day.
    pub async fn check_availability(
        &self,
        location: &str,
        from_day: NaiveDate,
        to_day: NaiveDate,
    ) -> Result<RoomAvailability, AppError> {
        let range_start = day_start(from_day);
        let range_end = day_start(to_day) + Duration::days(1);

        let bookings = self
            .store
            .meetings_overlapping(location, range_start, range_end)
            .await?;

        let mut hours_per_day: HashMap<NaiveDate, f64> = HashMap::new();
        for booking in &bookings {
            let day = booking.start_time.date_naive();
            let hours = (booking.end_time - booking.start_time).num_seconds() as f64 / 3600.0;
            *hours_per_day.entry(day).or_insert(0.0) += hours;
        }

        let fully_booked: Vec<NaiveDate> = from_day
            .iter_days()
            .take_while(|day| *day <= to_day)
            .filter(|day| hours_per_day.get(day).copied().unwrap_or(0.0) >= FULLY_BOOKED_HOURS)
            .collect();

        tracing::debug!(
            location,
            bookings = bookings.len(),
            fully_booked = fully_booked.len(),
            "Computed room availability"
        );
        Ok(RoomAvailability {
            bookings,
            fully_booked,
        })
    }

    /// Whether any existing booking at `location` overlaps `[start, end)`.
    /// Used to reject meeting creation into an occupied slot.
    pub async fn check_create_conflict(
        &self,
        location: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        let overlapping = self.store.meetings_overlapping(location, start, end).await?;
        Ok(!overlapping.is_empty())
    }
}
