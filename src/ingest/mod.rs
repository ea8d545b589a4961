//! Data access for observed rides and model predictions.
//!
//! Each backend implements `DemandSource`. Both tables are fetched for the
//! same trailing window, which starts `past_hours` before the current hour.
//!
//! # Clock injection
//! Backends take their notion of "now" from a `Clock` so the window
//! arithmetic stays deterministic in tests.

pub mod feature_store;
pub mod db;

use chrono::{DateTime, Duration, DurationRound, Utc};

use crate::model::{FetchFailure, HourlyRide, Prediction};

/// Source of the two tables a report run joins.
pub trait DemandSource {
    /// Observed rides with `pickup_hour` inside the trailing window.
    fn fetch_hourly_rides(&mut self, past_hours: u32) -> Result<Vec<HourlyRide>, FetchFailure>;

    /// Model predictions with `pickup_hour` inside the trailing window.
    fn fetch_predictions(&mut self, past_hours: u32) -> Result<Vec<Prediction>, FetchFailure>;
}

pub type Clock = fn() -> DateTime<Utc>;

/// Truncates a timestamp to the start of its hour.
pub fn floor_to_hour(t: DateTime<Utc>) -> DateTime<Utc> {
    t.duration_trunc(Duration::hours(1)).unwrap_or(t)
}

/// First pickup hour inside a `past_hours` window ending at `now`.
pub fn window_start(now: DateTime<Utc>, past_hours: u32) -> DateTime<Utc> {
    floor_to_hour(now) - Duration::hours(i64::from(past_hours))
}

/// NaN and infinite values are decode failures for every backend.
pub fn check_finite(value: f64, column: &str, row: usize) -> Result<f64, FetchFailure> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(FetchFailure::Backend(format!(
            "row {}: bad value in {}: {}",
            row, column, value
        )))
    }
}
