/// Core data types for the MAE monitoring service.
///
/// This module defines the shared domain model imported by all other modules:
/// the fetched tables, the merged table, the per-hour aggregate and the
/// error kinds a report run can end with. It contains no I/O.

use chrono::{DateTime, Utc};
use serde::Serialize;

// ---------------------------------------------------------------------------
// Window bounds
// ---------------------------------------------------------------------------

/// Smallest trailing window the hour control accepts.
pub const MIN_PAST_HOURS: u32 = 12;

/// Largest trailing window the hour control accepts (four weeks).
pub const MAX_PAST_HOURS: u32 = 24 * 28;

/// Window used when the user has not picked one.
pub const DEFAULT_PAST_HOURS: u32 = 12;

// ---------------------------------------------------------------------------
// Column names
// ---------------------------------------------------------------------------

pub const COL_LOCATION_ID: &str = "pickup_location_id";
pub const COL_PICKUP_HOUR: &str = "pickup_hour";
pub const COL_RIDES: &str = "rides";
pub const COL_PREDICTED_DEMAND: &str = "predicted_demand";

// ---------------------------------------------------------------------------
// Record types
// ---------------------------------------------------------------------------

/// Observed ride count for one pickup location during one hour.
#[derive(Debug, Clone, PartialEq)]
pub struct HourlyRide {
    pub pickup_location_id: i32,
    pub pickup_hour: DateTime<Utc>,
    pub rides: i64,
}

/// Model output for one pickup location during one hour.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub pickup_location_id: i32,
    pub pickup_hour: DateTime<Utc>,
    pub predicted_demand: f64,
}

/// One row of the inner join of `HourlyRide` and `Prediction`.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedRecord {
    pub pickup_location_id: i32,
    pub pickup_hour: DateTime<Utc>,
    pub rides: i64,
    pub predicted_demand: f64,
    pub absolute_error: f64,
}

/// Mean absolute error over every merged row sharing a pickup hour.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourlyMae {
    pub pickup_hour: DateTime<Utc>,
    #[serde(rename = "MAE")]
    pub mae: f64,
}

/// Result of one report run, ready for the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MaeReport {
    pub past_hours: u32,
    /// Ascending by `pickup_hour`.
    pub by_hour: Vec<HourlyMae>,
    /// Unweighted mean of `by_hour[..].mae`.
    pub average_mae: f64,
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Which of the two fetched tables an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dataset {
    HourlyRides,
    Predictions,
}

impl std::fmt::Display for Dataset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Dataset::HourlyRides => write!(f, "hourly rides"),
            Dataset::Predictions => write!(f, "predictions"),
        }
    }
}

/// Errors raised by a `DemandSource` while fetching one table.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchFailure {
    /// The backend could not be reached, answered with an error, or sent
    /// rows that could not be decoded.
    Backend(String),
    /// Rows came back without one or more required columns.
    MissingColumns(Vec<String>),
}

impl std::fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchFailure::Backend(msg) => write!(f, "{}", msg),
            FetchFailure::MissingColumns(cols) => {
                write!(f, "missing columns: {}", cols.join(", "))
            }
        }
    }
}

impl std::error::Error for FetchFailure {}

/// The ways a report run can end without a chart.
#[derive(Debug, Clone, PartialEq)]
pub enum ReportError {
    /// An accessor failed or returned malformed data.
    Fetch { dataset: Dataset, message: String },
    /// Nothing to plot. Non-fatal: the caller should tell the user and stop.
    EmptyData(String),
    /// The join or value columns were absent from a fetched table.
    Schema { dataset: Dataset, missing: Vec<String> },
}

impl ReportError {
    /// `true` for the non-fatal empty-data kind.
    pub fn is_warning(&self) -> bool {
        matches!(self, ReportError::EmptyData(_))
    }

    pub(crate) fn from_fetch(dataset: Dataset, failure: FetchFailure) -> Self {
        match failure {
            FetchFailure::Backend(message) => ReportError::Fetch { dataset, message },
            FetchFailure::MissingColumns(missing) => ReportError::Schema { dataset, missing },
        }
    }
}

impl std::fmt::Display for ReportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportError::Fetch { dataset, message } => {
                write!(f, "Error fetching {} data: {}", dataset, message)
            }
            ReportError::EmptyData(msg) => write!(f, "{}", msg),
            ReportError::Schema { dataset, missing } => write!(
                f,
                "Data merging failed: {} data lacks column(s) {}. Both tables need '{}' and '{}'.",
                dataset,
                missing.join(", "),
                COL_LOCATION_ID,
                COL_PICKUP_HOUR
            ),
        }
    }
}

impl std::error::Error for ReportError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_bounds_cover_four_weeks() {
        assert_eq!(MIN_PAST_HOURS, 12);
        assert_eq!(MAX_PAST_HOURS, 672);
        assert!((MIN_PAST_HOURS..=MAX_PAST_HOURS).contains(&DEFAULT_PAST_HOURS));
    }

    #[test]
    fn test_only_empty_data_is_a_warning() {
        assert!(ReportError::EmptyData("nothing".into()).is_warning());
        assert!(!ReportError::Fetch {
            dataset: Dataset::Predictions,
            message: "HTTP error: 500".into(),
        }
        .is_warning());
        assert!(!ReportError::Schema {
            dataset: Dataset::HourlyRides,
            missing: vec![COL_PICKUP_HOUR.into()],
        }
        .is_warning());
    }

    #[test]
    fn test_fetch_failure_maps_to_report_error_kind() {
        let err = ReportError::from_fetch(
            Dataset::HourlyRides,
            FetchFailure::MissingColumns(vec![COL_LOCATION_ID.into()]),
        );
        assert_eq!(
            err,
            ReportError::Schema {
                dataset: Dataset::HourlyRides,
                missing: vec![COL_LOCATION_ID.into()],
            }
        );

        let err = ReportError::from_fetch(
            Dataset::Predictions,
            FetchFailure::Backend("connection refused".into()),
        );
        assert_eq!(
            err.to_string(),
            "Error fetching predictions data: connection refused"
        );
    }

    #[test]
    fn test_schema_error_message_names_join_columns() {
        let err = ReportError::Schema {
            dataset: Dataset::Predictions,
            missing: vec!["pickup_hour".into()],
        };
        let msg = err.to_string();
        assert!(msg.starts_with("Data merging failed"));
        assert!(msg.contains("pickup_location_id"));
        assert!(msg.contains("pickup_hour"));
    }
}
