/// Feature store REST client
///
/// Reads the hourly rides and model predictions feature views over HTTP.
///
/// Request:  GET {base_url}/{view}?start=<RFC 3339 window start>
///           Authorization: Bearer <FEATURE_STORE_API_KEY>
/// Response: {"data": [{"pickup_location_id": 43, "pickup_hour": ..., "rides": 12}, ...]}
///
/// `pickup_hour` may be an RFC 3339 string or epoch milliseconds; the store
/// exports both depending on the view's storage format.

use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::time::Duration;

use crate::config::{FeatureStoreConfig, require_env};
use crate::ingest::{Clock, DemandSource, check_finite, window_start};
use crate::logging::{self, Component};
use crate::model::{
    COL_LOCATION_ID, COL_PICKUP_HOUR, COL_PREDICTED_DEMAND, COL_RIDES, FetchFailure,
    HourlyRide, Prediction,
};

// ============================================================================
// Response Structures
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct FeatureViewResponse {
    pub data: Vec<Map<String, Value>>,
}

// ============================================================================
// Client
// ============================================================================

pub struct FeatureStoreSource {
    client: reqwest::blocking::Client,
    config: FeatureStoreConfig,
    api_key: String,
    clock: Clock,
}

impl FeatureStoreSource {
    /// Build a client from config, reading `FEATURE_STORE_API_KEY`.
    pub fn connect(config: &FeatureStoreConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let api_key = require_env("FEATURE_STORE_API_KEY")?;
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            config: config.clone(),
            api_key,
            clock: Utc::now,
        })
    }

    /// Replace the clock used to compute the window start.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    fn fetch_view(&self, view: &str, past_hours: u32) -> Result<Vec<Map<String, Value>>, FetchFailure> {
        let start = window_start((self.clock)(), past_hours);
        let url = build_view_url(&self.config.base_url, view, start);
        logging::debug(Component::FeatureStore, Some(view), &format!("GET {}", url));

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.api_key)
            .header("Accept", "application/json")
            .send()
            .map_err(|e| FetchFailure::Backend(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(FetchFailure::Backend(format!(
                "HTTP error: {}",
                response.status().as_u16()
            )));
        }

        let body = response
            .text()
            .map_err(|e| FetchFailure::Backend(format!("failed to read body: {}", e)))?;
        parse_view_response(&body)
    }
}

impl DemandSource for FeatureStoreSource {
    fn fetch_hourly_rides(&mut self, past_hours: u32) -> Result<Vec<HourlyRide>, FetchFailure> {
        let rows = self.fetch_view(&self.config.rides_view, past_hours)?;
        rides_from_rows(&rows)
    }

    fn fetch_predictions(&mut self, past_hours: u32) -> Result<Vec<Prediction>, FetchFailure> {
        let rows = self.fetch_view(&self.config.predictions_view, past_hours)?;
        predictions_from_rows(&rows)
    }
}

// ============================================================================
// URL and Response Parsing
// ============================================================================

pub fn build_view_url(base_url: &str, view: &str, start: DateTime<Utc>) -> String {
    format!(
        "{}/{}?start={}",
        base_url.trim_end_matches('/'),
        view,
        start.format("%Y-%m-%dT%H:%M:%SZ")
    )
}

pub fn parse_view_response(body: &str) -> Result<Vec<Map<String, Value>>, FetchFailure> {
    let parsed: FeatureViewResponse = serde_json::from_str(body)
        .map_err(|e| FetchFailure::Backend(format!("Parse error: {}", e)))?;
    Ok(parsed.data)
}

/// Decode rides rows; see `require_columns` for schema handling.
pub fn rides_from_rows(rows: &[Map<String, Value>]) -> Result<Vec<HourlyRide>, FetchFailure> {
    require_columns(rows, &[COL_LOCATION_ID, COL_PICKUP_HOUR, COL_RIDES])?;
    rows.iter()
        .enumerate()
        .map(|(i, row)| -> Result<HourlyRide, FetchFailure> {
            Ok(HourlyRide {
                pickup_location_id: location_id(row, i)?,
                pickup_hour: pickup_hour(row, i)?,
                rides: integer(row, COL_RIDES, i)?,
            })
        })
        .collect()
}

pub fn predictions_from_rows(rows: &[Map<String, Value>]) -> Result<Vec<Prediction>, FetchFailure> {
    require_columns(rows, &[COL_LOCATION_ID, COL_PICKUP_HOUR, COL_PREDICTED_DEMAND])?;
    rows.iter()
        .enumerate()
        .map(|(i, row)| -> Result<Prediction, FetchFailure> {
            Ok(Prediction {
                pickup_location_id: location_id(row, i)?,
                pickup_hour: pickup_hour(row, i)?,
                predicted_demand: float(row, COL_PREDICTED_DEMAND, i)?,
            })
        })
        .collect()
}

/// Every row must carry every column. Returns the columns missing from any
/// row, in the order given. An empty table passes.
fn require_columns(rows: &[Map<String, Value>], columns: &[&str]) -> Result<(), FetchFailure> {
    let missing: Vec<String> = columns
        .iter()
        .filter(|col| rows.iter().any(|row| !row.contains_key(**col)))
        .map(|col| col.to_string())
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(FetchFailure::MissingColumns(missing))
    }
}

fn bad_value(row: usize, column: &str, value: &Value) -> FetchFailure {
    FetchFailure::Backend(format!("row {}: unusable {} value {}", row, column, value))
}

fn location_id(row: &Map<String, Value>, i: usize) -> Result<i32, FetchFailure> {
    let id = integer(row, COL_LOCATION_ID, i)?;
    i32::try_from(id).map_err(|_| bad_value(i, COL_LOCATION_ID, &row[COL_LOCATION_ID]))
}

fn integer(row: &Map<String, Value>, column: &str, i: usize) -> Result<i64, FetchFailure> {
    let value = &row[column];
    let parsed = match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        _ => None,
    };
    parsed.ok_or_else(|| bad_value(i, column, value))
}

fn float(row: &Map<String, Value>, column: &str, i: usize) -> Result<f64, FetchFailure> {
    let value = &row[column];
    let f = value.as_f64().ok_or_else(|| bad_value(i, column, value))?;
    check_finite(f, column, i)
}

fn pickup_hour(row: &Map<String, Value>, i: usize) -> Result<DateTime<Utc>, FetchFailure> {
    let value = &row[COL_PICKUP_HOUR];
    let parsed = match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        Value::Number(n) => n.as_i64().and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
        _ => None,
    };
    parsed.ok_or_else(|| bad_value(i, COL_PICKUP_HOUR, value))
}

// ============================================================================
// Tests
// ============================================================================
