/// PostgreSQL-backed demand source.
///
/// Reads observed rides and predictions from two tables. The tables must
/// carry `pickup_location_id`, `pickup_hour` and either `rides` or
/// `predicted_demand`; values are cast on the way out so integer widths and
/// `timestamp` vs `timestamptz` columns do not matter.

use postgres::error::SqlState;
use postgres::{Client, NoTls, Row};
use chrono::{DateTime, Utc};

use crate::config::{PostgresConfig, require_env};
use crate::ingest::{Clock, DemandSource, check_finite, window_start};
use crate::logging::{self, Component};
use crate::model::{
    COL_LOCATION_ID, COL_PICKUP_HOUR, COL_PREDICTED_DEMAND, COL_RIDES, FetchFailure,
    HourlyRide, Prediction,
};

pub struct PostgresSource {
    client: Client,
    rides_table: String,
    predictions_table: String,
    clock: Clock,
}

impl PostgresSource {
    /// Connect using `DATABASE_URL` and the configured table names.
    pub fn connect(config: &PostgresConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let rides_table = checked_table_name(&config.rides_table)?;
        let predictions_table = checked_table_name(&config.predictions_table)?;

        let database_url = require_env("DATABASE_URL")?;
        let client = Client::connect(&database_url, NoTls)?;
        logging::info(Component::Database, None, "Connected to database");

        Ok(Self {
            client,
            rides_table,
            predictions_table,
            clock: Utc::now,
        })
    }

    /// Replace the clock used to compute the window start.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    fn query_window(
        &mut self,
        sql: &str,
        dataset: &str,
        value_column: &str,
        past_hours: u32,
    ) -> Result<Vec<Row>, FetchFailure> {
        let start: DateTime<Utc> = window_start((self.clock)(), past_hours);
        logging::debug(
            Component::Database,
            Some(dataset),
            &format!("Querying rows with pickup_hour >= {}", start.to_rfc3339()),
        );

        let statement = self
            .client
            .prepare(sql)
            .map_err(|e| classify_prepare_error(&e, value_column))?;
        self.client
            .query(&statement, &[&start])
            .map_err(|e| FetchFailure::Backend(format!("query failed: {}", e)))
    }
}

impl DemandSource for PostgresSource {
    fn fetch_hourly_rides(&mut self, past_hours: u32) -> Result<Vec<HourlyRide>, FetchFailure> {
        let sql = window_query(&self.rides_table, COL_RIDES, "INT8");
        let rows = self.query_window(&sql, "hourly_rides", COL_RIDES, past_hours)?;
        rows.iter()
            .map(|row| -> Result<HourlyRide, FetchFailure> {
                Ok(HourlyRide {
                    pickup_location_id: get(row, 0, COL_LOCATION_ID)?,
                    pickup_hour: get(row, 1, COL_PICKUP_HOUR)?,
                    rides: get(row, 2, COL_RIDES)?,
                })
            })
            .collect()
    }

    fn fetch_predictions(&mut self, past_hours: u32) -> Result<Vec<Prediction>, FetchFailure> {
        let sql = window_query(&self.predictions_table, COL_PREDICTED_DEMAND, "FLOAT8");
        let rows = self.query_window(&sql, "predictions", COL_PREDICTED_DEMAND, past_hours)?;
        rows.iter()
            .enumerate()
            .map(|(i, row)| -> Result<Prediction, FetchFailure> {
                let demand: f64 = get(row, 2, COL_PREDICTED_DEMAND)?;
                Ok(Prediction {
                    pickup_location_id: get(row, 0, COL_LOCATION_ID)?,
                    pickup_hour: get(row, 1, COL_PICKUP_HOUR)?,
                    predicted_demand: check_finite(demand, COL_PREDICTED_DEMAND, i)?,
                })
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// SQL helpers
// ---------------------------------------------------------------------------

/// Builds the window query for one table. `$1` is the window start.
pub fn window_query(table: &str, value_column: &str, value_type: &str) -> String {
    format!(
        "SELECT {loc}::INT4, {hour}::TIMESTAMPTZ, {val}::{ty}
         FROM {table}
         WHERE {hour}::TIMESTAMPTZ >= $1",
        loc = COL_LOCATION_ID,
        hour = COL_PICKUP_HOUR,
        val = value_column,
        ty = value_type,
        table = table,
    )
}

/// Accepts `name` or `schema.name` made of ASCII letters, digits and `_`,
/// not starting with a digit. Table names are interpolated into SQL.
pub fn checked_table_name(name: &str) -> Result<String, String> {
    let valid_part = |part: &str| {
        !part.is_empty()
            && !part.starts_with(|c: char| c.is_ascii_digit())
            && part.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
    };
    let parts: Vec<&str> = name.split('.').collect();
    if parts.len() <= 2 && parts.iter().all(|p| valid_part(p)) {
        Ok(name.to_string())
    } else {
        Err(format!("invalid table name '{}'", name))
    }
}

fn classify_prepare_error(err: &postgres::Error, value_column: &str) -> FetchFailure {
    if err.code() == Some(&SqlState::UNDEFINED_COLUMN) {
        let detail = err
            .as_db_error()
            .map(|db| db.message().to_string())
            .unwrap_or_default();
        let missing: Vec<String> = [COL_LOCATION_ID, COL_PICKUP_HOUR, value_column]
            .iter()
            .filter(|col| detail.contains(*col))
            .map(|col| col.to_string())
            .collect();
        if missing.is_empty() {
            FetchFailure::MissingColumns(vec![detail])
        } else {
            FetchFailure::MissingColumns(missing)
        }
    } else {
        FetchFailure::Backend(format!("query failed: {}", err))
    }
}

fn get<'a, T>(row: &'a Row, idx: usize, column: &str) -> Result<T, FetchFailure>
where
    T: postgres::types::FromSql<'a>,
{
    row.try_get(idx)
        .map_err(|e| FetchFailure::Backend(format!("bad value in {}: {}", column, e)))
}
