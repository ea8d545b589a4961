//! One report run: fetch, join, score, aggregate.
//!
//! Every call recomputes from scratch. Any failure ends the run; the
//! caller decides how to show it and whether to try again.

use crate::analysis::aggregate::{average_mae, mae_by_hour};
use crate::analysis::join::inner_join;
use crate::ingest::DemandSource;
use crate::logging::{self, Component};
use crate::model::{Dataset, FetchFailure, MaeReport, ReportError};

/// Builds the per-hour MAE table and its overall mean for the trailing
/// `past_hours` window.
///
/// The window bounds are the hour control's job and are not re-checked here.
pub fn run_report(
    source: &mut dyn DemandSource,
    past_hours: u32,
) -> Result<MaeReport, ReportError> {
    logging::debug(
        Component::Pipeline,
        None,
        &format!("Starting run for the past {} hours", past_hours),
    );

    let rides = settle(Dataset::HourlyRides, "hourly_rides", source.fetch_hourly_rides(past_hours))?;
    let predictions = settle(Dataset::Predictions, "predictions", source.fetch_predictions(past_hours))?;

    // An empty table outranks a schema failure on the other one
    let rides_empty = matches!(&rides, Ok(rows) if rows.is_empty());
    let predictions_empty = matches!(&predictions, Ok(rows) if rows.is_empty());
    if rides_empty || predictions_empty {
        logging::log_run_summary(
            rides.as_ref().map_or(0, Vec::len),
            predictions.as_ref().map_or(0, Vec::len),
            0,
            0,
        );
        return Err(ReportError::EmptyData(
            "No data fetched for the selected period. Please try a different range.".to_string(),
        ));
    }

    let rides = rides.map_err(|e| ReportError::from_fetch(Dataset::HourlyRides, e))?;
    let predictions = predictions.map_err(|e| ReportError::from_fetch(Dataset::Predictions, e))?;

    logging::debug(
        Component::Pipeline,
        Some("hourly_rides"),
        &format!("fetched {} rows, first: {:?}", rides.len(), rides.first()),
    );
    logging::debug(
        Component::Pipeline,
        Some("predictions"),
        &format!("fetched {} rows, first: {:?}", predictions.len(), predictions.first()),
    );

    let merged = inner_join(&rides, &predictions);
    let by_hour = mae_by_hour(&merged);
    logging::log_run_summary(rides.len(), predictions.len(), merged.len(), by_hour.len());

    let Some(average) = average_mae(&by_hour) else {
        return Err(ReportError::EmptyData(
            "No MAE data to display. Please try again with different settings.".to_string(),
        ));
    };

    Ok(MaeReport {
        past_hours,
        by_hour,
        average_mae: average,
    })
}

/// Logs a failed fetch. Backend failures end the run here; missing columns
/// are handed back so the caller can check the other table first.
fn settle<T>(
    dataset: Dataset,
    name: &str,
    fetched: Result<Vec<T>, FetchFailure>,
) -> Result<Result<Vec<T>, FetchFailure>, ReportError> {
    match fetched {
        Ok(rows) => Ok(Ok(rows)),
        Err(failure) => {
            logging::log_fetch_failure(Component::Pipeline, name, &failure);
            match failure {
                FetchFailure::MissingColumns(_) => Ok(Err(failure)),
                FetchFailure::Backend(_) => Err(ReportError::from_fetch(dataset, failure)),
            }
        }
    }
}
