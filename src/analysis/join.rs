//! Inner join of observed rides against model predictions.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::model::{HourlyRide, MergedRecord, Prediction};

type JoinKey = (i32, DateTime<Utc>);

/// Joins rides and predictions on `(pickup_location_id, pickup_hour)`.
///
/// Rows without a partner on the other side are dropped. A key present
/// several times on both sides yields every pairing, and the output keeps
/// the order of `rides`, then of `predictions` within a key.
pub fn inner_join(rides: &[HourlyRide], predictions: &[Prediction]) -> Vec<MergedRecord> {
    let mut index: HashMap<JoinKey, Vec<&Prediction>> = HashMap::new();
    for p in predictions {
        index
            .entry((p.pickup_location_id, p.pickup_hour))
            .or_default()
            .push(p);
    }

    let mut merged = Vec::new();
    for r in rides {
        let Some(matches) = index.get(&(r.pickup_location_id, r.pickup_hour)) else {
            continue;
        };
        for p in matches {
            merged.push(MergedRecord {
                pickup_location_id: r.pickup_location_id,
                pickup_hour: r.pickup_hour,
                rides: r.rides,
                predicted_demand: p.predicted_demand,
                absolute_error: absolute_error(p.predicted_demand, r.rides),
            });
        }
    }
    merged
}

/// `|predicted - actual|`
pub fn absolute_error(predicted: f64, actual: i64) -> f64 {
    (predicted - actual as f64).abs()
}
