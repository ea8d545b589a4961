//! Per-hour aggregation of merged rows.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::model::{HourlyMae, MergedRecord};

/// Groups merged rows by `pickup_hour` and averages `absolute_error`.
///
/// Output is ascending by hour. An empty input gives an empty table.
pub fn mae_by_hour(merged: &[MergedRecord]) -> Vec<HourlyMae> {
    let mut groups: BTreeMap<DateTime<Utc>, (f64, usize)> = BTreeMap::new();
    for m in merged {
        let (sum, count) = groups.entry(m.pickup_hour).or_insert((0.0, 0));
        *sum += m.absolute_error;
        *count += 1;
    }

    groups
        .into_iter()
        .map(|(pickup_hour, (sum, count))| HourlyMae {
            pickup_hour,
            mae: sum / count as f64,
        })
        .collect()
}

/// Mean of the per-hour MAE column, every hour weighted equally regardless
/// of how many merged rows it came from.
///
/// Returns `None` for an empty table.
pub fn average_mae(by_hour: &[HourlyMae]) -> Option<f64> {
    if by_hour.is_empty() {
        return None;
    }
    let total: f64 = by_hour.iter().map(|h| h.mae).sum();
    Some(total / by_hour.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn hour(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, h, 0, 0).unwrap()
    }

    fn merged(loc: i32, h: u32, absolute_error: f64) -> MergedRecord {
        MergedRecord {
            pickup_location_id: loc,
            pickup_hour: hour(h),
            rides: 0,
            predicted_demand: absolute_error,
            absolute_error,
        }
    }

    #[test]
    fn test_single_row_mae_equals_its_error() {
        let table = mae_by_hour(&[merged(1, 0, 2.0)]);
        assert_eq!(table, vec![HourlyMae { pickup_hour: hour(0), mae: 2.0 }]);
    }

    #[test]
    fn test_one_row_per_distinct_hour_in_ascending_order() {
        let rows = [
            merged(1, 5, 1.0),
            merged(2, 1, 3.0),
            merged(3, 5, 3.0),
            merged(1, 3, 0.0),
        ];
        let table = mae_by_hour(&rows);
        let hours: Vec<_> = table.iter().map(|h| h.pickup_hour).collect();
        assert_eq!(hours, vec![hour(1), hour(3), hour(5)]);
        assert_eq!(table[2].mae, 2.0);
    }

    #[test]
    fn test_empty_merge_gives_empty_table() {
        assert!(mae_by_hour(&[]).is_empty());
        assert_eq!(average_mae(&[]), None);
    }

    #[test]
    fn test_average_is_unweighted_by_row_count() {
        // Hour 0 has three rows with error 1, hour 1 has one row with error 5.
        // Row-weighted mean would be 2.0; the per-hour mean is 3.0.
        let rows = [
            merged(1, 0, 1.0),
            merged(2, 0, 1.0),
            merged(3, 0, 1.0),
            merged(1, 1, 5.0),
        ];
        let table = mae_by_hour(&rows);
        assert_eq!(average_mae(&table), Some(3.0));
    }
}
