//! Text rendering of a report for the terminal.

use crate::model::MaeReport;

pub const PAGE_TITLE: &str = "Mean Absolute Error (MAE) by Pickup Hour";

pub fn average_line(report: &MaeReport) -> String {
    format!("Average MAE: {}", report.average_mae)
}

/// Per-hour table followed by the overall mean.
pub fn format_report(report: &MaeReport) -> String {
    let mut out = String::new();
    out.push_str(&format!("{:<20}  {:>12}\n", "Pickup Hour", "MAE"));
    out.push_str(&format!("{}\n", "-".repeat(34)));
    for row in &report.by_hour {
        out.push_str(&format!(
            "{:<20}  {:>12.3}\n",
            row.pickup_hour.format("%Y-%m-%d %H:%M"),
            row.mae
        ));
    }
    out.push('\n');
    out.push_str(&average_line(report));
    out.push('\n');
    out
}

pub fn format_json(report: &MaeReport) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::HourlyMae;
    use chrono::{TimeZone, Utc};

    fn sample() -> MaeReport {
        MaeReport {
            past_hours: 12,
            by_hour: vec![
                HourlyMae {
                    pickup_hour: Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap(),
                    mae: 2.0,
                },
                HourlyMae {
                    pickup_hour: Utc.with_ymd_and_hms(2024, 3, 1, 1, 0, 0).unwrap(),
                    mae: 1.0,
                },
            ],
            average_mae: 1.5,
        }
    }

    #[test]
    fn test_table_lists_hours_and_average() {
        let text = format_report(&sample());
        assert!(text.contains("2024-03-01 00:00"));
        assert!(text.contains("2.000"));
        assert!(text.contains("2024-03-01 01:00"));
        assert!(text.trim_end().ends_with("Average MAE: 1.5"));
    }

    #[test]
    fn test_json_uses_mae_column_name() {
        let json = format_json(&sample()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["past_hours"], 12);
        assert_eq!(value["average_mae"], 1.5);
        assert_eq!(value["by_hour"][0]["MAE"], 2.0);
        assert_eq!(value["by_hour"][0]["pickup_hour"], "2024-03-01T00:00:00Z");
    }
}
