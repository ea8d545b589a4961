//! Line chart of MAE against pickup hour.
//!
//! The backend is chosen from the output file's extension: `.png` renders a
//! bitmap, `.svg` a vector image.

use chrono::{DateTime, Duration, Utc};
use plotters::coord::Shift;
use plotters::coord::types::RangedDateTime;
use plotters::prelude::*;
use std::error::Error;
use std::ops::Range;
use std::path::Path;

use crate::model::MaeReport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartFormat {
    Png,
    Svg,
}

impl ChartFormat {
    pub fn from_path(path: &Path) -> Result<Self, String> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("png") => Ok(ChartFormat::Png),
            Some("svg") => Ok(ChartFormat::Svg),
            _ => Err(format!(
                "unsupported chart file '{}': use a .png or .svg path",
                path.display()
            )),
        }
    }
}

pub fn chart_title(past_hours: u32) -> String {
    format!("Mean Absolute Error (MAE) for the Past {} Hours", past_hours)
}

/// Writes the chart for `report` to `path`.
pub fn render_chart(report: &MaeReport, path: &Path, size: (u32, u32)) -> Result<(), Box<dyn Error>> {
    let format = ChartFormat::from_path(path)?;
    if report.by_hour.is_empty() {
        return Err("nothing to plot".into());
    }
    match format {
        ChartFormat::Png => draw(BitMapBackend::new(path, size).into_drawing_area(), report),
        ChartFormat::Svg => draw(SVGBackend::new(path, size).into_drawing_area(), report),
    }
}

fn draw<DB>(root: DrawingArea<DB, Shift>, report: &MaeReport) -> Result<(), Box<dyn Error>>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    root.fill(&WHITE)?;

    let points: Vec<(DateTime<Utc>, f64)> = report
        .by_hour
        .iter()
        .map(|h| (h.pickup_hour, h.mae))
        .collect();
    let x_range = hour_range(&points).ok_or("nothing to plot")?;
    let y_range = mae_range(&points);

    let mut chart = ChartBuilder::on(&root)
        .margin(20)
        .caption(chart_title(report.past_hours), ("sans-serif", 24))
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d(RangedDateTime::from(x_range), y_range)?;

    chart
        .configure_mesh()
        .x_desc("Pickup Hour")
        .y_desc("Mean Absolute Error")
        .x_label_formatter(&|dt: &DateTime<Utc>| dt.format("%m-%d %H:00").to_string())
        .draw()?;

    chart.draw_series(LineSeries::new(points.iter().copied(), &BLUE))?;
    chart.draw_series(
        points
            .iter()
            .map(|&(hour, mae)| Circle::new((hour, mae), 3, BLUE.filled())),
    )?;

    root.present()?;
    Ok(())
}

/// Time span of the points, padded by an hour on each side.
fn hour_range(points: &[(DateTime<Utc>, f64)]) -> Option<Range<DateTime<Utc>>> {
    let first = points.iter().map(|p| p.0).min()?;
    let last = points.iter().map(|p| p.0).max()?;
    Some((first - Duration::hours(1))..(last + Duration::hours(1)))
}

/// `0..max*1.1`, never narrower than `0..1` so an all-zero series still draws.
fn mae_range(points: &[(DateTime<Utc>, f64)]) -> Range<f64> {
    let max = points.iter().map(|p| p.1).fold(0.0_f64, f64::max);
    0.0..(max * 1.1).max(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn hour(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, h, 0, 0).unwrap()
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(ChartFormat::from_path(Path::new("out/mae.png")), Ok(ChartFormat::Png));
        assert_eq!(ChartFormat::from_path(Path::new("mae.SVG")), Ok(ChartFormat::Svg));
        assert!(ChartFormat::from_path(Path::new("mae.jpg")).is_err());
        assert!(ChartFormat::from_path(Path::new("mae")).is_err());
    }

    #[test]
    fn test_title_names_window() {
        assert_eq!(
            chart_title(48),
            "Mean Absolute Error (MAE) for the Past 48 Hours"
        );
    }

    #[test]
    fn test_single_point_range_is_padded() {
        let range = hour_range(&[(hour(5), 1.0)]).unwrap();
        assert_eq!(range, hour(4)..hour(6));
        assert!(hour_range(&[]).is_none());
    }

    #[test]
    fn test_y_range_has_headroom_and_floor() {
        assert_eq!(mae_range(&[(hour(0), 0.0), (hour(1), 0.0)]), 0.0..1.0);
        let r = mae_range(&[(hour(0), 10.0), (hour(1), 4.0)]);
        assert_eq!(r.start, 0.0);
        assert!((r.end - 11.0).abs() < 1e-9);
    }

    #[test]
    fn test_unsupported_path_rejected_before_drawing() {
        let dir = tempfile::tempdir().unwrap();
        let report = MaeReport {
            past_hours: 12,
            by_hour: vec![],
            average_mae: 0.0,
        };
        let path = dir.path().join("mae.gif");
        assert!(render_chart(&report, &path, (640, 480)).is_err());
        assert!(!path.exists());
    }
}
