//! Command-line surface for `mae-monitor`.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::config::{Config, DEFAULT_CONFIG_PATH, SourceKind};
use crate::model::{DEFAULT_PAST_HOURS, MAX_PAST_HOURS, MIN_PAST_HOURS};

#[derive(Parser, Debug)]
#[command(name = "mae-monitor")]
#[command(version, about = "Mean Absolute Error (MAE) of demand predictions by pickup hour", long_about = None)]
pub struct Cli {
    /// Number of past hours to plot
    #[arg(long, default_value_t = DEFAULT_PAST_HOURS,
          value_parser = clap::value_parser!(u32).range(MIN_PAST_HOURS as i64..=MAX_PAST_HOURS as i64))]
    pub past_hours: u32,

    /// Path to the TOML configuration file
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Data source, overriding `[source] kind`
    #[arg(long, value_enum)]
    pub source: Option<SourceArg>,

    /// Chart output path (.png or .svg), overriding `[report] chart_path`
    #[arg(long)]
    pub chart: Option<PathBuf>,

    /// Print the report as JSON instead of a table
    #[arg(long)]
    pub json: bool,

    /// Prompt for the window repeatedly, one report per entry
    #[arg(long)]
    pub interactive: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum SourceArg {
    Postgres,
    FeatureStore,
}

impl From<SourceArg> for SourceKind {
    fn from(arg: SourceArg) -> Self {
        match arg {
            SourceArg::Postgres => SourceKind::Postgres,
            SourceArg::FeatureStore => SourceKind::FeatureStore,
        }
    }
}

impl Cli {
    /// Fold command-line overrides into the loaded configuration.
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(source) = self.source {
            config.source.kind = source.into();
        }
        if let Some(chart) = &self.chart {
            config.report.chart_path = chart.display().to_string();
        }
    }
}

/// What the user typed at the interactive prompt.
#[derive(Debug, PartialEq, Eq)]
pub enum HoursEntry {
    Run(u32),
    Quit,
}

/// Parse one line of interactive input. Blank input or `q` quits.
pub fn parse_hours_entry(line: &str) -> Result<HoursEntry, String> {
    let line = line.trim();
    if line.is_empty() || line.eq_ignore_ascii_case("q") || line.eq_ignore_ascii_case("quit") {
        return Ok(HoursEntry::Quit);
    }
    let hours: u32 = line
        .parse()
        .map_err(|_| format!("'{}' is not a whole number of hours", line))?;
    if !(MIN_PAST_HOURS..=MAX_PAST_HOURS).contains(&hours) {
        return Err(format!(
            "past hours must be between {} and {}, got {}",
            MIN_PAST_HOURS, MAX_PAST_HOURS, hours
        ));
    }
    Ok(HoursEntry::Run(hours))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["mae-monitor"]).unwrap();
        assert_eq!(cli.past_hours, 12);
        assert_eq!(cli.config, PathBuf::from(DEFAULT_CONFIG_PATH));
        assert!(cli.source.is_none());
        assert!(!cli.json);
        assert!(!cli.interactive);
    }

    #[test]
    fn test_past_hours_bounds_enforced() {
        assert!(Cli::try_parse_from(["mae-monitor", "--past-hours", "11"]).is_err());
        assert!(Cli::try_parse_from(["mae-monitor", "--past-hours", "673"]).is_err());
        let cli = Cli::try_parse_from(["mae-monitor", "--past-hours", "672"]).unwrap();
        assert_eq!(cli.past_hours, 672);
    }

    #[test]
    fn test_overrides_replace_config_values() {
        let cli = Cli::try_parse_from([
            "mae-monitor",
            "--source",
            "feature-store",
            "--chart",
            "out/mae.svg",
        ])
        .unwrap();
        let mut config = Config::default();
        cli.apply_overrides(&mut config);
        assert_eq!(config.source.kind, SourceKind::FeatureStore);
        assert_eq!(config.report.chart_path, "out/mae.svg");
    }

    #[test]
    fn test_interactive_entries() {
        assert_eq!(parse_hours_entry("24\n"), Ok(HoursEntry::Run(24)));
        assert_eq!(parse_hours_entry("  "), Ok(HoursEntry::Quit));
        assert_eq!(parse_hours_entry("Q"), Ok(HoursEntry::Quit));
        assert!(parse_hours_entry("5").is_err());
        assert!(parse_hours_entry("1000").is_err());
        assert!(parse_hours_entry("twelve").is_err());
    }
}
