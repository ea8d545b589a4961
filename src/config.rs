//! Service configuration.
//!
//! Settings live in a TOML file (default `./mae_monitor.toml`). Every field
//! has a default, so an absent file or section is not an error. Credentials
//! never go in the file: `DATABASE_URL` and `FEATURE_STORE_API_KEY` are read
//! from the environment after `.env` has been loaded.

use serde::Deserialize;
use std::error::Error;
use std::path::Path;

use crate::logging::LogLevel;

pub const DEFAULT_CONFIG_PATH: &str = "./mae_monitor.toml";

// ---------------------------------------------------------------------------
// File structure
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub source: SourceConfig,
    pub postgres: PostgresConfig,
    pub feature_store: FeatureStoreConfig,
    pub report: ReportConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    #[default]
    Postgres,
    FeatureStore,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct SourceConfig {
    pub kind: SourceKind,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct PostgresConfig {
    pub rides_table: String,
    pub predictions_table: String,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            rides_table: "hourly_rides".to_string(),
            predictions_table: "predictions".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct FeatureStoreConfig {
    pub base_url: String,
    pub rides_view: String,
    pub predictions_view: String,
    pub timeout_secs: u64,
}

impl Default for FeatureStoreConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/api/feature-views".to_string(),
            rides_view: "time_series_hourly_feature_view".to_string(),
            predictions_view: "model_predictions_feature_view".to_string(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ReportConfig {
    /// `.png` or `.svg`
    pub chart_path: String,
    pub chart_width: u32,
    pub chart_height: u32,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            chart_path: "mae_by_hour.png".to_string(),
            chart_width: 1024,
            chart_height: 600,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
    pub console_timestamps: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
            console_timestamps: false,
        }
    }
}

impl LoggingConfig {
    pub fn min_level(&self) -> Result<LogLevel, String> {
        self.level.parse()
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Parse configuration from TOML text.
pub fn parse_config(contents: &str) -> Result<Config, Box<dyn Error>> {
    let config: Config = toml::from_str(contents)?;
    config.logging.min_level()?;
    Ok(config)
}

/// Load configuration from `path`, falling back to defaults when the file
/// does not exist.
pub fn load_config(path: impl AsRef<Path>) -> Result<Config, Box<dyn Error>> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(Config::default());
    }
    let contents = std::fs::read_to_string(path)
        .map_err(|e| format!("failed to read {}: {}", path.display(), e))?;
    parse_config(&contents).map_err(|e| format!("invalid config {}: {}", path.display(), e).into())
}

/// Read a required secret from the environment.
pub fn require_env(name: &str) -> Result<String, Box<dyn Error>> {
    std::env::var(name).map_err(|_| format!("{} must be set (environment or .env)", name).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_gives_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.source.kind, SourceKind::Postgres);
        assert_eq!(config.report.chart_path, "mae_by_hour.png");
    }

    #[test]
    fn test_partial_sections_keep_other_defaults() {
        let config = parse_config(
            r#"
            [source]
            kind = "feature_store"

            [feature_store]
            base_url = "https://fs.example.com/views"
            timeout_secs = 5

            [logging]
            level = "debug"
            "#,
        )
        .unwrap();

        assert_eq!(config.source.kind, SourceKind::FeatureStore);
        assert_eq!(config.feature_store.base_url, "https://fs.example.com/views");
        assert_eq!(config.feature_store.timeout_secs, 5);
        assert_eq!(
            config.feature_store.predictions_view,
            "model_predictions_feature_view"
        );
        assert_eq!(config.logging.min_level(), Ok(LogLevel::Debug));
        assert_eq!(config.postgres, PostgresConfig::default());
    }

    #[test]
    fn test_unknown_log_level_rejected() {
        let result = parse_config("[logging]\nlevel = \"chatty\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_source_kind_rejected() {
        let result = parse_config("[source]\nkind = \"sqlite\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_config_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mae_monitor.toml");
        std::fs::write(&path, "[postgres]\nrides_table = \"analytics.rides_hourly\"\n").unwrap();
        let config = load_config(&path).unwrap();
        assert_eq!(config.postgres.rides_table, "analytics.rides_hourly");
        assert_eq!(config.postgres.predictions_table, "predictions");
    }
}
