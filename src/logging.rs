/// Structured logging for the MAE monitoring service
///
/// Provides context-rich logging with component and dataset identifiers,
/// timestamps, and severity levels. Supports both console output
/// and file-based logging for unattended runs.

use chrono::Utc;
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::sync::Mutex;

use crate::model::FetchFailure;

// ---------------------------------------------------------------------------
// Log Levels
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warning => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warning),
            "error" => Ok(LogLevel::Error),
            other => Err(format!("unknown log level '{}'", other)),
        }
    }
}

// ---------------------------------------------------------------------------
// Components
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Component {
    Database,
    FeatureStore,
    Pipeline,
    System,
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Component::Database => write!(f, "DB"),
            Component::FeatureStore => write!(f, "FS"),
            Component::Pipeline => write!(f, "PIPE"),
            Component::System => write!(f, "SYS"),
        }
    }
}

// ---------------------------------------------------------------------------
// Failure Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureType {
    /// Unexpected failure - indicates backend outage or configuration issue
    Unexpected,
    /// Unknown - cannot determine if this is expected or not
    Unknown,
}

impl fmt::Display for FailureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureType::Unexpected => write!(f, "UNEXPECTED"),
            FailureType::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

// ---------------------------------------------------------------------------
// Logger Configuration
// ---------------------------------------------------------------------------

/// Global logger instance
static LOGGER: Mutex<Option<Logger>> = Mutex::new(None);

pub struct Logger {
    /// Minimum log level to display
    min_level: LogLevel,
    /// Optional file path for logging
    log_file: Option<String>,
    /// Whether to include timestamps in console output
    console_timestamps: bool,
}

impl Logger {
    /// Initialize the global logger
    pub fn init(min_level: LogLevel, log_file: Option<String>, console_timestamps: bool) {
        let logger = Logger {
            min_level,
            log_file,
            console_timestamps,
        };

        if let Ok(mut slot) = LOGGER.lock() {
            *slot = Some(logger);
        }
    }

    fn log(&self, level: LogLevel, component: &Component, dataset: Option<&str>, message: &str) {
        if level < self.min_level {
            return;
        }

        let timestamp = Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
        let dataset_part = dataset.map(|d| format!(" [{}]", d)).unwrap_or_default();
        let log_entry = format_entry(&timestamp.to_string(), level, component, dataset, message);

        // Console output; stdout is reserved for the report itself
        if self.console_timestamps {
            match level {
                LogLevel::Error | LogLevel::Warning => eprintln!("{}", log_entry),
                LogLevel::Info | LogLevel::Debug => eprintln!("   {}", log_entry),
            }
        } else {
            match level {
                LogLevel::Error => eprintln!("   ✗ {}{}: {}", component, dataset_part, message),
                LogLevel::Warning => eprintln!("   ⚠ {}{}: {}", component, dataset_part, message),
                LogLevel::Info => eprintln!("   {}", message),
                LogLevel::Debug => eprintln!("   [DEBUG] {}", message),
            }
        }

        if let Some(ref path) = self.log_file {
            if let Err(e) = Self::append_to_file(path, &log_entry) {
                eprintln!("Failed to write to log file {}: {}", path, e);
            }
        }
    }

    fn append_to_file(path: &str, entry: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        writeln!(file, "{}", entry)?;
        Ok(())
    }
}

fn format_entry(
    timestamp: &str,
    level: LogLevel,
    component: &Component,
    dataset: Option<&str>,
    message: &str,
) -> String {
    let dataset_part = dataset.map(|d| format!(" [{}]", d)).unwrap_or_default();
    format!("{} {} {}{}: {}", timestamp, level, component, dataset_part, message)
}

// ---------------------------------------------------------------------------
// Public Logging Functions
// ---------------------------------------------------------------------------

/// Initialize the global logger
pub fn init_logger(min_level: LogLevel, log_file: Option<&str>, console_timestamps: bool) {
    Logger::init(min_level, log_file.map(String::from), console_timestamps);
}

fn dispatch(level: LogLevel, component: Component, dataset: Option<&str>, message: &str) {
    if let Ok(guard) = LOGGER.lock() {
        if let Some(logger) = guard.as_ref() {
            logger.log(level, &component, dataset, message);
        }
    }
}

/// Log a general informational message
pub fn info(component: Component, dataset: Option<&str>, message: &str) {
    dispatch(LogLevel::Info, component, dataset, message);
}

/// Log a warning message
pub fn warn(component: Component, dataset: Option<&str>, message: &str) {
    dispatch(LogLevel::Warning, component, dataset, message);
}

/// Log an error message
pub fn error(component: Component, dataset: Option<&str>, message: &str) {
    dispatch(LogLevel::Error, component, dataset, message);
}

/// Log a debug message
pub fn debug(component: Component, dataset: Option<&str>, message: &str) {
    dispatch(LogLevel::Debug, component, dataset, message);
}

// ---------------------------------------------------------------------------
// Failure Classification Helpers
// ---------------------------------------------------------------------------

/// Classify a data source failure based on the error type and message
pub fn classify_fetch_failure(failure: &FetchFailure) -> FailureType {
    match failure {
        // Schema drift is always a configuration problem
        FetchFailure::MissingColumns(_) => FailureType::Unexpected,
        FetchFailure::Backend(msg) => {
            let msg = msg.to_ascii_lowercase();
            if msg.contains("http") || msg.contains("timeout") || msg.contains("connect") {
                FailureType::Unexpected
            } else {
                FailureType::Unknown
            }
        }
    }
}

/// Log a data source failure with automatic classification
pub fn log_fetch_failure(component: Component, dataset: &str, failure: &FetchFailure) {
    let failure_type = classify_fetch_failure(failure);
    let message = format!("fetch failed [{}]: {}", failure_type, failure);

    match failure_type {
        FailureType::Unexpected => error(component, Some(dataset), &message),
        FailureType::Unknown => warn(component, Some(dataset), &message),
    }
}

// ---------------------------------------------------------------------------
// Run Summary Logging
// ---------------------------------------------------------------------------

/// Log row counts for one report run
pub fn log_run_summary(rides: usize, predictions: usize, merged: usize, hours: usize) {
    let message = format!(
        "Run complete: {} ride rows, {} prediction rows, {} merged, {} hours",
        rides, predictions, merged, hours
    );

    if merged == 0 {
        warn(Component::Pipeline, None, &message);
    } else {
        info(Component::Pipeline, None, &message);
    }
}
