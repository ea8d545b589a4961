//! `mae-monitor`: render the MAE-by-pickup-hour report.
//!
//! One-shot by default; `--interactive` keeps prompting for a new window and
//! runs a fresh, independent report for each entry.

use clap::Parser;
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::process::ExitCode;

use mae_monitor::chart::render_chart;
use mae_monitor::cli::{Cli, HoursEntry, parse_hours_entry};
use mae_monitor::config::{Config, SourceKind, load_config};
use mae_monitor::display::{PAGE_TITLE, format_json, format_report};
use mae_monitor::ingest::DemandSource;
use mae_monitor::ingest::db::PostgresSource;
use mae_monitor::ingest::feature_store::FeatureStoreSource;
use mae_monitor::logging::{self, Component, init_logger};
use mae_monitor::model::{MAX_PAST_HOURS, MIN_PAST_HOURS, ReportError};
use mae_monitor::report::run_report;

/// How a single run ended, from the user's point of view.
enum Outcome {
    Rendered,
    Warned,
    Failed,
}

fn main() -> ExitCode {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let mut config = match load_config(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    cli.apply_overrides(&mut config);

    // Validated when the config was parsed
    let level = config.logging.min_level().unwrap_or(logging::LogLevel::Info);
    init_logger(
        level,
        config.logging.file.as_deref(),
        config.logging.console_timestamps,
    );

    let mut source = match connect(&config) {
        Ok(source) => source,
        Err(e) => {
            logging::error(Component::System, None, &format!("data source unavailable: {}", e));
            eprintln!("Error fetching data: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if !cli.json {
        println!("{}", PAGE_TITLE);
    }

    if cli.interactive {
        let stdin = io::stdin();
        return match interactive(stdin.lock(), source.as_mut(), &config, cli.json) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("Error reading input: {}", e);
                ExitCode::FAILURE
            }
        };
    }

    match run_once(source.as_mut(), &config, cli.past_hours, cli.json) {
        Outcome::Rendered | Outcome::Warned => ExitCode::SUCCESS,
        Outcome::Failed => ExitCode::FAILURE,
    }
}

fn connect(config: &Config) -> Result<Box<dyn DemandSource>, Box<dyn std::error::Error>> {
    let source: Box<dyn DemandSource> = match config.source.kind {
        SourceKind::Postgres => Box::new(PostgresSource::connect(&config.postgres)?),
        SourceKind::FeatureStore => Box::new(FeatureStoreSource::connect(&config.feature_store)?),
    };
    Ok(source)
}

fn run_once(source: &mut dyn DemandSource, config: &Config, past_hours: u32, json: bool) -> Outcome {
    if !json {
        println!("Fetching data for the past {} hours...", past_hours);
    }

    let report = match run_report(source, past_hours) {
        Ok(report) => report,
        Err(e) if e.is_warning() => {
            print_warning(&e, json, &mut io::stdout(), &mut io::stderr());
            return Outcome::Warned;
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            return Outcome::Failed;
        }
    };

    if json {
        match format_json(&report) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("Error: failed to encode report: {}", e);
                return Outcome::Failed;
            }
        }
    } else {
        print!("{}", format_report(&report));
    }

    let chart_path = Path::new(&config.report.chart_path);
    let size = (config.report.chart_width, config.report.chart_height);
    match render_chart(&report, chart_path, size) {
        Ok(()) => {
            logging::info(
                Component::System,
                None,
                &format!("Chart written to {}", chart_path.display()),
            );
            Outcome::Rendered
        }
        Err(e) => {
            eprintln!("Error: failed to render chart: {}", e);
            Outcome::Failed
        }
    }
}

/// JSON mode keeps stdout for the report document alone.
fn print_warning<'a>(
    e: &ReportError,
    json: bool,
    stdout: &'a mut dyn Write,
    stderr: &'a mut dyn Write,
) {
    let sink = if json { stderr } else { stdout };
    let _ = writeln!(sink, "Warning: {}", e);
}

/// Prompt until the user quits or input ends. Unreadable input is an error.
fn interactive(
    input: impl BufRead,
    source: &mut dyn DemandSource,
    config: &Config,
    json: bool,
) -> io::Result<()> {
    let mut lines = input.lines();
    loop {
        print!(
            "\nNumber of past hours to plot ({}-{}, blank to quit): ",
            MIN_PAST_HOURS, MAX_PAST_HOURS
        );
        let _ = io::stdout().flush();

        let Some(line) = lines.next() else {
            break;
        };
        let line = line?;
        match parse_hours_entry(&line) {
            Ok(HoursEntry::Quit) => break,
            Ok(HoursEntry::Run(hours)) => {
                run_once(source, config, hours, json);
            }
            Err(msg) => println!("{}", msg),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mae_monitor::model::{FetchFailure, HourlyRide, Prediction};
    use std::io::Cursor;

    /// Counts fetches; every table comes back empty.
    #[derive(Default)]
    struct CountingSource {
        fetches: usize,
    }

    impl DemandSource for CountingSource {
        fn fetch_hourly_rides(&mut self, _past_hours: u32) -> Result<Vec<HourlyRide>, FetchFailure> {
            self.fetches += 1;
            Ok(Vec::new())
        }

        fn fetch_predictions(&mut self, _past_hours: u32) -> Result<Vec<Prediction>, FetchFailure> {
            self.fetches += 1;
            Ok(Vec::new())
        }
    }

    fn empty_warning() -> ReportError {
        ReportError::EmptyData("No data fetched for the selected period.".into())
    }

    #[test]
    fn test_json_warning_goes_to_stderr() {
        let (mut out, mut err) = (Vec::new(), Vec::new());
        print_warning(&empty_warning(), true, &mut out, &mut err);
        assert!(out.is_empty());
        assert_eq!(
            String::from_utf8(err).unwrap(),
            "Warning: No data fetched for the selected period.\n"
        );
    }

    #[test]
    fn test_table_warning_goes_to_stdout() {
        let (mut out, mut err) = (Vec::new(), Vec::new());
        print_warning(&empty_warning(), false, &mut out, &mut err);
        assert!(err.is_empty());
        assert!(String::from_utf8(out).unwrap().starts_with("Warning: "));
    }

    #[test]
    fn test_invalid_utf8_input_is_reported() {
        let mut source = CountingSource::default();
        let input = Cursor::new(vec![0xff, 0xfe, b'\n', b'2', b'4', b'\n']);
        let err = interactive(input, &mut source, &Config::default(), true).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        assert_eq!(source.fetches, 0);
    }

    #[test]
    fn test_end_of_input_quits_cleanly() {
        let mut source = CountingSource::default();
        let input = Cursor::new(b"24\n".to_vec());
        interactive(input, &mut source, &Config::default(), true).unwrap();
        assert_eq!(source.fetches, 2);
    }
}
