//! Demand-model monitoring: mean absolute error of predicted against
//! observed rides, per pickup hour, over a trailing window.
//!
//! - `ingest`: the `DemandSource` trait and its PostgreSQL and feature store backends.
//! - `analysis`: inner join, per-row error and per-hour aggregation.
//! - `report`: `run_report`, the fetch-join-aggregate pipeline.
//! - `chart` / `display`: PNG/SVG chart and terminal output.
//! - `cli` / `config` / `logging`: command line, TOML settings and the service logger.

pub mod analysis;
pub mod chart;
pub mod cli;
pub mod config;
pub mod display;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod report;
