/// Table transformations for the MAE report.
///
/// Everything here is pure: inputs are borrowed slices of typed records and
/// every stage returns a new table.
///
/// Submodules:
/// - `join`: inner join of rides and predictions, with the per-row error.
/// - `aggregate`: per-hour mean absolute error and the overall mean.

pub mod aggregate;
pub mod join;
