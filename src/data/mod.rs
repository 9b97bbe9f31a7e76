//! District-period records, feature schemas, and train-only standardization.

mod dataset;
mod standardize;

pub use dataset::{ColumnRoles, Dataset, DistrictPeriodRecord, FeatureMatrix, FeatureSchema};
pub use standardize::Standardizer;

use thiserror::Error;

/// Errors raised while building or transforming tabular data.
#[derive(Debug, Error)]
pub enum DataError {
    /// Underlying CSV reader failure (I/O, ragged rows, bad UTF-8).
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    /// A column required by the configured column roles is absent.
    #[error("missing required column \"{0}\"")]
    MissingColumn(String),
    /// The same column name appears twice, or a feature shadows a role column.
    #[error("duplicate column \"{0}\"")]
    DuplicateColumn(String),
    /// A cell could not be parsed as a number.
    #[error("row {row}, column \"{column}\": cannot parse \"{value}\" as a number")]
    InvalidNumber {
        row: usize,
        column: String,
        value: String,
    },
    /// A feature or target value is NaN or infinite.
    #[error("row {row}, column \"{column}\": value is not finite")]
    NonFinite { row: usize, column: String },
    /// A record carries the wrong number of feature values.
    #[error("row {row}: expected {expected} feature values, found {found}")]
    RowWidth {
        row: usize,
        expected: usize,
        found: usize,
    },
    /// A matrix does not have the column layout the transform was fitted on.
    #[error("feature schema mismatch: {}", describe_mismatch(.expected, .found))]
    SchemaMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },
    /// Standardization statistics cannot be fitted on zero rows.
    #[error("cannot fit standardization on an empty matrix")]
    EmptyMatrix,
    /// A feature column looked up by name is not part of the schema.
    #[error("unknown feature column \"{0}\"")]
    UnknownFeature(String),
}

/// Renders a schema mismatch as missing/unexpected column lists.
pub(crate) fn describe_mismatch(expected: &[String], found: &[String]) -> String {
    let missing: Vec<&str> = expected
        .iter()
        .filter(|c| !found.contains(c))
        .map(String::as_str)
        .collect();
    let unexpected: Vec<&str> = found
        .iter()
        .filter(|c| !expected.contains(c))
        .map(String::as_str)
        .collect();

    if missing.is_empty() && unexpected.is_empty() {
        return format!(
            "same columns in a different order (expected [{}], found [{}])",
            expected.join(", "),
            found.join(", ")
        );
    }
    format!(
        "missing [{}], unexpected [{}]",
        missing.join(", "),
        unexpected.join(", ")
    )
}
