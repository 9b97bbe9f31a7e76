//! CSV import of district-period tables.

use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use tracing::debug;

use crate::data::{ColumnRoles, DataError, Dataset, DistrictPeriodRecord, FeatureSchema};

/// Reads a district-period table from a CSV file.
///
/// # Errors
///
/// See [`read_dataset_from`]; opening the file can also fail with
/// [`DataError::Csv`].
pub fn read_dataset(path: &Path, roles: &ColumnRoles) -> Result<Dataset, DataError> {
    let file = File::open(path).map_err(csv::Error::from)?;
    let dataset = read_dataset_from(file, roles)?;
    debug!(
        path = %path.display(),
        rows = dataset.len(),
        features = dataset.schema().len(),
        "dataset loaded"
    );
    Ok(dataset)
}

/// Reads a district-period table from any reader.
///
/// The header row locates the identifier and target columns by the names in
/// `roles`; every other column becomes a numeric feature, in header order.
/// Cells are trimmed before parsing. Data rows are numbered from 1 in errors.
///
/// # Errors
///
/// Returns [`DataError::MissingColumn`] when a role column is absent,
/// [`DataError::DuplicateColumn`] for a repeated header,
/// [`DataError::InvalidNumber`] or [`DataError::NonFinite`] for bad cells,
/// and [`DataError::Csv`] for ragged rows or I/O failures.
pub fn read_dataset_from(reader: impl Read, roles: &ColumnRoles) -> Result<Dataset, DataError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let mut seen = HashSet::with_capacity(headers.len());
    for name in &headers {
        if !seen.insert(name) {
            return Err(DataError::DuplicateColumn(name.to_string()));
        }
    }

    let locate = |name: &str| {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| DataError::MissingColumn(name.to_string()))
    };
    let borough = locate(&roles.borough)?;
    let district = locate(&roles.district)?;
    let date = locate(&roles.date)?;
    let target = locate(&roles.target)?;

    let feature_idx: Vec<usize> = (0..headers.len())
        .filter(|&i| !roles.is_role(&headers[i]))
        .collect();
    let schema = FeatureSchema::new(feature_idx.iter().map(|&i| headers[i].to_string()).collect())?;

    let mut records = Vec::new();
    for (i, result) in rdr.records().enumerate() {
        let row = i + 1;
        let record = result?;
        let number = |col: usize| -> Result<f64, DataError> {
            let cell = &record[col];
            let value: f64 = cell.parse().map_err(|_| DataError::InvalidNumber {
                row,
                column: headers[col].to_string(),
                value: cell.to_string(),
            })?;
            if value.is_finite() {
                Ok(value)
            } else {
                Err(DataError::NonFinite {
                    row,
                    column: headers[col].to_string(),
                })
            }
        };

        records.push(DistrictPeriodRecord {
            borough: record[borough].to_string(),
            district: record[district].to_string(),
            date: record[date].to_string(),
            total_rentals: number(target)?,
            features: feature_idx
                .iter()
                .map(|&col| number(col))
                .collect::<Result<_, _>>()?,
        });
    }

    Dataset::new(schema, records)
}
