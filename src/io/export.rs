//! CSV export for scored test rows and station adjustments.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::data::Dataset;
use crate::realloc::Adjustment;

/// Column header for per-row demand predictions.
const PREDICTIONS_HEADER: &str = "borough,district,date,actual,predicted";

/// Column header for per-district station adjustments.
const ADJUSTMENTS_HEADER: &str = "district,station_count,clamped_count,new_count,delta";

/// Exports predictions for the rows of `dataset` to a CSV file.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_predictions(dataset: &Dataset, predicted: &[f64], path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    write_predictions(dataset, predicted, io::BufWriter::new(file))
}

/// Writes one row per dataset record with its observed and predicted
/// rentals.
///
/// # Errors
///
/// Returns `InvalidInput` if `predicted` is not row-aligned with `dataset`,
/// or an `io::Error` if writing fails.
pub fn write_predictions(dataset: &Dataset, predicted: &[f64], writer: impl Write) -> io::Result<()> {
    if predicted.len() != dataset.len() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!(
                "{} predictions for {} rows",
                predicted.len(),
                dataset.len()
            ),
        ));
    }

    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(PREDICTIONS_HEADER.split(','))?;
    for (r, p) in dataset.records().iter().zip(predicted) {
        wtr.write_record(&[
            r.borough.clone(),
            r.district.clone(),
            r.date.clone(),
            format!("{:.4}", r.total_rentals),
            format!("{p:.4}"),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Exports station adjustments to a CSV file.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_adjustments(adjustments: &[Adjustment], path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    write_adjustments(adjustments, io::BufWriter::new(file))
}

/// Writes one row per district adjustment, in input order.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_adjustments(adjustments: &[Adjustment], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(ADJUSTMENTS_HEADER.split(','))?;
    for a in adjustments {
        wtr.write_record(&[
            a.district.clone(),
            a.station_count.to_string(),
            a.clamped_count.to_string(),
            a.new_count.to_string(),
            a.delta().to_string(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}
