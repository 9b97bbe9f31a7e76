use ndarray::{Array1, Axis};

use super::{DataError, FeatureMatrix, FeatureSchema};

/// Per-column zero-mean / unit-variance transform.
///
/// Statistics come only from the matrix passed to [`Standardizer::fit`];
/// [`Standardizer::transform`] reuses them unchanged on any other matrix, so
/// an evaluation partition never influences the fitted mean or scale.
/// Columns with zero variance are centred but not rescaled.
#[derive(Debug, Clone, PartialEq)]
pub struct Standardizer {
    schema: FeatureSchema,
    mean: Array1<f64>,
    scale: Array1<f64>,
}

impl Standardizer {
    /// Fits column means and population standard deviations.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::EmptyMatrix`] if `matrix` has no rows.
    pub fn fit(matrix: &FeatureMatrix) -> Result<Self, DataError> {
        let values = matrix.values();
        let mean = values.mean_axis(Axis(0)).ok_or(DataError::EmptyMatrix)?;
        let scale = values
            .var_axis(Axis(0), 0.0)
            .mapv(|var| {
                let std = var.sqrt();
                if std > 0.0 && std.is_finite() { std } else { 1.0 }
            });
        Ok(Self {
            schema: matrix.schema().clone(),
            mean,
            scale,
        })
    }

    /// Applies the fitted transform to a matrix with the same schema.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::SchemaMismatch`] if the column layout differs
    /// from the one seen at fit time.
    pub fn transform(&self, matrix: &FeatureMatrix) -> Result<FeatureMatrix, DataError> {
        self.schema.ensure_matches(matrix.schema())?;
        let standardized = (matrix.values() - &self.mean) / &self.scale;
        FeatureMatrix::new(self.schema.clone(), standardized)
    }

    pub fn mean(&self) -> &Array1<f64> {
        &self.mean
    }

    pub fn scale(&self) -> &Array1<f64> {
        &self.scale
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }
}
