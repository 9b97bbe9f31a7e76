use std::collections::{BTreeSet, HashSet};

use ndarray::{Array1, Array2};

use super::DataError;

/// Names of the identifier and target columns in a district-period table.
///
/// Every other column of the table is treated as a numeric feature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRoles {
    /// Borough (administrative area) identifier column.
    pub borough: String,
    /// District identifier column.
    pub district: String,
    /// Date / period identifier column.
    pub date: String,
    /// Total rental count column (regression target).
    pub target: String,
}

impl Default for ColumnRoles {
    fn default() -> Self {
        Self {
            borough: "borough".to_string(),
            district: "district".to_string(),
            date: "date".to_string(),
            target: "total_rentals".to_string(),
        }
    }
}

impl ColumnRoles {
    /// All role column names in table order convention.
    pub fn names(&self) -> [&str; 4] {
        [
            self.borough.as_str(),
            self.district.as_str(),
            self.date.as_str(),
            self.target.as_str(),
        ]
    }

    /// Whether `column` is one of the identifier/target columns.
    pub fn is_role(&self, column: &str) -> bool {
        self.names().contains(&column)
    }
}

/// One row of the district-period table.
#[derive(Debug, Clone, PartialEq)]
pub struct DistrictPeriodRecord {
    pub borough: String,
    pub district: String,
    /// Period identifier, ISO `YYYY-MM-DD` for daily tables.
    pub date: String,
    /// Observed total rentals (regression target).
    pub total_rentals: f64,
    /// Feature values, ordered as the owning dataset's [`FeatureSchema`].
    pub features: Vec<f64>,
}

/// Ordered list of feature column names with no duplicates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureSchema {
    columns: Vec<String>,
}

impl FeatureSchema {
    /// Creates a schema, rejecting duplicate column names.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::DuplicateColumn`] for the first repeated name.
    pub fn new(columns: Vec<String>) -> Result<Self, DataError> {
        let mut seen = HashSet::with_capacity(columns.len());
        for column in &columns {
            if !seen.insert(column.as_str()) {
                return Err(DataError::DuplicateColumn(column.clone()));
            }
        }
        Ok(Self { columns })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Position of `name` in the schema, if present.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Fails with [`DataError::SchemaMismatch`] unless `other` has the same columns in the same order.
    pub fn ensure_matches(&self, other: &FeatureSchema) -> Result<(), DataError> {
        if self == other {
            return Ok(());
        }
        Err(DataError::SchemaMismatch {
            expected: self.columns.clone(),
            found: other.columns.clone(),
        })
    }
}

/// Numeric feature matrix with named columns (rows = district-periods).
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    schema: FeatureSchema,
    values: Array2<f64>,
}

impl FeatureMatrix {
    /// Wraps `values` with its column schema.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::RowWidth`] if the column count disagrees with the schema.
    pub fn new(schema: FeatureSchema, values: Array2<f64>) -> Result<Self, DataError> {
        if values.ncols() != schema.len() {
            return Err(DataError::RowWidth {
                row: 0,
                expected: schema.len(),
                found: values.ncols(),
            });
        }
        Ok(Self { schema, values })
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    pub fn nrows(&self) -> usize {
        self.values.nrows()
    }

    pub fn ncols(&self) -> usize {
        self.values.ncols()
    }
}

/// A validated district-period table: one schema, rows of matching width.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    schema: FeatureSchema,
    records: Vec<DistrictPeriodRecord>,
}

impl Dataset {
    /// Builds a dataset after checking every row against the schema.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::RowWidth`] for a row of the wrong width and
    /// [`DataError::NonFinite`] for NaN/infinite targets or features.
    pub fn new(
        schema: FeatureSchema,
        records: Vec<DistrictPeriodRecord>,
    ) -> Result<Self, DataError> {
        for (row, record) in records.iter().enumerate() {
            if record.features.len() != schema.len() {
                return Err(DataError::RowWidth {
                    row,
                    expected: schema.len(),
                    found: record.features.len(),
                });
            }
            if !record.total_rentals.is_finite() {
                return Err(DataError::NonFinite {
                    row,
                    column: "target".to_string(),
                });
            }
            if let Some(col) = record.features.iter().position(|v| !v.is_finite()) {
                return Err(DataError::NonFinite {
                    row,
                    column: schema.columns()[col].clone(),
                });
            }
        }
        Ok(Self { schema, records })
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn records(&self) -> &[DistrictPeriodRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Raw feature matrix: identifier and target columns are not part of it.
    pub fn feature_matrix(&self) -> FeatureMatrix {
        let values = Array2::from_shape_fn((self.records.len(), self.schema.len()), |(i, j)| {
            self.records[i].features[j]
        });
        FeatureMatrix {
            schema: self.schema.clone(),
            values,
        }
    }

    /// Target vector (total rentals) in row order.
    pub fn target(&self) -> Array1<f64> {
        self.records.iter().map(|r| r.total_rentals).collect()
    }

    /// Distinct period identifiers present in the table.
    pub fn periods(&self) -> BTreeSet<&str> {
        self.records.iter().map(|r| r.date.as_str()).collect()
    }

    /// Values of one named feature column in row order.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::UnknownFeature`] if the column is not in the schema.
    pub fn feature_column(&self, name: &str) -> Result<Vec<f64>, DataError> {
        let idx = self
            .schema
            .index_of(name)
            .ok_or_else(|| DataError::UnknownFeature(name.to_string()))?;
        Ok(self.records.iter().map(|r| r.features[idx]).collect())
    }
}
