//! Demand estimator: train on one period, score a later, disjoint period.

use std::fmt;

use ndarray::Array1;
use thiserror::Error;
use tracing::info;

use crate::data::{DataError, Dataset, FeatureMatrix, Standardizer, describe_mismatch};
use crate::metrics::RegressionReport;
use crate::model::{BoostingParams, GradientBoostedRegressor, ModelError, TrainedModel};

/// Which side of the temporal split a dataset belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Partition {
    Train,
    Test,
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Train => write!(f, "training"),
            Self::Test => write!(f, "test"),
        }
    }
}

/// Errors raised by [`DemandEstimator::fit_and_score`].
#[derive(Debug, Error)]
pub enum EstimatorError {
    #[error("{0} set is empty")]
    EmptyDataset(Partition),
    #[error("training and test feature schemas differ: {}", describe_mismatch(.train, .test))]
    SchemaMismatch { train: Vec<String>, test: Vec<String> },
    /// Train and test share period identifiers, so the split is not temporal.
    #[error("training and test sets share {shared} period(s), first: {first}")]
    OverlappingPeriods { shared: usize, first: String },
    /// A test period sorts at or before the latest training period.
    #[error("test period {test_first} is not after the last training period {train_last}")]
    TestNotAfterTrain {
        train_last: String,
        test_first: String,
    },
    #[error(transparent)]
    Data(#[from] DataError),
    #[error(transparent)]
    Model(#[from] ModelError),
}

/// Fitted artifacts of one train/score run.
#[derive(Debug, Clone)]
pub struct EstimatorOutput {
    /// Model fitted on the standardized training features.
    pub model: TrainedModel,
    /// Transform fitted on the training features only.
    pub standardizer: Standardizer,
    /// Test features after the training-fitted transform.
    pub test_features: FeatureMatrix,
    /// Observed test targets, row-aligned with `test_features`.
    pub test_target: Array1<f64>,
}

impl EstimatorOutput {
    /// Model predictions for the standardized test rows.
    pub fn predictions(&self) -> Result<Array1<f64>, EstimatorError> {
        Ok(self.model.predict(&self.test_features)?)
    }

    /// Accuracy of the test predictions against the observed targets.
    pub fn report(&self) -> Result<RegressionReport, EstimatorError> {
        let predicted = self.predictions()?;
        Ok(RegressionReport::from_predictions(
            &predicted.to_vec(),
            &self.test_target.to_vec(),
        ))
    }
}

/// Trains the demand regression model and scores the held-out period.
#[derive(Debug, Clone, Default)]
pub struct DemandEstimator {
    params: BoostingParams,
}

impl DemandEstimator {
    pub fn new(params: BoostingParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &BoostingParams {
        &self.params
    }

    /// Runs the full estimation: drop identifiers, standardize on train,
    /// fit the booster, and prepare the test features for scoring.
    ///
    /// # Errors
    ///
    /// Fails if either set is empty, if their feature schemas differ, if
    /// they share any period identifier, or if any test period does not sort
    /// strictly after every training period (ISO dates order lexicographically).
    pub fn fit_and_score(
        &self,
        train: &Dataset,
        test: &Dataset,
    ) -> Result<EstimatorOutput, EstimatorError> {
        if train.is_empty() {
            return Err(EstimatorError::EmptyDataset(Partition::Train));
        }
        if test.is_empty() {
            return Err(EstimatorError::EmptyDataset(Partition::Test));
        }
        if train.schema() != test.schema() {
            return Err(EstimatorError::SchemaMismatch {
                train: train.schema().columns().to_vec(),
                test: test.schema().columns().to_vec(),
            });
        }
        ensure_test_follows_train(train, test)?;

        let raw_train = train.feature_matrix();
        let raw_test = test.feature_matrix();
        let standardizer = Standardizer::fit(&raw_train)?;
        let train_features = standardizer.transform(&raw_train)?;
        let test_features = standardizer.transform(&raw_test)?;

        let model = GradientBoostedRegressor::new(self.params.clone())
            .fit(&train_features, &train.target())?;

        info!(
            train_rows = train.len(),
            test_rows = test.len(),
            features = train.schema().len(),
            "demand estimator trained"
        );

        Ok(EstimatorOutput {
            model,
            standardizer,
            test_features,
            test_target: test.target(),
        })
    }
}

fn ensure_test_follows_train(train: &Dataset, test: &Dataset) -> Result<(), EstimatorError> {
    let train_periods = train.periods();
    let test_periods = test.periods();
    let shared: Vec<&str> = test_periods
        .iter()
        .copied()
        .filter(|p| train_periods.contains(p))
        .collect();
    if let Some(first) = shared.first() {
        return Err(EstimatorError::OverlappingPeriods {
            shared: shared.len(),
            first: (*first).to_string(),
        });
    }

    // Both sets are non-empty here.
    if let (Some(train_last), Some(test_first)) = (train_periods.last(), test_periods.first())
        && test_first <= train_last
    {
        return Err(EstimatorError::TestNotAfterTrain {
            train_last: (*train_last).to_string(),
            test_first: (*test_first).to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{DistrictPeriodRecord, FeatureSchema};

    fn dataset(year: u32, columns: &[&str], days: usize) -> Dataset {
        let schema = FeatureSchema::new(columns.iter().map(|s| s.to_string()).collect())
            .expect("schema");
        let records = (0..days)
            .map(|d| DistrictPeriodRecord {
                borough: "Jongno-gu".to_string(),
                district: "Sajik-dong".to_string(),
                date: format!("{year}-01-{:02}", d + 1),
                total_rentals: (d % 5) as f64 * 10.0,
                features: (0..columns.len()).map(|j| (d * (j + 1)) as f64).collect(),
            })
            .collect();
        Dataset::new(schema, records).expect("dataset")
    }

    fn quick() -> DemandEstimator {
        DemandEstimator::new(BoostingParams {
            n_estimators: 10,
            max_depth: 3,
            ..BoostingParams::default()
        })
    }

    #[test]
    fn output_is_row_aligned_with_test_set() {
        let out = quick()
            .fit_and_score(&dataset(2023, &["a", "b"], 20), &dataset(2024, &["a", "b"], 8))
            .expect("fit");
        assert_eq!(out.test_features.nrows(), 8);
        assert_eq!(out.test_target.len(), 8);
        assert_eq!(out.predictions().expect("predict").len(), 8);
        assert_eq!(out.report().expect("report").samples, 8);
    }

    #[test]
    fn rejects_schema_mismatch() {
        let err = quick()
            .fit_and_score(&dataset(2023, &["a", "b"], 5), &dataset(2024, &["a", "c"], 5))
            .expect_err("must fail");
        assert!(matches!(err, EstimatorError::SchemaMismatch { .. }));
        assert!(err.to_string().contains("missing [b]"));
    }

    #[test]
    fn rejects_empty_sets() {
        let empty = dataset(2024, &["a"], 0);
        let err = quick()
            .fit_and_score(&dataset(2023, &["a"], 5), &empty)
            .expect_err("must fail");
        assert!(matches!(err, EstimatorError::EmptyDataset(Partition::Test)));

        let err = quick()
            .fit_and_score(&empty, &dataset(2023, &["a"], 5))
            .expect_err("must fail");
        assert!(matches!(err, EstimatorError::EmptyDataset(Partition::Train)));
    }

    #[test]
    fn rejects_overlapping_periods() {
        let err = quick()
            .fit_and_score(&dataset(2023, &["a"], 10), &dataset(2023, &["a"], 3))
            .expect_err("must fail");
        match err {
            EstimatorError::OverlappingPeriods { shared, first } => {
                assert_eq!(shared, 3);
                assert_eq!(first, "2023-01-01");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    fn dated(dates: &[&str]) -> Dataset {
        let schema = FeatureSchema::new(vec!["a".to_string()]).expect("schema");
        let records = dates
            .iter()
            .enumerate()
            .map(|(i, date)| DistrictPeriodRecord {
                borough: "Jongno-gu".to_string(),
                district: "Sajik-dong".to_string(),
                date: date.to_string(),
                total_rentals: i as f64,
                features: vec![i as f64],
            })
            .collect();
        Dataset::new(schema, records).expect("dataset")
    }

    #[test]
    fn rejects_interleaved_periods() {
        let train = dated(&["2023-01-01", "2023-01-03", "2024-12-31"]);
        let test = dated(&["2023-01-02", "2023-06-01"]);
        match quick().fit_and_score(&train, &test).expect_err("must fail") {
            EstimatorError::TestNotAfterTrain {
                train_last,
                test_first,
            } => {
                assert_eq!(train_last, "2024-12-31");
                assert_eq!(test_first, "2023-01-02");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn rejects_test_before_train() {
        let err = quick()
            .fit_and_score(&dataset(2024, &["a"], 5), &dataset(2023, &["a"], 5))
            .expect_err("must fail");
        assert!(matches!(err, EstimatorError::TestNotAfterTrain { .. }));
    }

    #[test]
    fn accepts_test_strictly_after_train() {
        let train = dated(&["2023-01-01", "2023-12-31", "2023-06-15"]);
        let test = dated(&["2024-01-01", "2024-01-02"]);
        assert!(quick().fit_and_score(&train, &test).is_ok());
    }
}
