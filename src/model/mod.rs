//! Gradient-boosted regression trees (second-order, histogram split search).
//!
//! The booster follows the XGBoost formulation: each round fits a depth-wise
//! regression tree to the gradient/hessian of the squared-error loss, with
//! L1 (`reg_alpha`) and L2 (`reg_lambda`) regularization on leaf weights and
//! a learning-rate shrinkage. Split candidates come from per-feature quantile
//! bins computed once on the training matrix.
//!
//! # Usage
//!
//! ```
//! use bikeshare_sim::data::{FeatureMatrix, FeatureSchema};
//! use bikeshare_sim::model::{BoostingParams, GradientBoostedRegressor};
//! use ndarray::{Array1, Array2};
//!
//! let schema = FeatureSchema::new(vec!["x".to_string()]).unwrap();
//! let x = Array2::from_shape_fn((40, 1), |(i, _)| i as f64);
//! let y: Array1<f64> = (0..40).map(|i| if i < 20 { 1.0 } else { 5.0 }).collect();
//! let features = FeatureMatrix::new(schema, x).unwrap();
//!
//! let params = BoostingParams { n_estimators: 50, max_depth: 2, ..BoostingParams::default() };
//! let model = GradientBoostedRegressor::new(params).fit(&features, &y).unwrap();
//! let pred = model.predict(&features).unwrap();
//! assert!(pred[0] < pred[39]);
//! ```

mod binning;
mod booster;
mod params;
mod tree;

pub use booster::{GradientBoostedRegressor, TrainedModel};
pub use params::{BoostingParams, Objective};
pub use tree::{Node, Tree};

use thiserror::Error;

use crate::data::DataError;

/// Errors raised by model fitting and scoring.
#[derive(Debug, Error)]
pub enum ModelError {
    /// Fitting requires at least one row.
    #[error("cannot fit a model on zero rows")]
    EmptyTrainingSet,
    /// Feature rows and target values differ in count.
    #[error("feature rows and target length mismatch: {features} vs {targets}")]
    LengthMismatch { features: usize, targets: usize },
    /// A target value is NaN or infinite.
    #[error("target value at row {0} is not finite")]
    NonFiniteTarget(usize),
    /// Scoring input is not laid out like the training matrix.
    #[error(transparent)]
    Schema(#[from] DataError),
}
