use ndarray::Array1;
use rand::{Rng, SeedableRng, rngs::StdRng};
use tracing::{debug, info};

use crate::data::{FeatureMatrix, FeatureSchema};

use super::ModelError;
use super::binning::BinnedMatrix;
use super::params::BoostingParams;
use super::tree::{Node, Tree, TreeBuilder};

/// Boosting rounds between progress log lines.
const LOG_EVERY_ROUNDS: usize = 25;

/// Trainer for a gradient-boosted tree ensemble.
#[derive(Debug, Clone, Default)]
pub struct GradientBoostedRegressor {
    params: BoostingParams,
}

impl GradientBoostedRegressor {
    pub fn new(params: BoostingParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &BoostingParams {
        &self.params
    }

    /// Fits the ensemble on `x` against `y`.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::EmptyTrainingSet`] for zero rows,
    /// [`ModelError::LengthMismatch`] if `y` has a different length than
    /// `x` has rows, and [`ModelError::NonFiniteTarget`] for NaN/infinite
    /// targets.
    pub fn fit(&self, x: &FeatureMatrix, y: &Array1<f64>) -> Result<TrainedModel, ModelError> {
        let n = x.nrows();
        if n == 0 {
            return Err(ModelError::EmptyTrainingSet);
        }
        if y.len() != n {
            return Err(ModelError::LengthMismatch {
                features: n,
                targets: y.len(),
            });
        }
        if let Some(row) = y.iter().position(|v| !v.is_finite()) {
            return Err(ModelError::NonFiniteTarget(row));
        }

        let p = &self.params;
        let base_score = y.sum() / n as f64;
        let binned = BinnedMatrix::build(x.values(), p.max_bin);
        let mut rng = StdRng::seed_from_u64(p.seed);
        let mut predicted = vec![base_score; n];
        let mut trees = Vec::with_capacity(p.n_estimators);
        let mut grad = vec![0.0; n];
        let mut hess = vec![0.0; n];

        for round in 0..p.n_estimators {
            for i in 0..n {
                (grad[i], hess[i]) = p.objective.gradient(predicted[i], y[i]);
            }
            let rows = sample_rows(n, p.subsample, &mut rng);
            let features = sample_features(binned.n_features(), p.colsample_bytree, &mut rng);

            let tree = TreeBuilder::new(&binned, p, &features, &grad, &hess).build(rows);
            for (i, row) in x.values().rows().into_iter().enumerate() {
                predicted[i] += tree.predict_row(row);
            }
            trees.push(tree);

            if round % LOG_EVERY_ROUNDS == 0 || round + 1 == p.n_estimators {
                debug!(
                    round,
                    train_rmse = rmse(&predicted, y),
                    "boosting round complete"
                );
            }
        }

        info!(
            rows = n,
            features = x.ncols(),
            trees = trees.len(),
            train_rmse = rmse(&predicted, y),
            "gradient-boosted model fitted"
        );

        Ok(TrainedModel {
            schema: x.schema().clone(),
            base_score,
            trees,
        })
    }
}

fn sample_rows(n: usize, ratio: f64, rng: &mut StdRng) -> Vec<usize> {
    if ratio >= 1.0 {
        return (0..n).collect();
    }
    let rows: Vec<usize> = (0..n).filter(|_| rng.random::<f64>() < ratio).collect();
    if rows.is_empty() {
        vec![rng.random_range(0..n)]
    } else {
        rows
    }
}

fn sample_features(m: usize, ratio: f64, rng: &mut StdRng) -> Vec<usize> {
    if ratio >= 1.0 || m == 0 {
        return (0..m).collect();
    }
    let k = ((m as f64 * ratio).ceil() as usize).clamp(1, m);
    let mut picked = rand::seq::index::sample(rng, m, k).into_vec();
    picked.sort_unstable();
    picked
}

fn rmse(predicted: &[f64], actual: &Array1<f64>) -> f64 {
    let sq: f64 = predicted
        .iter()
        .zip(actual.iter())
        .map(|(p, a)| (p - a) * (p - a))
        .sum();
    (sq / predicted.len().max(1) as f64).sqrt()
}

/// Immutable fitted ensemble.
///
/// Only scoring is exposed; the trees cannot be modified after fit.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainedModel {
    schema: FeatureSchema,
    base_score: f64,
    trees: Vec<Tree>,
}

impl TrainedModel {
    /// Scores every row of `x`.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Schema`] if `x` does not have the training columns.
    pub fn predict(&self, x: &FeatureMatrix) -> Result<Array1<f64>, ModelError> {
        self.schema.ensure_matches(x.schema())?;
        Ok(x
            .values()
            .rows()
            .into_iter()
            .map(|row| {
                self.base_score + self.trees.iter().map(|t| t.predict_row(row)).sum::<f64>()
            })
            .collect())
    }

    /// Gain-based importance per feature, normalized to sum to 1 and sorted
    /// descending (ties by schema order).
    pub fn feature_importance(&self) -> Vec<(String, f64)> {
        let mut gains = vec![0.0; self.schema.len()];
        for tree in &self.trees {
            for node in tree.nodes() {
                if let Node::Split { feature, gain, .. } = node {
                    gains[*feature] += gain;
                }
            }
        }
        let total: f64 = gains.iter().sum();
        let mut ranked: Vec<(String, f64)> = self
            .schema
            .columns()
            .iter()
            .cloned()
            .zip(gains.into_iter().map(|g| if total > 0.0 { g / total } else { 0.0 }))
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn base_score(&self) -> f64 {
        self.base_score
    }

    pub fn trees(&self) -> &[Tree] {
        &self.trees
    }
}
