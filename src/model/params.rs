use serde::Deserialize;

/// Maximum tree depth found by the offline hyperparameter search.
pub const TUNED_MAX_DEPTH: usize = 13;
/// Shrinkage applied to every leaf weight.
pub const TUNED_LEARNING_RATE: f64 = 0.051_961_770_163_512_11;
/// Number of boosting rounds.
pub const TUNED_N_ESTIMATORS: usize = 375;
/// L1 penalty on leaf weights.
pub const TUNED_REG_ALPHA: f64 = 0.022_277_510_182_597_746;
/// L2 penalty on leaf weights.
pub const TUNED_REG_LAMBDA: f64 = 7.927_738_277_254_551_5;
/// Seed for row/column subsampling.
pub const TUNED_SEED: u64 = 42;

/// Training loss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum Objective {
    /// Squared error, `½(ŷ − y)²`.
    #[default]
    #[serde(rename = "reg:squarederror")]
    SquaredError,
}

impl Objective {
    /// First and second derivative of the loss w.r.t. the prediction.
    pub fn gradient(self, predicted: f64, actual: f64) -> (f64, f64) {
        match self {
            Self::SquaredError => (predicted - actual, 1.0),
        }
    }
}

/// Booster hyperparameters.
///
/// [`Default`] yields the tuned configuration used for the demand model;
/// the sampling ratios and tree constraints not covered by the search keep
/// their conventional neutral values (no subsampling, `min_child_weight` 1,
/// no minimum split loss, 256 histogram bins).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BoostingParams {
    /// Maximum depth of each tree (root = depth 0).
    pub max_depth: usize,
    /// Shrinkage factor applied to leaf weights.
    pub learning_rate: f64,
    /// Number of boosting rounds (trees).
    pub n_estimators: usize,
    /// L1 regularization on leaf weights.
    pub reg_alpha: f64,
    /// L2 regularization on leaf weights.
    pub reg_lambda: f64,
    /// Minimum loss reduction required to split a node.
    pub gamma: f64,
    /// Minimum hessian sum in each child.
    pub min_child_weight: f64,
    /// Fraction of rows sampled per tree, in (0, 1].
    pub subsample: f64,
    /// Fraction of feature columns sampled per tree, in (0, 1].
    pub colsample_bytree: f64,
    /// Maximum number of histogram bins per feature.
    pub max_bin: usize,
    /// Seed for the sampling RNG.
    pub seed: u64,
    /// Training objective.
    pub objective: Objective,
}

impl Default for BoostingParams {
    fn default() -> Self {
        Self {
            max_depth: TUNED_MAX_DEPTH,
            learning_rate: TUNED_LEARNING_RATE,
            n_estimators: TUNED_N_ESTIMATORS,
            reg_alpha: TUNED_REG_ALPHA,
            reg_lambda: TUNED_REG_LAMBDA,
            gamma: 0.0,
            min_child_weight: 1.0,
            subsample: 1.0,
            colsample_bytree: 1.0,
            max_bin: 256,
            seed: TUNED_SEED,
            objective: Objective::SquaredError,
        }
    }
}

impl BoostingParams {
    /// `sign(G) · max(|G| − reg_alpha, 0)`.
    pub(crate) fn threshold_l1(&self, grad_sum: f64) -> f64 {
        if grad_sum > self.reg_alpha {
            grad_sum - self.reg_alpha
        } else if grad_sum < -self.reg_alpha {
            grad_sum + self.reg_alpha
        } else {
            0.0
        }
    }

    /// Structure score of a node with the given gradient statistics.
    pub(crate) fn node_score(&self, grad_sum: f64, hess_sum: f64) -> f64 {
        let t = self.threshold_l1(grad_sum);
        t * t / (hess_sum + self.reg_lambda)
    }

    /// Optimal leaf weight, before shrinkage.
    pub(crate) fn leaf_weight(&self, grad_sum: f64, hess_sum: f64) -> f64 {
        -self.threshold_l1(grad_sum) / (hess_sum + self.reg_lambda)
    }
}
