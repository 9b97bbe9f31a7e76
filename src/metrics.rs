//! Post-hoc accuracy metrics for demand predictions.

use std::fmt;

/// Regression accuracy of predicted against observed rentals.
#[derive(Debug, Clone, PartialEq)]
pub struct RegressionReport {
    /// Number of scored rows.
    pub samples: usize,
    /// Root-mean-square error (rentals).
    pub rmse: f64,
    /// Mean absolute error (rentals).
    pub mae: f64,
    /// Coefficient of determination.
    pub r2: f64,
}

impl RegressionReport {
    /// Computes all metrics from row-aligned predictions and observations.
    ///
    /// When the observations have zero variance, `r2` is 1.0 for a perfect
    /// fit and 0.0 otherwise.
    ///
    /// # Panics
    ///
    /// Panics if `predicted` and `actual` differ in length.
    pub fn from_predictions(predicted: &[f64], actual: &[f64]) -> Self {
        assert_eq!(
            predicted.len(),
            actual.len(),
            "predictions and observations must be row-aligned"
        );
        if actual.is_empty() {
            return Self {
                samples: 0,
                rmse: 0.0,
                mae: 0.0,
                r2: 0.0,
            };
        }

        let n = actual.len() as f64;
        let mean = actual.iter().sum::<f64>() / n;
        let mut sq_sum = 0.0_f64;
        let mut abs_sum = 0.0_f64;
        let mut total_sq = 0.0_f64;

        for (p, a) in predicted.iter().zip(actual) {
            let err = p - a;
            sq_sum += err * err;
            abs_sum += err.abs();
            total_sq += (a - mean) * (a - mean);
        }

        let r2 = if total_sq > 0.0 {
            1.0 - sq_sum / total_sq
        } else if sq_sum == 0.0 {
            1.0
        } else {
            0.0
        };

        Self {
            samples: actual.len(),
            rmse: (sq_sum / n).sqrt(),
            mae: abs_sum / n,
            r2,
        }
    }
}

impl fmt::Display for RegressionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Demand Model Report ---")?;
        writeln!(f, "Test rows:  {}", self.samples)?;
        writeln!(f, "RMSE:       {:.3}", self.rmse)?;
        writeln!(f, "MAE:        {:.3}", self.mae)?;
        write!(f, "R2:         {:.4}", self.r2)
    }
}
