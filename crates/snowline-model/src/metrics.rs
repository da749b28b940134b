//! Regression quality metrics for one validation fold.

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// The five regression metrics computed on one held-out fold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FoldResult {
    pub mean_absolute_error: f64,
    pub mean_squared_error: f64,
    /// Mean of `|y - ŷ| / max(|y|, ε)`.
    pub mean_absolute_percentage_error: f64,
    pub max_error: f64,
    pub r_squared: f64,
}

impl FoldResult {
    /// Compare predictions against true values.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ModelError::EmptyPartition`] | `y_true` is empty |
    /// | [`ModelError::PredictionLengthMismatch`] | lengths differ |
    /// | [`ModelError::NonFinitePrediction`] | a prediction is NaN or infinite |
    pub fn compute(y_true: &[f64], y_pred: &[f64]) -> Result<Self, ModelError> {
        if y_true.is_empty() {
            return Err(ModelError::EmptyPartition { partition: "test" });
        }
        if y_true.len() != y_pred.len() {
            return Err(ModelError::PredictionLengthMismatch {
                expected: y_true.len(),
                got: y_pred.len(),
            });
        }
        if let Some(sample_index) = y_pred.iter().position(|p| !p.is_finite()) {
            return Err(ModelError::NonFinitePrediction { sample_index });
        }

        let n = y_true.len() as f64;
        let (mut abs_sum, mut sq_sum, mut pct_sum, mut max_abs) = (0.0, 0.0, 0.0, 0.0f64);
        for (&y, &p) in y_true.iter().zip(y_pred) {
            let abs = (y - p).abs();
            abs_sum += abs;
            sq_sum += abs * abs;
            pct_sum += abs / y.abs().max(f64::EPSILON);
            max_abs = max_abs.max(abs);
        }

        Ok(Self {
            mean_absolute_error: abs_sum / n,
            mean_squared_error: sq_sum / n,
            mean_absolute_percentage_error: pct_sum / n,
            max_error: max_abs,
            r_squared: r2_score(y_true, y_pred),
        })
    }

    /// Arithmetic mean of each metric over `folds`, each taken from its own field.
    ///
    /// Returns `None` for an empty slice.
    #[must_use]
    pub fn mean(folds: &[FoldResult]) -> Option<FoldResult> {
        if folds.is_empty() {
            return None;
        }
        let n = folds.len() as f64;
        let avg = |metric: fn(&FoldResult) -> f64| folds.iter().map(metric).sum::<f64>() / n;
        Some(FoldResult {
            mean_absolute_error: avg(|f| f.mean_absolute_error),
            mean_squared_error: avg(|f| f.mean_squared_error),
            mean_absolute_percentage_error: avg(|f| f.mean_absolute_percentage_error),
            max_error: avg(|f| f.max_error),
            r_squared: avg(|f| f.r_squared),
        })
    }
}

/// Coefficient of determination.
///
/// When the true values are constant, returns 1.0 for a perfect prediction
/// and 0.0 otherwise. Callers guarantee equal, non-zero lengths.
#[must_use]
pub fn r2_score(y_true: &[f64], y_pred: &[f64]) -> f64 {
    let mean = y_true.iter().sum::<f64>() / y_true.len() as f64;
    let ss_res: f64 = y_true.iter().zip(y_pred).map(|(y, p)| (y - p) * (y - p)).sum();
    let ss_tot: f64 = y_true.iter().map(|y| (y - mean) * (y - mean)).sum();
    if ss_tot == 0.0 {
        return if ss_res == 0.0 { 1.0 } else { 0.0 };
    }
    1.0 - ss_res / ss_tot
}
