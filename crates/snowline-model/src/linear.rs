//! Ordinary least squares / ridge regression with an intercept.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dataset::{validate, validate_rows};
use crate::error::ModelError;
use crate::regressor::Regressor;

/// Relative pivot size below which the normal equations are treated as singular.
const PIVOT_TOLERANCE: f64 = 1e-12;

/// Linear regression fitted by solving the (optionally ridge-penalized)
/// normal equations on centered data.
///
/// # Defaults
///
/// | Parameter | Default |
/// |-----------|---------|
/// | `alpha`   | 0.0     |
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LinearRegression {
    alpha: f64,
    fitted: Option<Fitted>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Fitted {
    coefficients: Vec<f64>,
    intercept: f64,
}

impl LinearRegression {
    /// Plain least squares.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Ridge regression with penalty `alpha` on the coefficients (not the intercept).
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidAlpha`] if `alpha` is negative or not finite.
    pub fn ridge(alpha: f64) -> Result<Self, ModelError> {
        if !alpha.is_finite() || alpha < 0.0 {
            return Err(ModelError::InvalidAlpha { alpha });
        }
        Ok(Self {
            alpha,
            fitted: None,
        })
    }

    #[must_use]
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Fitted coefficients, one per feature.
    #[must_use]
    pub fn coefficients(&self) -> Option<&[f64]> {
        self.fitted.as_ref().map(|f| f.coefficients.as_slice())
    }

    #[must_use]
    pub fn intercept(&self) -> Option<f64> {
        self.fitted.as_ref().map(|f| f.intercept)
    }
}

/// Solve `a x = b` by Gaussian elimination with partial pivoting.
///
/// Returns `None` if a pivot falls below the relative tolerance.
fn solve(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Option<Vec<f64>> {
    let n = b.len();
    let scale = a
        .iter()
        .enumerate()
        .map(|(i, row)| row[i].abs())
        .fold(0.0f64, f64::max)
        .max(f64::MIN_POSITIVE);

    for col in 0..n {
        let pivot_row = (col..n).max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))?;
        if a[pivot_row][col].abs() <= PIVOT_TOLERANCE * scale {
            return None;
        }
        a.swap(col, pivot_row);
        b.swap(col, pivot_row);

        for row in (col + 1)..n {
            let factor = a[row][col] / a[col][col];
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = ((row + 1)..n).map(|k| a[row][k] * x[k]).sum();
        x[row] = (b[row] - tail) / a[row][row];
    }
    Some(x)
}

impl Regressor for LinearRegression {
    fn fit(&mut self, features: &[Vec<f64>], targets: &[f64]) -> Result<(), ModelError> {
        let n_features = validate(features, targets)?;
        let n = features.len() as f64;

        let x_mean: Vec<f64> = (0..n_features)
            .map(|j| features.iter().map(|row| row[j]).sum::<f64>() / n)
            .collect();
        let y_mean = targets.iter().sum::<f64>() / n;

        // Normal equations on centered data: (XᵀX + αI) w = Xᵀy.
        let mut xtx = vec![vec![0.0; n_features]; n_features];
        let mut xty = vec![0.0; n_features];
        for (row, &y) in features.iter().zip(targets) {
            let yc = y - y_mean;
            for i in 0..n_features {
                let xi = row[i] - x_mean[i];
                xty[i] += xi * yc;
                for j in i..n_features {
                    xtx[i][j] += xi * (row[j] - x_mean[j]);
                }
            }
        }
        for i in 0..n_features {
            for j in 0..i {
                xtx[i][j] = xtx[j][i];
            }
            xtx[i][i] += self.alpha;
        }

        let coefficients = match solve(xtx.clone(), xty.clone()) {
            Some(w) => w,
            None => {
                // Rank-deficient (e.g. a constant column): a tiny ridge drives
                // the unidentifiable coefficients to zero.
                let trace: f64 = (0..n_features).map(|i| xtx[i][i]).sum();
                let ridge = (1e-8 * trace / n_features as f64).max(1e-8);
                debug!(ridge, "normal equations singular, regularizing");
                for (i, row) in xtx.iter_mut().enumerate() {
                    row[i] += ridge;
                }
                solve(xtx, xty).ok_or(ModelError::SingularSystem)?
            }
        };

        let intercept = y_mean
            - coefficients
                .iter()
                .zip(&x_mean)
                .map(|(w, m)| w * m)
                .sum::<f64>();

        self.fitted = Some(Fitted {
            coefficients,
            intercept,
        });
        Ok(())
    }

    fn predict(&self, features: &[Vec<f64>]) -> Result<Vec<f64>, ModelError> {
        let fitted = self.fitted.as_ref().ok_or(ModelError::NotFitted {
            model: "LinearRegression",
        })?;
        validate_rows(features, Some(fitted.coefficients.len()))?;
        Ok(features
            .iter()
            .map(|row| {
                fitted.intercept
                    + row
                        .iter()
                        .zip(&fitted.coefficients)
                        .map(|(x, w)| x * w)
                        .sum::<f64>()
            })
            .collect())
    }
}
