//! k-nearest-neighbors regression.

use serde::{Deserialize, Serialize};

use crate::dataset::{validate, validate_rows};
use crate::error::ModelError;
use crate::regressor::Regressor;

/// Predicts the unweighted mean target of the `k` nearest training rows
/// (Euclidean distance, ties broken by training order).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KNeighborsRegressor {
    k: usize,
    features: Vec<Vec<f64>>,
    targets: Vec<f64>,
}

impl KNeighborsRegressor {
    /// Create an unfitted model using `k` neighbors.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidNeighborCount`] if `k` is zero.
    pub fn new(k: usize) -> Result<Self, ModelError> {
        if k == 0 {
            return Err(ModelError::InvalidNeighborCount { k, n_samples: 0 });
        }
        Ok(Self {
            k,
            features: Vec::new(),
            targets: Vec::new(),
        })
    }

    #[must_use]
    pub fn k(&self) -> usize {
        self.k
    }

    fn predict_row(&self, row: &[f64]) -> f64 {
        let mut distances: Vec<(f64, usize)> = self
            .features
            .iter()
            .enumerate()
            .map(|(i, train)| {
                let d2: f64 = train.iter().zip(row).map(|(a, b)| (a - b) * (a - b)).sum();
                (d2, i)
            })
            .collect();
        distances.select_nth_unstable_by(self.k - 1, |a, b| {
            a.0.total_cmp(&b.0).then(a.1.cmp(&b.1))
        });
        let sum: f64 = distances[..self.k].iter().map(|&(_, i)| self.targets[i]).sum();
        sum / self.k as f64
    }
}

impl Regressor for KNeighborsRegressor {
    fn fit(&mut self, features: &[Vec<f64>], targets: &[f64]) -> Result<(), ModelError> {
        validate(features, targets)?;
        if self.k > features.len() {
            return Err(ModelError::InvalidNeighborCount {
                k: self.k,
                n_samples: features.len(),
            });
        }
        self.features = features.to_vec();
        self.targets = targets.to_vec();
        Ok(())
    }

    fn predict(&self, features: &[Vec<f64>]) -> Result<Vec<f64>, ModelError> {
        let first = self.features.first().ok_or(ModelError::NotFitted {
            model: "KNeighborsRegressor",
        })?;
        validate_rows(features, Some(first.len()))?;
        Ok(features.iter().map(|row| self.predict_row(row)).collect())
    }
}
