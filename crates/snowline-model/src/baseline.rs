//! Constant-mean baseline regressor.

use serde::{Deserialize, Serialize};

use crate::dataset::{validate, validate_rows};
use crate::error::ModelError;
use crate::regressor::Regressor;

/// Predicts the mean training target for every row.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MeanRegressor {
    fitted: Option<Fitted>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Fitted {
    mean: f64,
    n_features: usize,
}

impl MeanRegressor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The fitted mean, if trained.
    #[must_use]
    pub fn mean(&self) -> Option<f64> {
        self.fitted.as_ref().map(|f| f.mean)
    }
}

impl Regressor for MeanRegressor {
    fn fit(&mut self, features: &[Vec<f64>], targets: &[f64]) -> Result<(), ModelError> {
        let n_features = validate(features, targets)?;
        let mean = targets.iter().sum::<f64>() / targets.len() as f64;
        self.fitted = Some(Fitted { mean, n_features });
        Ok(())
    }

    fn predict(&self, features: &[Vec<f64>]) -> Result<Vec<f64>, ModelError> {
        let fitted = self.fitted.as_ref().ok_or(ModelError::NotFitted {
            model: "MeanRegressor",
        })?;
        validate_rows(features, Some(fitted.n_features))?;
        Ok(vec![fitted.mean; features.len()])
    }
}
