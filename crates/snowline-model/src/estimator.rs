//! Closed set of built-in regressors, serializable as one type.

use serde::{Deserialize, Serialize};

use crate::baseline::MeanRegressor;
use crate::error::ModelError;
use crate::knn::KNeighborsRegressor;
use crate::linear::LinearRegression;
use crate::regressor::Regressor;

/// Any built-in regressor.
///
/// Lets a heterogeneous candidate list share one concrete type so the
/// selected model can be persisted and reloaded without knowing its family.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Estimator {
    Linear(LinearRegression),
    KNeighbors(KNeighborsRegressor),
    Mean(MeanRegressor),
}

impl Estimator {
    /// Short name of the model family.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Linear(m) if m.alpha() > 0.0 => "ridge",
            Self::Linear(_) => "linear",
            Self::KNeighbors(_) => "k-neighbors",
            Self::Mean(_) => "mean",
        }
    }
}

impl Regressor for Estimator {
    fn fit(&mut self, features: &[Vec<f64>], targets: &[f64]) -> Result<(), ModelError> {
        match self {
            Self::Linear(m) => m.fit(features, targets),
            Self::KNeighbors(m) => m.fit(features, targets),
            Self::Mean(m) => m.fit(features, targets),
        }
    }

    fn predict(&self, features: &[Vec<f64>]) -> Result<Vec<f64>, ModelError> {
        match self {
            Self::Linear(m) => m.predict(features),
            Self::KNeighbors(m) => m.predict(features),
            Self::Mean(m) => m.predict(features),
        }
    }
}

impl From<LinearRegression> for Estimator {
    fn from(m: LinearRegression) -> Self {
        Self::Linear(m)
    }
}

impl From<KNeighborsRegressor> for Estimator {
    fn from(m: KNeighborsRegressor) -> Self {
        Self::KNeighbors(m)
    }
}

impl From<MeanRegressor> for Estimator {
    fn from(m: MeanRegressor) -> Self {
        Self::Mean(m)
    }
}
