//! The fit/predict contract every candidate model implements.

use crate::error::ModelError;

/// A scalar-output regression model.
///
/// `fit` mutates the model in place. Cross-validation clones a fresh
/// instance for every fold, so implementations must produce the same fitted
/// state from the same inputs regardless of prior `fit` calls.
pub trait Regressor {
    /// Train on `features[sample_idx][feature_idx]` and matching `targets`.
    ///
    /// # Errors
    ///
    /// Implementations return [`ModelError`] for invalid shapes or values.
    fn fit(&mut self, features: &[Vec<f64>], targets: &[f64]) -> Result<(), ModelError>;

    /// Predict one value per row.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::NotFitted`] before `fit`, or a shape error when
    /// the row width differs from the training data.
    fn predict(&self, features: &[Vec<f64>]) -> Result<Vec<f64>, ModelError>;
}

impl<R: Regressor + ?Sized> Regressor for Box<R> {
    fn fit(&mut self, features: &[Vec<f64>], targets: &[f64]) -> Result<(), ModelError> {
        (**self).fit(features, targets)
    }

    fn predict(&self, features: &[Vec<f64>]) -> Result<Vec<f64>, ModelError> {
        (**self).predict(features)
    }
}
