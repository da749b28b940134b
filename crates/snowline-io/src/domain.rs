//! Domain types for snowline-io.

use crate::IoError;

/// A validated experiment name for output file naming.
///
/// Must match `[a-zA-Z0-9_-]+`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExperimentName(String);

impl ExperimentName {
    /// Parse and validate an experiment name.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::InvalidExperimentName`] if the name is empty or
    /// contains characters outside `[a-zA-Z0-9_-]`.
    pub fn new(name: impl Into<String>) -> Result<Self, IoError> {
        let name = name.into();
        if name.is_empty()
            || !name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(IoError::InvalidExperimentName { name });
        }
        Ok(Self(name))
    }

    /// Return the experiment name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ExperimentName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Feature rows and labels selected from a CSV table.
///
/// Produced by [`TrainingTableReader`](crate::TrainingTableReader).
/// `features[i]` corresponds to `targets[i]`; columns follow the order of
/// `feature_names`.
#[derive(Debug, Clone)]
pub struct TrainingTable {
    feature_names: Vec<String>,
    label: String,
    features: Vec<Vec<f64>>,
    targets: Vec<f64>,
}

impl TrainingTable {
    pub(crate) fn new(
        feature_names: Vec<String>,
        label: String,
        features: Vec<Vec<f64>>,
        targets: Vec<f64>,
    ) -> Self {
        Self {
            feature_names,
            label,
            features,
            targets,
        }
    }

    #[must_use]
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Name of the label column.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Return the feature matrix (row-major).
    #[must_use]
    pub fn features(&self) -> &[Vec<f64>] {
        &self.features
    }

    #[must_use]
    pub fn targets(&self) -> &[f64] {
        &self.targets
    }

    #[must_use]
    pub fn n_samples(&self) -> usize {
        self.targets.len()
    }

    #[must_use]
    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }
}
