use std::path::PathBuf;

/// Errors from regressor training, cross-validation, permutation importance,
/// and model persistence.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// Returned when n_folds is less than 2.
    #[error("n_folds must be at least 2, got {n_folds}")]
    InvalidFoldCount {
        /// The invalid n_folds value provided.
        n_folds: usize,
    },

    /// Returned when there are fewer samples than folds.
    #[error("cannot split {n_samples} samples into {n_folds} folds")]
    TooFewSamplesForFolds {
        /// Number of samples in the dataset.
        n_samples: usize,
        /// The requested number of folds.
        n_folds: usize,
    },

    /// Returned when n_repeats is zero.
    #[error("n_repeats must be at least 1, got {n_repeats}")]
    InvalidRepeatCount {
        /// The invalid n_repeats value provided.
        n_repeats: usize,
    },

    /// Returned when the candidate list is empty.
    #[error("no candidate models were supplied")]
    NoCandidates,

    /// Returned when every candidate failed during cross-validation.
    #[error("all {n_candidates} candidate models failed cross-validation")]
    AllCandidatesFailed {
        /// Number of candidates that were evaluated.
        n_candidates: usize,
    },

    /// Returned when the dataset has zero samples.
    #[error("dataset has zero samples")]
    EmptyDataset,

    /// Returned when the dataset has zero feature columns.
    #[error("dataset has zero feature columns")]
    ZeroFeatures,

    /// Returned when a train or test partition is empty.
    #[error("{partition} partition is empty")]
    EmptyPartition {
        /// Which partition was empty ("train" or "test").
        partition: &'static str,
    },

    /// Returned when a sample has a different number of features than expected.
    #[error("sample {sample_index} has {got} features, expected {expected}")]
    FeatureCountMismatch {
        /// The expected number of features.
        expected: usize,
        /// The actual number of features in the sample.
        got: usize,
        /// The zero-based index of the offending sample.
        sample_index: usize,
    },

    /// Returned when the number of targets differs from the number of samples.
    #[error("{n_targets} targets supplied for {n_samples} samples")]
    TargetCountMismatch {
        /// Number of feature rows.
        n_samples: usize,
        /// Number of target values.
        n_targets: usize,
    },

    /// Returned when the number of feature names differs from the number of columns.
    #[error("{n_names} feature names supplied for {n_features} feature columns")]
    FeatureNameCountMismatch {
        /// Number of feature columns.
        n_features: usize,
        /// Number of names supplied.
        n_names: usize,
    },

    /// Returned when a feature value is NaN or infinite.
    #[error("non-finite value at sample {sample_index}, feature {feature_index}")]
    NonFiniteValue {
        /// The zero-based index of the offending sample.
        sample_index: usize,
        /// The zero-based index of the offending feature column.
        feature_index: usize,
    },

    /// Returned when a target value is NaN or infinite.
    #[error("non-finite target at sample {sample_index}")]
    NonFiniteTarget {
        /// The zero-based index of the offending sample.
        sample_index: usize,
    },

    /// Returned when a prediction input has a different width than the training data.
    #[error("prediction input has {got} features, expected {expected}")]
    PredictionFeatureMismatch {
        /// The expected number of features.
        expected: usize,
        /// The actual number of features in the prediction input.
        got: usize,
    },

    /// Returned when predictions and true values differ in length.
    #[error("{got} predictions for {expected} true values")]
    PredictionLengthMismatch {
        /// Number of true values.
        expected: usize,
        /// Number of predictions.
        got: usize,
    },

    /// Returned when a model predicts NaN or infinity.
    #[error("non-finite prediction for sample {sample_index}")]
    NonFinitePrediction {
        /// The zero-based index of the offending sample.
        sample_index: usize,
    },

    /// Returned when permuting a feature produced a non-finite score.
    #[error("non-finite score after permuting feature {feature_index}")]
    NonFiniteScore {
        /// The zero-based index of the permuted feature column.
        feature_index: usize,
    },

    /// Returned when `predict` is called before `fit`.
    #[error("{model} has not been fitted")]
    NotFitted {
        /// Display name of the model type.
        model: &'static str,
    },

    /// Returned when the normal equations cannot be solved even after regularization.
    #[error("least-squares system is singular")]
    SingularSystem,

    /// Returned when the ridge penalty is negative or not finite.
    #[error("ridge alpha must be finite and non-negative, got {alpha}")]
    InvalidAlpha {
        /// The invalid alpha value.
        alpha: f64,
    },

    /// Returned when k is zero or exceeds the number of training samples.
    #[error("k = {k} neighbors is invalid for {n_samples} training samples")]
    InvalidNeighborCount {
        /// The requested number of neighbors.
        k: usize,
        /// Number of training samples (0 when checked at construction).
        n_samples: usize,
    },

    /// Returned when model serialization fails.
    #[error("failed to serialize model")]
    SerializeModel {
        /// The underlying bincode error.
        source: Box<bincode::ErrorKind>,
    },

    /// Returned when model deserialization fails.
    #[error("failed to deserialize model from {path}")]
    DeserializeModel {
        /// Path to the model file that could not be deserialized.
        path: PathBuf,
        /// The underlying bincode error.
        source: Box<bincode::ErrorKind>,
    },

    /// Returned when writing the model file fails.
    #[error("failed to write model to {path}")]
    WriteModel {
        /// Path to the file that could not be written.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when reading the model file fails.
    #[error("failed to read model from {path}")]
    ReadModel {
        /// Path to the file that could not be read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when loading a model with an incompatible format version.
    #[error("incompatible model version in {path}: expected {expected}, found {found}")]
    IncompatibleModelVersion {
        /// The model format version this build expects.
        expected: u32,
        /// The model format version found in the file.
        found: u32,
        /// Path to the model file with the incompatible version.
        path: PathBuf,
    },

    /// Returned when a delimited table cannot be written.
    #[error("failed to write table to {path}")]
    WriteTable {
        /// Path to the file that could not be written.
        path: PathBuf,
        /// The underlying CSV error.
        source: csv::Error,
    },
}
