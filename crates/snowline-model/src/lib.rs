//! Regression model selection: k-fold evaluation, best-model refit, and
//! permutation feature importance.
//!
//! Provides a small set of regressors behind the [`Regressor`] trait,
//! scikit-learn compatible regression metrics, a parallel cross-validated
//! selector, permutation importance with box-plot summaries, and optional
//! persistence of the selected model and result tables.

mod baseline;
mod dataset;
mod error;
mod estimator;
mod fold;
mod kfold;
mod knn;
mod linear;
mod metrics;
mod perm_importance;
mod persist;
mod regressor;
mod selection;
mod serialize;
mod summary;

pub use baseline::MeanRegressor;
pub use error::ModelError;
pub use estimator::Estimator;
pub use fold::{FoldData, FoldEvaluator, Partition};
pub use kfold::{Fold, KFold};
pub use knn::KNeighborsRegressor;
pub use linear::LinearRegression;
pub use metrics::{FoldResult, r2_score};
pub use perm_importance::{FeatureImportance, ImportanceResult, PermutationImportance};
pub use persist::{Artifact, PersistOptions, PersistOutcome, PersistReport, SkipReason};
pub use regressor::Regressor;
pub use selection::{
    CandidateFailure, CrossValidationSelector, ModelCandidate, ModelPerformance,
    PERFORMANCE_HEADER, Selection,
};
pub use serialize::{SavedModel, load_model, save_model};
pub use summary::DistributionSummary;
