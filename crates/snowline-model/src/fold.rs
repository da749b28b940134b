//! Single train/validate evaluation of one estimator.

use tracing::debug;

use crate::dataset::gather;
use crate::error::ModelError;
use crate::kfold::Fold;
use crate::metrics::FoldResult;
use crate::regressor::Regressor;

/// Rows and targets of one side of a split.
#[derive(Debug, Clone, Default)]
pub struct Partition {
    pub features: Vec<Vec<f64>>,
    pub targets: Vec<f64>,
}

impl Partition {
    /// Copy the rows at `indices` out of the full table.
    #[must_use]
    pub fn gather(features: &[Vec<f64>], targets: &[f64], indices: &[usize]) -> Self {
        let (features, targets) = gather(features, targets, indices);
        Self { features, targets }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

/// Materialized train and test partitions for one [`Fold`].
#[derive(Debug, Clone)]
pub struct FoldData {
    pub index: usize,
    pub train: Partition,
    pub test: Partition,
}

impl FoldData {
    #[must_use]
    pub fn from_fold(fold: &Fold, features: &[Vec<f64>], targets: &[f64]) -> Self {
        Self {
            index: fold.index,
            train: Partition::gather(features, targets, &fold.train),
            test: Partition::gather(features, targets, &fold.test),
        }
    }
}

/// Fits once on the training partition, predicts once on the test
/// partition, and scores the predictions.
pub struct FoldEvaluator;

impl FoldEvaluator {
    /// Evaluate `estimator` on one split.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ModelError::EmptyPartition`] | train or test partition is empty |
    /// | Other model errors | From `fit`, `predict`, or metric computation |
    pub fn evaluate<R: Regressor + ?Sized>(
        estimator: &mut R,
        train: &Partition,
        test: &Partition,
    ) -> Result<FoldResult, ModelError> {
        if train.is_empty() {
            return Err(ModelError::EmptyPartition { partition: "train" });
        }
        if test.is_empty() {
            return Err(ModelError::EmptyPartition { partition: "test" });
        }

        estimator.fit(&train.features, &train.targets)?;
        let predictions = estimator.predict(&test.features)?;
        let result = FoldResult::compute(&test.targets, &predictions)?;

        debug!(
            n_train = train.len(),
            n_test = test.len(),
            mae = result.mean_absolute_error,
            r2 = result.r_squared,
            "fold evaluated"
        );
        Ok(result)
    }
}
