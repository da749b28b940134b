//! Shuffled k-fold partitioning of sample indices.

use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use crate::error::ModelError;

/// One train/test split of the sample indices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fold {
    /// Zero-based fold number.
    pub index: usize,
    /// Training indices, ascending.
    pub train: Vec<usize>,
    /// Held-out indices, ascending.
    pub test: Vec<usize>,
}

/// Shuffled k-fold splitter.
///
/// Indices are shuffled once with a seeded `ChaCha8Rng` and cut into
/// `n_folds` contiguous chunks; the first `n_samples % n_folds` chunks hold
/// one extra sample.
///
/// # Defaults
///
/// | Parameter | Default |
/// |-----------|---------|
/// | `seed`    | 1       |
#[derive(Debug, Clone)]
pub struct KFold {
    n_folds: usize,
    seed: u64,
}

impl KFold {
    /// Create a splitter with `n_folds` folds.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidFoldCount`] if `n_folds` < 2.
    pub fn new(n_folds: usize) -> Result<Self, ModelError> {
        if n_folds < 2 {
            return Err(ModelError::InvalidFoldCount { n_folds });
        }
        Ok(Self { n_folds, seed: 1 })
    }

    /// Set the random seed for index shuffling.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    #[must_use]
    pub fn n_folds(&self) -> usize {
        self.n_folds
    }

    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Partition `0..n_samples` into folds.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::TooFewSamplesForFolds`] if `n_samples < n_folds`.
    pub fn split(&self, n_samples: usize) -> Result<Vec<Fold>, ModelError> {
        if n_samples < self.n_folds {
            return Err(ModelError::TooFewSamplesForFolds {
                n_samples,
                n_folds: self.n_folds,
            });
        }

        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let mut indices: Vec<usize> = (0..n_samples).collect();
        indices.shuffle(&mut rng);

        let base = n_samples / self.n_folds;
        let extra = n_samples % self.n_folds;

        let mut folds = Vec::with_capacity(self.n_folds);
        let mut start = 0;
        for index in 0..self.n_folds {
            let size = base + usize::from(index < extra);
            let mut in_test = vec![false; n_samples];
            let mut test = indices[start..start + size].to_vec();
            test.sort_unstable();
            for &i in &test {
                in_test[i] = true;
            }
            let train = (0..n_samples).filter(|&i| !in_test[i]).collect();
            folds.push(Fold { index, train, test });
            start += size;
        }
        Ok(folds)
    }
}
