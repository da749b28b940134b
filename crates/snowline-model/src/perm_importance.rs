//! Permutation feature importance for a fitted regressor.

use std::path::Path;

use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::dataset::validate;
use crate::error::ModelError;
use crate::metrics::r2_score;
use crate::persist::{Artifact, PersistOptions, PersistReport, write_csv};
use crate::regressor::Regressor;
use crate::summary::DistributionSummary;

/// Permutation importance configuration.
///
/// Construct via [`PermutationImportance::new`], then chain `with_seed` if desired.
///
/// # Defaults
///
/// | Parameter | Default |
/// |-----------|---------|
/// | `seed`    | 42      |
#[derive(Debug, Clone)]
pub struct PermutationImportance {
    n_repeats: usize,
    seed: u64,
}

/// Score degradations of one feature.
#[derive(Debug, Clone, Serialize)]
pub struct FeatureImportance {
    pub name: String,
    /// Column index in the feature table.
    pub index: usize,
    /// `baseline − permuted` R², one per repeat.
    pub samples: Vec<f64>,
    pub summary: DistributionSummary,
}

/// Output of [`PermutationImportance::evaluate`].
#[derive(Debug, Clone, Serialize)]
pub struct ImportanceResult {
    /// R² of the unpermuted table.
    pub baseline_score: f64,
    /// One entry per feature, in column order.
    pub features: Vec<FeatureImportance>,
}

impl ImportanceResult {
    /// Features sorted by descending median degradation.
    #[must_use]
    pub fn ranked(&self) -> Vec<&FeatureImportance> {
        let mut ranked: Vec<&FeatureImportance> = self.features.iter().collect();
        ranked.sort_by(|a, b| b.summary.median.total_cmp(&a.summary.median));
        ranked
    }

    /// Write one column per feature and one row per repeat.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::WriteTable`] if the file cannot be written.
    pub fn write_csv(&self, path: &Path) -> Result<(), ModelError> {
        let header: Vec<String> = self.features.iter().map(|f| f.name.clone()).collect();
        let n_repeats = self.features.first().map_or(0, |f| f.samples.len());
        let rows = (0..n_repeats).map(|repeat| {
            self.features
                .iter()
                .map(|f| f.samples[repeat].to_string())
                .collect()
        });
        write_csv(path, &header, rows)
    }

    /// Persist the importance table as configured. Never fails.
    pub fn persist(&self, options: &PersistOptions) -> PersistReport {
        PersistReport {
            outcomes: vec![options.persist(Artifact::Importances, |path| self.write_csv(path))],
        }
    }
}

impl PermutationImportance {
    /// Create a config that permutes each feature `n_repeats` times.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidRepeatCount`] if `n_repeats` is zero.
    pub fn new(n_repeats: usize) -> Result<Self, ModelError> {
        if n_repeats == 0 {
            return Err(ModelError::InvalidRepeatCount { n_repeats });
        }
        Ok(Self {
            n_repeats,
            seed: 42,
        })
    }

    /// Set the base seed. Feature `i` shuffles with a stream seeded `seed + i`.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    #[must_use]
    pub fn n_repeats(&self) -> usize {
        self.n_repeats
    }

    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Measure how much R² drops when each feature column is shuffled.
    ///
    /// The model is only read. Features are processed in parallel; results
    /// do not depend on the thread count.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ModelError::EmptyDataset`] etc. | Malformed feature/target table |
    /// | [`ModelError::FeatureNameCountMismatch`] | Names don't match columns |
    /// | [`ModelError::NonFiniteScore`] | A permuted prediction scored NaN |
    /// | Other model errors | From `predict` |
    #[instrument(skip_all, fields(
        n_repeats = self.n_repeats,
        n_samples = features.len(),
        n_features = feature_names.len(),
    ))]
    pub fn evaluate<R: Regressor + Sync + ?Sized>(
        &self,
        model: &R,
        features: &[Vec<f64>],
        targets: &[f64],
        feature_names: &[String],
    ) -> Result<ImportanceResult, ModelError> {
        let n_features = validate(features, targets)?;
        if feature_names.len() != n_features {
            return Err(ModelError::FeatureNameCountMismatch {
                n_features,
                n_names: feature_names.len(),
            });
        }

        let baseline_predictions = model.predict(features)?;
        let baseline_score = r2_score(targets, &baseline_predictions);
        debug!(baseline_score, "baseline scored");

        let features_out = (0..n_features)
            .into_par_iter()
            .map(|feature_index| {
                let samples =
                    self.permute_feature(model, features, targets, baseline_score, feature_index)?;
                let summary = DistributionSummary::from_values(&samples)
                    .ok_or(ModelError::NonFiniteScore { feature_index })?;
                Ok(FeatureImportance {
                    name: feature_names[feature_index].clone(),
                    index: feature_index,
                    samples,
                    summary,
                })
            })
            .collect::<Result<Vec<_>, ModelError>>()?;

        let result = ImportanceResult {
            baseline_score,
            features: features_out,
        };
        if let Some(top) = result.ranked().first() {
            info!(
                baseline_score,
                top_feature = %top.name,
                top_median = top.summary.median,
                "permutation importance complete"
            );
        }
        Ok(result)
    }

    fn permute_feature<R: Regressor + ?Sized>(
        &self,
        model: &R,
        features: &[Vec<f64>],
        targets: &[f64],
        baseline_score: f64,
        feature_index: usize,
    ) -> Result<Vec<f64>, ModelError> {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed.wrapping_add(feature_index as u64));
        let mut column: Vec<f64> = features.iter().map(|row| row[feature_index]).collect();
        let mut permuted = features.to_vec();

        let mut samples = Vec::with_capacity(self.n_repeats);
        for _ in 0..self.n_repeats {
            column.shuffle(&mut rng);
            for (row, &value) in permuted.iter_mut().zip(&column) {
                row[feature_index] = value;
            }
            let predictions = model.predict(&permuted)?;
            samples.push(baseline_score - r2_score(targets, &predictions));
        }
        Ok(samples)
    }
}
