//! Cross-validated selection of the best regressor among candidates.

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::dataset::validate;
use crate::error::ModelError;
use crate::fold::{FoldData, FoldEvaluator};
use crate::kfold::{Fold, KFold};
use crate::metrics::FoldResult;
use crate::persist::{Artifact, PersistOptions, PersistReport, write_csv};
use crate::regressor::Regressor;
use crate::serialize::save_model;

/// Column headers of the performance table.
pub const PERFORMANCE_HEADER: [&str; 6] = [
    "Model",
    "Mean absolute error",
    "Mean squared error",
    "Mean absolute percentage error",
    "Maximum error",
    "R^2",
];

/// A named, unfitted estimator competing in selection.
#[derive(Debug, Clone)]
pub struct ModelCandidate<R> {
    pub name: String,
    pub estimator: R,
}

impl<R> ModelCandidate<R> {
    pub fn new(name: impl Into<String>, estimator: R) -> Self {
        Self {
            name: name.into(),
            estimator,
        }
    }
}

/// Cross-validated scores of one candidate.
#[derive(Debug, Clone, Serialize)]
pub struct ModelPerformance {
    /// Position in the candidate list.
    pub index: usize,
    pub name: String,
    /// One result per fold, in fold order.
    pub folds: Vec<FoldResult>,
    /// Per-metric mean over `folds`.
    pub mean: FoldResult,
}

/// A candidate whose evaluation aborted on its first failing fold.
#[derive(Debug)]
pub struct CandidateFailure {
    pub index: usize,
    pub name: String,
    pub error: ModelError,
}

/// Outcome of [`CrossValidationSelector::select`].
#[derive(Debug)]
pub struct Selection<R> {
    /// Position of the winner in the candidate list.
    pub best_index: usize,
    pub best_name: String,
    /// The winner, refit on every row.
    pub model: R,
    /// Successful candidates, in input order.
    pub performances: Vec<ModelPerformance>,
    pub failures: Vec<CandidateFailure>,
    /// The partition every candidate was scored on.
    pub folds: Vec<Fold>,
}

impl<R> Selection<R> {
    /// Performance of the selected model.
    #[must_use]
    pub fn best(&self) -> Option<&ModelPerformance> {
        self.performances.iter().find(|p| p.index == self.best_index)
    }

    /// Performances sorted by ascending mean absolute error. Ties keep input order.
    #[must_use]
    pub fn ranked(&self) -> Vec<&ModelPerformance> {
        let mut ranked: Vec<&ModelPerformance> = self.performances.iter().collect();
        ranked.sort_by(|a, b| a.mean.mean_absolute_error.total_cmp(&b.mean.mean_absolute_error));
        ranked
    }

    /// Write the ranked performance table as CSV.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::WriteTable`] if the file cannot be written.
    pub fn write_performances(&self, path: &std::path::Path) -> Result<(), ModelError> {
        let header: Vec<String> = PERFORMANCE_HEADER.iter().map(ToString::to_string).collect();
        let rows = self.ranked().into_iter().map(|p| {
            let m = &p.mean;
            vec![
                p.name.clone(),
                m.mean_absolute_error.to_string(),
                m.mean_squared_error.to_string(),
                m.mean_absolute_percentage_error.to_string(),
                m.max_error.to_string(),
                m.r_squared.to_string(),
            ]
        });
        write_csv(path, &header, rows)
    }
}

impl<R: Serialize> Selection<R> {
    /// Persist the refit model and the performance table as configured.
    ///
    /// Never fails: every problem is recorded in the returned report.
    pub fn persist(&self, options: &PersistOptions) -> PersistReport {
        let mut report = PersistReport::default();
        report.outcomes.push(options.persist(Artifact::Model, |path| {
            save_model(&self.model, &self.best_name, path)
        }));
        report.outcomes.push(
            options.persist(Artifact::Performances, |path| self.write_performances(path)),
        );
        report
    }
}

/// K-fold model selection configuration.
///
/// Construct via [`CrossValidationSelector::new`], then chain `with_seed` if desired.
///
/// # Defaults
///
/// | Parameter | Default |
/// |-----------|---------|
/// | `seed`    | 1       |
#[derive(Debug, Clone)]
pub struct CrossValidationSelector {
    kfold: KFold,
}

impl CrossValidationSelector {
    /// Create a selector using `n_folds` folds.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidFoldCount`] if `n_folds` < 2.
    pub fn new(n_folds: usize) -> Result<Self, ModelError> {
        Ok(Self {
            kfold: KFold::new(n_folds)?,
        })
    }

    /// Set the random seed for fold shuffling.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.kfold = self.kfold.with_seed(seed);
        self
    }

    #[must_use]
    pub fn n_folds(&self) -> usize {
        self.kfold.n_folds()
    }

    #[must_use]
    pub fn seed(&self) -> u64 {
        self.kfold.seed()
    }

    /// Score every candidate on one shared K-fold partition, pick the lowest
    /// mean absolute error, and refit it on all rows.
    ///
    /// Every `{candidate × fold}` pair is fit on its own clone of the
    /// candidate's estimator, in parallel. A candidate whose fold fails is
    /// dropped from the ranking and reported in [`Selection::failures`].
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ModelError::NoCandidates`] | `candidates` is empty |
    /// | [`ModelError::EmptyDataset`] etc. | Malformed feature/target table |
    /// | [`ModelError::TooFewSamplesForFolds`] | More folds than samples |
    /// | [`ModelError::AllCandidatesFailed`] | No candidate completed every fold |
    /// | Other model errors | From the final refit |
    #[instrument(skip_all, fields(
        n_candidates = candidates.len(),
        n_folds = self.n_folds(),
        n_samples = features.len(),
    ))]
    pub fn select<R>(
        &self,
        candidates: Vec<ModelCandidate<R>>,
        features: &[Vec<f64>],
        targets: &[f64],
    ) -> Result<Selection<R>, ModelError>
    where
        R: Regressor + Clone + Send + Sync,
    {
        if candidates.is_empty() {
            return Err(ModelError::NoCandidates);
        }
        validate(features, targets)?;
        let folds = self.kfold.split(features.len())?;
        let fold_data: Vec<FoldData> = folds
            .iter()
            .map(|fold| FoldData::from_fold(fold, features, targets))
            .collect();

        let outcomes: Vec<Result<ModelPerformance, CandidateFailure>> = candidates
            .par_iter()
            .enumerate()
            .map(|(index, candidate)| evaluate_candidate(index, candidate, &fold_data))
            .collect();

        let mut performances = Vec::with_capacity(outcomes.len());
        let mut failures = Vec::new();
        for outcome in outcomes {
            match outcome {
                Ok(performance) => performances.push(performance),
                Err(failure) => failures.push(failure),
            }
        }

        // min_by returns the last of equal elements; fold keeps the first.
        let mae = |p: &ModelPerformance| p.mean.mean_absolute_error;
        let best = performances
            .iter()
            .fold(None::<&ModelPerformance>, |best, p| match best {
                Some(b) if mae(b).total_cmp(&mae(p)).is_le() => Some(b),
                _ => Some(p),
            })
            .ok_or(ModelError::AllCandidatesFailed {
                n_candidates: candidates.len(),
            })?;
        let best_index = best.index;

        let ModelCandidate {
            name: best_name,
            estimator: mut model,
        } = candidates
            .into_iter()
            .nth(best_index)
            .ok_or(ModelError::NoCandidates)?;
        model.fit(features, targets)?;

        info!(
            model = %best_name,
            mae = best.mean.mean_absolute_error,
            n_failed = failures.len(),
            "selected model refit on all rows"
        );

        Ok(Selection {
            best_index,
            best_name,
            model,
            performances,
            failures,
            folds,
        })
    }
}

fn evaluate_candidate<R>(
    index: usize,
    candidate: &ModelCandidate<R>,
    fold_data: &[FoldData],
) -> Result<ModelPerformance, CandidateFailure>
where
    R: Regressor + Clone + Send + Sync,
{
    let folds: Result<Vec<FoldResult>, ModelError> = fold_data
        .par_iter()
        .map(|data| {
            let mut estimator = candidate.estimator.clone();
            let result = FoldEvaluator::evaluate(&mut estimator, &data.train, &data.test)?;
            debug!(model = %candidate.name, fold = data.index, mae = result.mean_absolute_error, "fold done");
            Ok(result)
        })
        .collect();

    let failure = |error| CandidateFailure {
        index,
        name: candidate.name.clone(),
        error,
    };
    let folds = match folds {
        Ok(folds) => folds,
        Err(error) => {
            warn!(model = %candidate.name, error = %error, "candidate evaluation aborted");
            return Err(failure(error));
        }
    };
    let mean = FoldResult::mean(&folds).ok_or_else(|| {
        failure(ModelError::EmptyPartition { partition: "test" })
    })?;

    info!(model = %candidate.name, mae = mean.mean_absolute_error, "candidate evaluated");
    Ok(ModelPerformance {
        index,
        name: candidate.name.clone(),
        folds,
        mean,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::baseline::MeanRegressor;

    /// Predicts a fixed value and records the size of every fit.
    #[derive(Debug, Clone)]
    struct Recording {
        value: f64,
        fits: Arc<Mutex<Vec<usize>>>,
        fail: bool,
    }

    impl Recording {
        fn new(value: f64) -> Self {
            Self {
                value,
                fits: Arc::new(Mutex::new(Vec::new())),
                fail: false,
            }
        }
    }

    impl Regressor for Recording {
        fn fit(&mut self, features: &[Vec<f64>], _targets: &[f64]) -> Result<(), ModelError> {
            if self.fail {
                return Err(ModelError::SingularSystem);
            }
            self.fits.lock().unwrap().push(features.len());
            Ok(())
        }

        fn predict(&self, features: &[Vec<f64>]) -> Result<Vec<f64>, ModelError> {
            Ok(vec![self.value; features.len()])
        }
    }

    fn table(n: usize) -> (Vec<Vec<f64>>, Vec<f64>) {
        let features = (0..n).map(|i| vec![i as f64]).collect();
        let targets = vec![1.0; n];
        (features, targets)
    }

    #[test]
    fn winner_refit_once_on_all_rows() {
        let (features, targets) = table(100);
        let best = Recording::new(1.0);
        let fits = Arc::clone(&best.fits);
        let candidates = vec![
            ModelCandidate::new("far", Recording::new(5.0)),
            ModelCandidate::new("exact", best),
        ];
        let selection = CrossValidationSelector::new(5)
            .unwrap()
            .select(candidates, &features, &targets)
            .unwrap();

        assert_eq!(selection.best_index, 1);
        assert_eq!(selection.best_name, "exact");
        let mut fits = fits.lock().unwrap().clone();
        assert_eq!(fits.len(), 6);
        assert_eq!(fits.iter().filter(|&&n| n == 100).count(), 1);
        fits.retain(|&n| n != 100);
        assert!(fits.iter().all(|&n| n == 80));
    }

    #[test]
    fn ties_go_to_the_earlier_candidate() {
        let (features, targets) = table(20);
        let candidates = vec![
            ModelCandidate::new("a", Recording::new(3.0)),
            ModelCandidate::new("b", Recording::new(2.0)),
            ModelCandidate::new("c", Recording::new(2.0)),
        ];
        let selection = CrossValidationSelector::new(4)
            .unwrap()
            .select(candidates, &features, &targets)
            .unwrap();
        assert_eq!(selection.best_name, "b");
        let ranked: Vec<&str> = selection.ranked().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(ranked, vec!["b", "c", "a"]);
    }

    #[test]
    fn failing_candidate_is_reported_not_fatal() {
        let (features, targets) = table(20);
        let mut broken = Recording::new(1.0);
        broken.fail = true;
        let candidates = vec![
            ModelCandidate::new("broken", broken),
            ModelCandidate::new("ok", Recording::new(2.0)),
        ];
        let selection = CrossValidationSelector::new(4)
            .unwrap()
            .select(candidates, &features, &targets)
            .unwrap();
        assert_eq!(selection.best_name, "ok");
        assert_eq!(selection.failures.len(), 1);
        assert_eq!(selection.failures[0].index, 0);
        assert_eq!(selection.performances.len(), 1);
    }

    #[test]
    fn all_failing_is_an_error() {
        let (features, targets) = table(10);
        let mut broken = Recording::new(1.0);
        broken.fail = true;
        let err = CrossValidationSelector::new(2)
            .unwrap()
            .select(vec![ModelCandidate::new("x", broken)], &features, &targets)
            .unwrap_err();
        assert!(matches!(err, ModelError::AllCandidatesFailed { n_candidates: 1 }));
    }

    #[test]
    fn empty_candidate_list_rejected() {
        let (features, targets) = table(10);
        let err = CrossValidationSelector::new(2)
            .unwrap()
            .select(Vec::<ModelCandidate<MeanRegressor>>::new(), &features, &targets)
            .unwrap_err();
        assert!(matches!(err, ModelError::NoCandidates));
    }

    #[test]
    fn more_folds_than_rows_rejected() {
        let (features, targets) = table(3);
        let err = CrossValidationSelector::new(5)
            .unwrap()
            .select(
                vec![ModelCandidate::new("mean", MeanRegressor::new())],
                &features,
                &targets,
            )
            .unwrap_err();
        assert!(matches!(err, ModelError::TooFewSamplesForFolds { .. }));
    }

    #[test]
    fn folds_partition_rows_not_columns() {
        let features: Vec<Vec<f64>> = (0..100).map(|i| vec![i as f64; 10]).collect();
        let targets = vec![1.0; 100];
        let selection = CrossValidationSelector::new(5)
            .unwrap()
            .select(
                vec![ModelCandidate::new("mean", MeanRegressor::new())],
                &features,
                &targets,
            )
            .unwrap();

        let mut covered: Vec<usize> = selection
            .folds
            .iter()
            .flat_map(|f| f.test.iter().copied())
            .collect();
        covered.sort_unstable();
        assert_eq!(covered, (0..100).collect::<Vec<_>>());
    }

    #[test]
    fn nan_predictions_never_win() {
        let (features, targets) = table(20);
        let candidates = vec![
            ModelCandidate::new("good", Recording::new(1.0)),
            ModelCandidate::new("nan", Recording::new(f64::NAN)),
        ];
        let selection = CrossValidationSelector::new(4)
            .unwrap()
            .select(candidates, &features, &targets)
            .unwrap();
        assert_eq!(selection.best_name, "good");
        assert_eq!(selection.failures.len(), 1);
        assert_eq!(selection.failures[0].name, "nan");
        assert!(matches!(
            selection.failures[0].error,
            ModelError::NonFinitePrediction { .. }
        ));
    }

    #[test]
    fn per_fold_results_kept_in_fold_order() {
        let (features, targets) = table(12);
        let selection = CrossValidationSelector::new(3)
            .unwrap()
            .select(
                vec![ModelCandidate::new("mean", MeanRegressor::new())],
                &features,
                &targets,
            )
            .unwrap();
        assert_eq!(selection.folds.len(), 3);
        assert_eq!(selection.performances[0].folds.len(), 3);
        assert_eq!(selection.best().unwrap().mean.mean_absolute_error, 0.0);
    }
}
