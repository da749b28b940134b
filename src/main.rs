use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{info, warn};

use snowline_io::{ExperimentName, IoError, ResultWriter, TrainingTableReader, load_raster};
use snowline_model::{
    Artifact, CrossValidationSelector, Estimator, KNeighborsRegressor, LinearRegression, MeanRegressor,
    ModelCandidate, PermutationImportance, PersistOptions, PersistOutcome, PersistReport, load_model,
};
use snowline_raster::{BoundReport, Estimate, HypsometricIndex, SlaBoundEstimator, hypsometric_index};

#[derive(Parser)]
#[command(name = "snowline")]
#[command(about = "Snowline-altitude uncertainty bounds and cross-validated snowline model selection")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// RNG seed for fold shuffling and permutations (component defaults if unset)
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Enable verbose (debug-level) logging
    #[arg(long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(long, global = true)]
    quiet: bool,

    /// Number of threads for parallel computation (defaults to all cores)
    #[arg(long, global = true)]
    threads: Option<usize>,
}

#[derive(Subcommand)]
enum Command {
    /// Estimate snowline altitude bounds from a DEM and a snow-cover mask
    Bounds {
        /// Path to the DEM (ESRI ASCII grid)
        #[arg(long)]
        dem: PathBuf,

        /// Path to the snow-cover mask (ESRI ASCII grid, 0 = free, 1 = snow)
        #[arg(long)]
        snow: PathBuf,

        /// Accumulation-area ratio in [0, 1]
        #[arg(long)]
        aar: f64,

        /// Snowline elevation threshold
        #[arg(long)]
        threshold: f64,

        /// Experiment name for output files (must match [a-zA-Z0-9_-]+)
        #[arg(long, default_value = "snowline")]
        experiment: String,

        /// Output directory for result files (nothing written if unset)
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },

    /// Select the best regressor for a label by k-fold cross-validation
    Select {
        /// Path to the training CSV file
        #[arg(long)]
        data: PathBuf,

        /// Feature columns, comma-separated
        #[arg(long, value_delimiter = ',', required = true)]
        features: Vec<String>,

        /// Label column
        #[arg(long)]
        label: String,

        /// Number of cross-validation folds
        #[arg(long, default_value_t = 5)]
        folds: usize,

        /// Experiment name for output files
        #[arg(long, default_value = "snowline")]
        experiment: String,

        /// Output directory for the model and result files (nothing written if unset)
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Also write the performance table as CSV
        #[arg(long, default_value_t = false)]
        save_performances: bool,

        /// Neighbors for the k-nearest-neighbors candidate
        #[arg(long, default_value_t = 5)]
        k_neighbors: usize,

        /// Penalty for the ridge candidate
        #[arg(long, default_value_t = 1.0)]
        ridge_alpha: f64,
    },

    /// Compute permutation feature importance for a saved model
    Importance {
        /// Path to the saved model binary
        #[arg(long)]
        model: PathBuf,

        /// Path to the CSV file to score on
        #[arg(long)]
        data: PathBuf,

        /// Feature columns, comma-separated, in training order
        #[arg(long, value_delimiter = ',', required = true)]
        features: Vec<String>,

        /// Label column
        #[arg(long)]
        label: String,

        /// Number of permutations per feature
        #[arg(long, default_value_t = 10)]
        repeats: usize,

        /// Experiment name for output files
        #[arg(long, default_value = "snowline")]
        experiment: String,

        /// Output directory for result files (nothing written if unset)
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
}

// --- JSON stdout output structs ---

#[derive(Serialize)]
struct BoundsOutput<'a> {
    experiment: String,
    aar: f64,
    threshold: f64,
    result: &'a Estimate<BoundReport>,
    hypsometry: Estimate<HypsometricIndex>,
    saved: Vec<PathBuf>,
    persist_errors: Vec<String>,
}

#[derive(Serialize)]
struct SelectOutput {
    experiment: String,
    n_samples: usize,
    n_folds: usize,
    best_model: String,
    best_mean_absolute_error: f64,
    failed_models: Vec<String>,
    saved: Vec<PathBuf>,
    persist_errors: Vec<String>,
}

#[derive(Serialize)]
struct ImportanceOutput {
    experiment: String,
    model: String,
    baseline_score: f64,
    features: Vec<FeatureOutput>,
    saved: Vec<PathBuf>,
    persist_errors: Vec<String>,
}

#[derive(Serialize)]
struct FeatureOutput {
    name: String,
    median: f64,
    mean: f64,
    std: f64,
}

fn candidates(k_neighbors: usize, ridge_alpha: f64) -> Result<Vec<ModelCandidate<Estimator>>> {
    Ok(vec![
        ModelCandidate::new("mean", MeanRegressor::new().into()),
        ModelCandidate::new("linear", LinearRegression::new().into()),
        ModelCandidate::new("ridge", LinearRegression::ridge(ridge_alpha)?.into()),
        ModelCandidate::new("knn", KNeighborsRegressor::new(k_neighbors)?.into()),
    ])
}

/// Files written so far and the persistence problems met on the way.
///
/// A failed write is logged and reported next to the computed result.
#[derive(Debug, Default)]
struct Persisted {
    saved: Vec<PathBuf>,
    errors: Vec<String>,
}

impl Persisted {
    fn record<T>(&mut self, result: Result<T, IoError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(error = %e, "result not persisted");
                self.errors.push(e.to_string());
                None
            }
        }
    }

    fn record_path(&mut self, result: Result<PathBuf, IoError>) {
        if let Some(path) = self.record(result) {
            self.saved.push(path);
        }
    }

    fn merge(&mut self, report: &PersistReport) {
        for outcome in &report.outcomes {
            match outcome {
                PersistOutcome::Saved { path, .. } => self.saved.push(path.clone()),
                PersistOutcome::Failed {
                    artifact,
                    path,
                    reason,
                } => self
                    .errors
                    .push(format!("{artifact} not written to {}: {reason}", path.display())),
                PersistOutcome::Skipped { .. } => {}
            }
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match (cli.verbose, cli.quiet) {
        (true, _) => "debug",
        (_, true) => "error",
        _ => "info",
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    // Configure Rayon thread pool
    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("failed to configure thread pool")?;
        info!(threads, "thread pool configured");
    }

    match cli.command {
        Command::Bounds {
            dem,
            snow,
            aar,
            threshold,
            experiment,
            output_dir,
        } => {
            let experiment_name = ExperimentName::new(experiment.clone())?;

            let grid = load_raster(&dem, &snow).context("failed to read raster pair")?;
            let estimator = SlaBoundEstimator::new(aar, threshold)?;
            let result = estimator.estimate(&grid)?;
            let hypsometry = hypsometric_index(grid.elevation());

            match &result {
                Estimate::Available(report) => info!(
                    central = report.bound.central,
                    lower = report.bound.lower,
                    upper = report.bound.upper,
                    "snowline bounds estimated"
                ),
                Estimate::NotAvailable(reason) => warn!(%reason, "snowline bounds not available"),
            }

            let mut persisted = Persisted::default();
            if let Some(dir) = output_dir
                && let Some(writer) = persisted.record(ResultWriter::new(&dir, experiment_name))
            {
                persisted.record_path(writer.write_bounds(aar, threshold, &result));
            }

            let output = BoundsOutput {
                experiment,
                aar,
                threshold,
                result: &result,
                hypsometry,
                saved: persisted.saved,
                persist_errors: persisted.errors,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Command::Select {
            data,
            features,
            label,
            folds,
            experiment,
            output_dir,
            save_performances,
            k_neighbors,
            ridge_alpha,
        } => {
            let experiment_name = ExperimentName::new(experiment.clone())?;

            let table = TrainingTableReader::new(&data, &features, &label)
                .read()
                .context("failed to read training CSV")?;

            let mut selector = CrossValidationSelector::new(folds)?;
            if let Some(seed) = cli.seed {
                selector = selector.with_seed(seed);
            }
            let selection = selector
                .select(
                    candidates(k_neighbors, ridge_alpha)?,
                    table.features(),
                    table.targets(),
                )
                .context("model selection failed")?;

            for failure in &selection.failures {
                warn!(model = %failure.name, error = %failure.error, "candidate failed");
            }

            let mut persisted = Persisted::default();
            if let Some(dir) = output_dir
                && let Some(writer) = persisted.record(ResultWriter::new(&dir, experiment_name))
            {
                let options = PersistOptions::new()
                    .with_output_dir(writer.output_dir())
                    .with_model_file_name(format!("{experiment}_model.bin"))
                    .with_performances_file_name(format!("{experiment}_performances.csv"))
                    .with_save_performances(save_performances);
                let report = selection.persist(&options);
                persisted.merge(&report);

                let model_path = report.outcomes.iter().find_map(|o| match o {
                    PersistOutcome::Saved {
                        artifact: Artifact::Model,
                        path,
                    } => Some(path.clone()),
                    _ => None,
                });
                let rows: Vec<(String, [f64; 5])> = selection
                    .ranked()
                    .into_iter()
                    .map(|p| {
                        let m = &p.mean;
                        (
                            p.name.clone(),
                            [
                                m.mean_absolute_error,
                                m.mean_squared_error,
                                m.mean_absolute_percentage_error,
                                m.max_error,
                                m.r_squared,
                            ],
                        )
                    })
                    .collect();
                persisted.record_path(writer.write_selection(
                    &selection.best_name,
                    table.n_samples(),
                    folds,
                    selector.seed(),
                    &rows,
                    model_path.as_deref(),
                ));
            }

            let output = SelectOutput {
                experiment,
                n_samples: table.n_samples(),
                n_folds: folds,
                best_mean_absolute_error: selection
                    .best()
                    .map_or(f64::NAN, |p| p.mean.mean_absolute_error),
                best_model: selection.best_name.clone(),
                failed_models: selection.failures.iter().map(|f| f.name.clone()).collect(),
                saved: persisted.saved,
                persist_errors: persisted.errors,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Command::Importance {
            model,
            data,
            features,
            label,
            repeats,
            experiment,
            output_dir,
        } => {
            let experiment_name = ExperimentName::new(experiment.clone())?;

            let saved = load_model::<Estimator>(&model)
                .with_context(|| format!("failed to load model from {}", model.display()))?;
            info!(model = %saved.name, kind = saved.model.kind(), "model loaded");

            let table = TrainingTableReader::new(&data, &features, &label)
                .read()
                .context("failed to read CSV")?;

            let mut config = PermutationImportance::new(repeats)?;
            if let Some(seed) = cli.seed {
                config = config.with_seed(seed);
            }
            let result = config
                .evaluate(&saved.model, table.features(), table.targets(), table.feature_names())
                .context("permutation importance failed")?;

            let ranked: Vec<FeatureOutput> = result
                .ranked()
                .into_iter()
                .map(|f| FeatureOutput {
                    name: f.name.clone(),
                    median: f.summary.median,
                    mean: f.summary.mean,
                    std: f.summary.std,
                })
                .collect();

            let mut persisted = Persisted::default();
            if let Some(dir) = output_dir
                && let Some(writer) = persisted.record(ResultWriter::new(&dir, experiment_name))
            {
                let options = PersistOptions::new()
                    .with_output_dir(writer.output_dir())
                    .with_importances_file_name(format!("{experiment}_importances.csv"));
                persisted.merge(&result.persist(&options));
                let rows: Vec<(String, f64, f64, f64)> = ranked
                    .iter()
                    .map(|f| (f.name.clone(), f.median, f.mean, f.std))
                    .collect();
                let written = writer.write_importance(result.baseline_score, repeats, &rows);
                persisted.record_path(written);
            }

            let output = ImportanceOutput {
                experiment,
                model: saved.name,
                baseline_score: result.baseline_score,
                features: ranked,
                saved: persisted.saved,
                persist_errors: persisted.errors,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}
