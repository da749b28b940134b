//! End-to-end selection and importance tests for snowline-model.
//!
//! These tests run the full cross-validation sweep, refit, permutation
//! importance, and persistence against deterministic synthetic datasets.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tempfile::TempDir;

use snowline_model::{
    Artifact, CrossValidationSelector, Estimator, KNeighborsRegressor, LinearRegression,
    MeanRegressor, ModelCandidate, PERFORMANCE_HEADER, PermutationImportance, PersistOptions,
    PersistOutcome, Regressor, load_model,
};

// ---------------------------------------------------------------------------
// Helper: deterministic synthetic regression dataset
// ---------------------------------------------------------------------------

const TRUE_WEIGHTS: [f64; 3] = [2.0, -3.0, 0.5];
const TRUE_INTERCEPT: f64 = 10.0;

/// Generate `n_samples` rows of 3 features in [0, 10) with
/// `y = 2·x0 − 3·x1 + 0.5·x2 + 10 + noise`, noise uniform in [−0.05, 0.05].
fn make_linear(n_samples: usize, seed: u64) -> (Vec<Vec<f64>>, Vec<f64>) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut features = Vec::with_capacity(n_samples);
    let mut targets = Vec::with_capacity(n_samples);
    for _ in 0..n_samples {
        let row: Vec<f64> = (0..3).map(|_| rng.r#gen::<f64>() * 10.0).collect();
        let noise = (rng.r#gen::<f64>() - 0.5) * 0.1;
        let y = TRUE_INTERCEPT
            + row.iter().zip(TRUE_WEIGHTS).map(|(x, w)| x * w).sum::<f64>()
            + noise;
        features.push(row);
        targets.push(y);
    }
    (features, targets)
}

fn candidates() -> Vec<ModelCandidate<Estimator>> {
    vec![
        ModelCandidate::new("mean", MeanRegressor::new().into()),
        ModelCandidate::new("linear", LinearRegression::new().into()),
        ModelCandidate::new("knn", KNeighborsRegressor::new(5).unwrap().into()),
    ]
}

// ---------------------------------------------------------------------------
// a) linear model selected and refit
// ---------------------------------------------------------------------------

/// Three candidates, five folds, linear data: the linear model (second in the
/// list) wins and comes back fitted on every row.
#[test]
fn linear_model_selected_and_refit() {
    let (features, targets) = make_linear(100, 42);
    let selection = CrossValidationSelector::new(5)
        .unwrap()
        .select(candidates(), &features, &targets)
        .unwrap();

    assert_eq!(selection.best_index, 1);
    assert_eq!(selection.best_name, "linear");
    assert!(selection.failures.is_empty());
    assert_eq!(selection.performances.len(), 3);
    for performance in &selection.performances {
        assert_eq!(performance.folds.len(), 5);
    }

    let Estimator::Linear(model) = &selection.model else {
        panic!("expected linear model, got {}", selection.model.kind());
    };
    let coefficients = model.coefficients().unwrap();
    for (fitted, truth) in coefficients.iter().zip(TRUE_WEIGHTS) {
        assert!((fitted - truth).abs() < 0.02, "coefficient {fitted} vs {truth}");
    }
    assert!((model.intercept().unwrap() - TRUE_INTERCEPT).abs() < 0.1);

    let best = selection.best().unwrap();
    assert!(best.mean.mean_absolute_error < 0.05);
    assert!(best.mean.r_squared > 0.999);
}

// ---------------------------------------------------------------------------
// b) determinism under a fixed seed
// ---------------------------------------------------------------------------

#[test]
fn same_seed_same_metrics() {
    let (features, targets) = make_linear(60, 7);
    let selector = CrossValidationSelector::new(4).unwrap().with_seed(11);
    let a = selector.select(candidates(), &features, &targets).unwrap();
    let b = selector.select(candidates(), &features, &targets).unwrap();

    assert_eq!(a.folds, b.folds);
    for (pa, pb) in a.performances.iter().zip(&b.performances) {
        assert_eq!(pa.folds, pb.folds);
        assert_eq!(pa.mean, pb.mean);
    }
}

// ---------------------------------------------------------------------------
// c) permutation importance finds the true driver
// ---------------------------------------------------------------------------

/// Four features, only feature 2 drives the label.
#[test]
fn true_driver_dominates_importance() {
    let mut rng = ChaCha8Rng::seed_from_u64(3);
    let features: Vec<Vec<f64>> = (0..120)
        .map(|_| (0..4).map(|_| rng.r#gen::<f64>()).collect())
        .collect();
    let targets: Vec<f64> = features
        .iter()
        .map(|row| 5.0 * row[2] + (rng.r#gen::<f64>() - 0.5) * 0.01)
        .collect();
    let names: Vec<String> = (0..4).map(|i| format!("f{i}")).collect();

    let mut model = LinearRegression::new();
    model.fit(&features, &targets).unwrap();

    let result = PermutationImportance::new(10)
        .unwrap()
        .evaluate(&model, &features, &targets, &names)
        .unwrap();

    assert!(result.baseline_score > 0.99);
    assert_eq!(result.ranked()[0].name, "f2");
    let driver = result.features[2].summary.median;
    assert!(driver > 0.5, "driver median {driver}");
    for (i, feature) in result.features.iter().enumerate() {
        assert_eq!(feature.samples.len(), 10);
        if i != 2 {
            assert!(
                feature.summary.median.abs() < 0.01,
                "{} median {}",
                feature.name,
                feature.summary.median
            );
        }
    }
}

// ---------------------------------------------------------------------------
// d) persistence
// ---------------------------------------------------------------------------

#[test]
fn persisted_model_and_tables_read_back() {
    let dir = TempDir::new().unwrap();
    let (features, targets) = make_linear(50, 5);
    let selection = CrossValidationSelector::new(5)
        .unwrap()
        .select(candidates(), &features, &targets)
        .unwrap();

    let options = PersistOptions::new()
        .with_output_dir(dir.path())
        .with_save_performances(true);
    let report = selection.persist(&options);
    assert!(!report.has_failures());
    assert_eq!(report.saved_paths().len(), 2);

    let saved = load_model::<Estimator>(dir.path().join("best_model.bin")).unwrap();
    assert_eq!(saved.name, "linear");
    assert_eq!(
        saved.model.predict(&features[..3]).unwrap(),
        selection.model.predict(&features[..3]).unwrap()
    );

    let mut reader = csv::Reader::from_path(dir.path().join("model_performances.csv")).unwrap();
    let header: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
    assert_eq!(header, PERFORMANCE_HEADER);
    let rows: Vec<csv::StringRecord> = reader.records().map(Result::unwrap).collect();
    assert_eq!(rows.len(), 3);
    assert_eq!(&rows[0][0], "linear");

    let names: Vec<String> = ["a", "b", "c"].iter().map(ToString::to_string).collect();
    let importance = PermutationImportance::new(3)
        .unwrap()
        .evaluate(&selection.model, &features, &targets, &names)
        .unwrap();
    let report = importance.persist(&options);
    assert!(matches!(
        report.outcome(Artifact::Importances),
        Some(PersistOutcome::Saved { .. })
    ));
    let table =
        std::fs::read_to_string(dir.path().join("model_feature_importances.csv")).unwrap();
    let lines: Vec<&str> = table.lines().collect();
    assert_eq!(lines[0], "a,b,c");
    assert_eq!(lines.len(), 4);
}

/// An output directory that does not exist is reported, not fatal.
#[test]
fn missing_output_dir_keeps_result() {
    let dir = TempDir::new().unwrap();
    let (features, targets) = make_linear(30, 9);
    let selection = CrossValidationSelector::new(3)
        .unwrap()
        .select(candidates(), &features, &targets)
        .unwrap();

    let options = PersistOptions::new().with_output_dir(dir.path().join("missing"));
    let report = selection.persist(&options);
    assert!(matches!(
        report.outcome(Artifact::Model),
        Some(PersistOutcome::Failed { .. })
    ));
    assert!(!dir.path().join("missing").exists());
    assert_eq!(selection.best_name, "linear");
}
