//! Criterion benchmarks for snowline-model: cross-validated selection and
//! permutation importance.

use criterion::{Criterion, criterion_group, criterion_main};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use snowline_model::{
    CrossValidationSelector, Estimator, KNeighborsRegressor, LinearRegression, MeanRegressor,
    ModelCandidate, PermutationImportance, Regressor,
};

fn make_regression(n_samples: usize, n_features: usize, seed: u64) -> (Vec<Vec<f64>>, Vec<f64>) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let features: Vec<Vec<f64>> = (0..n_samples)
        .map(|_| (0..n_features).map(|_| rng.r#gen::<f64>()).collect())
        .collect();
    let targets = features
        .iter()
        .map(|row| row.iter().enumerate().map(|(i, x)| (i + 1) as f64 * x).sum::<f64>())
        .collect();
    (features, targets)
}

fn candidates() -> Vec<ModelCandidate<Estimator>> {
    vec![
        ModelCandidate::new("mean", MeanRegressor::new().into()),
        ModelCandidate::new("linear", LinearRegression::new().into()),
        ModelCandidate::new("knn", KNeighborsRegressor::new(5).unwrap().into()),
    ]
}

fn bench_select(c: &mut Criterion) {
    let (features, targets) = make_regression(1000, 8, 42);
    let selector = CrossValidationSelector::new(5).unwrap();

    c.bench_function("select_3_candidates_1000x8_5fold", |b| {
        b.iter(|| selector.select(candidates(), &features, &targets).unwrap());
    });
}

fn bench_permutation_importance(c: &mut Criterion) {
    let (features, targets) = make_regression(1000, 8, 42);
    let names: Vec<String> = (0..8).map(|f| format!("f{f}")).collect();
    let mut model = LinearRegression::new();
    model.fit(&features, &targets).unwrap();
    let config = PermutationImportance::new(10).unwrap();

    c.bench_function("permutation_importance_1000x8_10repeats", |b| {
        b.iter(|| config.evaluate(&model, &features, &targets, &names).unwrap());
    });
}

criterion_group!(benches, bench_select, bench_permutation_importance);
criterion_main!(benches);
