//! Shape and finiteness checks shared by every training entry point.

use crate::error::ModelError;

/// Validate a row-major feature table and its targets.
///
/// Returns the number of feature columns.
pub(crate) fn validate(features: &[Vec<f64>], targets: &[f64]) -> Result<usize, ModelError> {
    if features.is_empty() {
        return Err(ModelError::EmptyDataset);
    }
    if features.len() != targets.len() {
        return Err(ModelError::TargetCountMismatch {
            n_samples: features.len(),
            n_targets: targets.len(),
        });
    }
    let n_features = validate_rows(features, None)?;
    if let Some(sample_index) = targets.iter().position(|y| !y.is_finite()) {
        return Err(ModelError::NonFiniteTarget { sample_index });
    }
    Ok(n_features)
}

/// Validate feature rows only. With `expected` set, every row must have that width.
pub(crate) fn validate_rows(
    features: &[Vec<f64>],
    expected: Option<usize>,
) -> Result<usize, ModelError> {
    let n_features = match (expected, features.first()) {
        (Some(n), _) => n,
        (None, Some(row)) => row.len(),
        (None, None) => return Err(ModelError::EmptyDataset),
    };
    if n_features == 0 {
        return Err(ModelError::ZeroFeatures);
    }
    for (sample_index, row) in features.iter().enumerate() {
        if row.len() != n_features {
            return Err(match expected {
                Some(_) => ModelError::PredictionFeatureMismatch {
                    expected: n_features,
                    got: row.len(),
                },
                None => ModelError::FeatureCountMismatch {
                    expected: n_features,
                    got: row.len(),
                    sample_index,
                },
            });
        }
        if let Some(feature_index) = row.iter().position(|v| !v.is_finite()) {
            return Err(ModelError::NonFiniteValue {
                sample_index,
                feature_index,
            });
        }
    }
    Ok(n_features)
}

/// Gather the rows and targets at `indices`.
pub(crate) fn gather(
    features: &[Vec<f64>],
    targets: &[f64],
    indices: &[usize],
) -> (Vec<Vec<f64>>, Vec<f64>) {
    indices
        .iter()
        .map(|&i| (features[i].clone(), targets[i]))
        .unzip()
}
