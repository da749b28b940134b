//! Model serialization and deserialization via bincode.

use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, instrument};

use crate::error::ModelError;

/// Current binary format version.
const FORMAT_VERSION: u32 = 1;

/// Versioned envelope written to disk.
#[derive(Serialize)]
struct EnvelopeRef<'a, M> {
    format_version: u32,
    model_name: &'a str,
    model: &'a M,
}

/// Owned counterpart of [`EnvelopeRef`] for reading.
#[derive(serde::Deserialize)]
struct Envelope<M> {
    format_version: u32,
    model_name: String,
    model: M,
}

/// A model read back from disk together with the name it was selected under.
#[derive(Debug, Clone)]
pub struct SavedModel<M> {
    pub name: String,
    pub model: M,
}

/// Save a fitted model to a binary file.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`ModelError::SerializeModel`] | bincode encoding failed |
/// | [`ModelError::WriteModel`] | file write failed |
#[instrument(skip_all, fields(path = %path.as_ref().display(), model_name = model_name))]
pub fn save_model<M: Serialize>(
    model: &M,
    model_name: &str,
    path: impl AsRef<Path>,
) -> Result<(), ModelError> {
    let path = path.as_ref();
    let envelope = EnvelopeRef {
        format_version: FORMAT_VERSION,
        model_name,
        model,
    };

    let bytes =
        bincode::serialize(&envelope).map_err(|e| ModelError::SerializeModel { source: e })?;

    std::fs::write(path, &bytes).map_err(|e| ModelError::WriteModel {
        path: path.to_path_buf(),
        source: e,
    })?;

    info!(size_bytes = bytes.len(), model_name, "model saved");
    Ok(())
}

/// Load a model written by [`save_model`].
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`ModelError::ReadModel`] | file read failed |
/// | [`ModelError::DeserializeModel`] | bincode decoding failed |
/// | [`ModelError::IncompatibleModelVersion`] | format version mismatch |
#[instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn load_model<M: DeserializeOwned>(path: impl AsRef<Path>) -> Result<SavedModel<M>, ModelError> {
    let path = path.as_ref();

    let bytes = std::fs::read(path).map_err(|e| ModelError::ReadModel {
        path: path.to_path_buf(),
        source: e,
    })?;

    // Peek at the version before decoding the body so that an old file reports
    // a version mismatch rather than a decode error.
    let version: u32 = bincode::deserialize(&bytes).map_err(|e| ModelError::DeserializeModel {
        path: path.to_path_buf(),
        source: e,
    })?;
    if version != FORMAT_VERSION {
        return Err(ModelError::IncompatibleModelVersion {
            expected: FORMAT_VERSION,
            found: version,
            path: path.to_path_buf(),
        });
    }

    let envelope: Envelope<M> =
        bincode::deserialize(&bytes).map_err(|e| ModelError::DeserializeModel {
            path: path.to_path_buf(),
            source: e,
        })?;

    debug!(
        format_version = envelope.format_version,
        model_name = %envelope.model_name,
        "model loaded"
    );

    Ok(SavedModel {
        name: envelope.model_name,
        model: envelope.model,
    })
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::estimator::Estimator;
    use crate::linear::LinearRegression;
    use crate::regressor::Regressor;

    fn fitted_model() -> Estimator {
        let features: Vec<Vec<f64>> = (0..8).map(|i| vec![i as f64, (i % 3) as f64]).collect();
        let targets: Vec<f64> = features.iter().map(|r| 1.0 + r[0] - 2.0 * r[1]).collect();
        let mut model = Estimator::from(LinearRegression::new());
        model.fit(&features, &targets).unwrap();
        model
    }

    #[test]
    fn round_trip_identical_predictions() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("best_model.bin");
        let model = fitted_model();

        save_model(&model, "Linear", &path).unwrap();
        let loaded: SavedModel<Estimator> = load_model(&path).unwrap();

        assert_eq!(loaded.name, "Linear");
        let samples = vec![vec![2.5, 1.0], vec![-3.0, 0.0]];
        assert_eq!(
            model.predict(&samples).unwrap(),
            loaded.model.predict(&samples).unwrap()
        );
    }

    #[test]
    fn load_nonexistent_file_error() {
        let dir = TempDir::new().unwrap();
        let err = load_model::<Estimator>(dir.path().join("missing.bin")).unwrap_err();
        assert!(matches!(err, ModelError::ReadModel { .. }));
    }

    #[test]
    fn load_corrupt_file_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("corrupt.bin");
        std::fs::write(&path, [1u8, 0, 0, 0, 0xff, 0xff]).unwrap();
        let err = load_model::<Estimator>(&path).unwrap_err();
        assert!(matches!(err, ModelError::DeserializeModel { .. }));
    }

    #[test]
    fn version_mismatch_detected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("future.bin");
        std::fs::write(&path, 99u32.to_le_bytes()).unwrap();
        let err = load_model::<Estimator>(&path).unwrap_err();
        assert!(matches!(
            err,
            ModelError::IncompatibleModelVersion { found: 99, .. }
        ));
    }
}
