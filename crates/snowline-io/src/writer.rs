//! JSON result writer for bound estimation, model selection, and importance outputs.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use snowline_raster::{BoundReport, Estimate};
use tracing::{debug, info, instrument};

use crate::IoError;
use crate::domain::ExperimentName;

/// Writes results to JSON files.
///
/// Creates the output directory on construction if it does not exist.
/// Output files are named `{experiment}_bounds.json`,
/// `{experiment}_selection.json`, and `{experiment}_importance.json`.
pub struct ResultWriter {
    output_dir: PathBuf,
    experiment: ExperimentName,
}

impl ResultWriter {
    /// Create a new writer targeting the given directory and experiment name.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::OutputDirCreate`] if the directory cannot be created.
    #[instrument(skip_all, fields(dir = %output_dir.display(), experiment = %experiment))]
    pub fn new(output_dir: &Path, experiment: ExperimentName) -> Result<Self, IoError> {
        fs::create_dir_all(output_dir).map_err(|e| IoError::OutputDirCreate {
            path: output_dir.to_path_buf(),
            source: e,
        })?;
        debug!("output directory ready");
        Ok(Self {
            output_dir: output_dir.to_path_buf(),
            experiment,
        })
    }

    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Write a snowline bound estimate to `{experiment}_bounds.json`.
    ///
    /// An unavailable estimate is written with its reason, e.g.
    /// `{"status": "not_available", "value": "no_valid_area"}`.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`IoError::Serialize`] | JSON encoding failed |
    /// | [`IoError::WriteFile`] | File write failed |
    #[instrument(skip_all)]
    pub fn write_bounds(
        &self,
        aar: f64,
        threshold: f64,
        result: &Estimate<BoundReport>,
    ) -> Result<PathBuf, IoError> {
        let artifact = BoundsArtifact {
            experiment: self.experiment.as_str(),
            aar,
            threshold,
            result,
        };
        let path = self.write_json("bounds", &artifact)?;
        info!(path = %path.display(), "bounds written");
        Ok(path)
    }

    /// Write a model selection summary to `{experiment}_selection.json`.
    ///
    /// Uses shadow structs to accept primitives; the writer has no
    /// dependency on `snowline-model`. Each performance row is
    /// `(name, [mae, mse, mape, max_error, r2])` and rows are written in the
    /// order given.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`IoError::Serialize`] | JSON encoding failed |
    /// | [`IoError::WriteFile`] | File write failed |
    #[instrument(skip_all)]
    pub fn write_selection(
        &self,
        best_model: &str,
        n_samples: usize,
        n_folds: usize,
        seed: u64,
        performances: &[(String, [f64; 5])],
        model_path: Option<&Path>,
    ) -> Result<PathBuf, IoError> {
        let models: Vec<PerformanceEntry> = performances
            .iter()
            .enumerate()
            .map(|(i, (name, m))| PerformanceEntry {
                rank: i + 1,
                name: name.as_str(),
                mean_absolute_error: m[0],
                mean_squared_error: m[1],
                mean_absolute_percentage_error: m[2],
                max_error: m[3],
                r_squared: m[4],
            })
            .collect();

        let artifact = SelectionArtifact {
            experiment: self.experiment.as_str(),
            best_model,
            n_samples,
            n_folds,
            seed,
            models,
            model_path: model_path.map(|p| p.display().to_string()),
        };
        let path = self.write_json("selection", &artifact)?;
        info!(path = %path.display(), "selection written");
        Ok(path)
    }

    /// Write permutation importances to `{experiment}_importance.json`.
    ///
    /// Each feature is `(name, median, mean, std)`; features are written in
    /// the order given.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`IoError::Serialize`] | JSON encoding failed |
    /// | [`IoError::WriteFile`] | File write failed |
    #[instrument(skip_all)]
    pub fn write_importance(
        &self,
        baseline_score: f64,
        n_repeats: usize,
        features: &[(String, f64, f64, f64)],
    ) -> Result<PathBuf, IoError> {
        let features: Vec<ImportanceEntry> = features
            .iter()
            .enumerate()
            .map(|(i, (name, median, mean, std))| ImportanceEntry {
                rank: i + 1,
                name: name.as_str(),
                median: *median,
                mean: *mean,
                std: *std,
            })
            .collect();
        let artifact = ImportanceArtifact {
            experiment: self.experiment.as_str(),
            baseline_score,
            n_repeats,
            features,
        };
        let path = self.write_json("importance", &artifact)?;
        info!(path = %path.display(), "importance written");
        Ok(path)
    }

    fn write_json(&self, kind: &str, artifact: &impl Serialize) -> Result<PathBuf, IoError> {
        let path = self
            .output_dir
            .join(format!("{}_{kind}.json", self.experiment.as_str()));
        let json = serde_json::to_string_pretty(artifact).map_err(|e| IoError::Serialize {
            path: path.clone(),
            source: e,
        })?;
        fs::write(&path, &json).map_err(|e| IoError::WriteFile {
            path: path.clone(),
            source: e,
        })?;
        Ok(path)
    }
}

// --- Shadow structs for JSON serialization ---

#[derive(Serialize)]
struct BoundsArtifact<'a> {
    experiment: &'a str,
    aar: f64,
    threshold: f64,
    result: &'a Estimate<BoundReport>,
}

#[derive(Serialize)]
struct SelectionArtifact<'a> {
    experiment: &'a str,
    best_model: &'a str,
    n_samples: usize,
    n_folds: usize,
    seed: u64,
    models: Vec<PerformanceEntry<'a>>,
    model_path: Option<String>,
}

#[derive(Serialize)]
struct PerformanceEntry<'a> {
    rank: usize,
    name: &'a str,
    mean_absolute_error: f64,
    mean_squared_error: f64,
    mean_absolute_percentage_error: f64,
    max_error: f64,
    r_squared: f64,
}

#[derive(Serialize)]
struct ImportanceArtifact<'a> {
    experiment: &'a str,
    baseline_score: f64,
    n_repeats: usize,
    features: Vec<ImportanceEntry<'a>>,
}

#[derive(Serialize)]
struct ImportanceEntry<'a> {
    rank: usize,
    name: &'a str,
    median: f64,
    mean: f64,
    std: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use snowline_raster::Unavailable;
    use tempfile::TempDir;

    fn writer(dir: &TempDir) -> ResultWriter {
        ResultWriter::new(dir.path(), ExperimentName::new("test").unwrap()).unwrap()
    }

    #[test]
    fn creates_nested_output_dir() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a").join("b");
        ResultWriter::new(&nested, ExperimentName::new("x").unwrap()).unwrap();
        assert!(nested.is_dir());
    }

    #[test]
    fn unavailable_bounds_written_with_reason() {
        let dir = TempDir::new().unwrap();
        let path = writer(&dir)
            .write_bounds(0.6, 2800.0, &Estimate::NotAvailable(Unavailable::NoValidArea))
            .unwrap();
        assert_eq!(path, dir.path().join("test_bounds.json"));
        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["result"]["status"], "not_available");
        assert_eq!(json["result"]["value"], "no_valid_area");
        assert_eq!(json["aar"], 0.6);
    }

    #[test]
    fn selection_rows_ranked_in_given_order() {
        let dir = TempDir::new().unwrap();
        let rows = vec![
            ("linear".to_string(), [0.1, 0.02, 0.001, 0.3, 0.99]),
            ("mean".to_string(), [5.0, 30.0, 0.2, 12.0, 0.0]),
        ];
        let path = writer(&dir)
            .write_selection("linear", 100, 5, 1, &rows, None)
            .unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["best_model"], "linear");
        assert_eq!(json["models"][0]["rank"], 1);
        assert_eq!(json["models"][1]["name"], "mean");
        assert_eq!(json["models"][1]["max_error"], 12.0);
        assert!(json["model_path"].is_null());
    }
}
