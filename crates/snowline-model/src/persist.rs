//! Optional on-disk artifacts: the selected model, the performance table,
//! and permutation importances.
//!
//! Persistence never aborts the computation that produced the artifact. Each
//! write yields a [`PersistOutcome`]; failures are logged and reported.

use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::ModelError;

/// Which artifact an outcome refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Artifact {
    Model,
    Performances,
    Importances,
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Model => "model",
            Self::Performances => "performance table",
            Self::Importances => "feature importances",
        })
    }
}

/// Why an artifact was deliberately not written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// No output directory was configured.
    NoOutputDir,
    /// The artifact's flag was off.
    Disabled,
}

/// Result of attempting to write one artifact.
#[derive(Debug, Clone, PartialEq)]
pub enum PersistOutcome {
    Saved {
        artifact: Artifact,
        path: PathBuf,
    },
    Skipped {
        artifact: Artifact,
        reason: SkipReason,
    },
    Failed {
        artifact: Artifact,
        path: PathBuf,
        reason: String,
    },
}

impl PersistOutcome {
    #[must_use]
    pub fn artifact(&self) -> Artifact {
        match self {
            Self::Saved { artifact, .. }
            | Self::Skipped { artifact, .. }
            | Self::Failed { artifact, .. } => *artifact,
        }
    }
}

/// Outcomes of one persistence pass, in the order they were attempted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PersistReport {
    pub outcomes: Vec<PersistOutcome>,
}

impl PersistReport {
    /// Paths of every artifact that was written.
    #[must_use]
    pub fn saved_paths(&self) -> Vec<&Path> {
        self.outcomes
            .iter()
            .filter_map(|o| match o {
                PersistOutcome::Saved { path, .. } => Some(path.as_path()),
                _ => None,
            })
            .collect()
    }

    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.outcomes
            .iter()
            .any(|o| matches!(o, PersistOutcome::Failed { .. }))
    }

    /// Outcome for a given artifact, if it was attempted.
    #[must_use]
    pub fn outcome(&self, artifact: Artifact) -> Option<&PersistOutcome> {
        self.outcomes.iter().find(|o| o.artifact() == artifact)
    }
}

/// Where and what to persist.
///
/// Construct via [`PersistOptions::new`], then chain `with_*` methods.
///
/// # Defaults
///
/// | Parameter                | Default                           |
/// |--------------------------|-----------------------------------|
/// | `output_dir`             | `None` (persist nothing)          |
/// | `save_model`             | `true`                            |
/// | `save_performances`      | `false`                           |
/// | `save_importances`       | `true`                            |
/// | `model_file_name`        | `best_model.bin`                  |
/// | `performances_file_name` | `model_performances.csv`          |
/// | `importances_file_name`  | `model_feature_importances.csv`   |
#[derive(Debug, Clone)]
pub struct PersistOptions {
    output_dir: Option<PathBuf>,
    save_model: bool,
    save_performances: bool,
    save_importances: bool,
    model_file_name: String,
    performances_file_name: String,
    importances_file_name: String,
}

impl Default for PersistOptions {
    fn default() -> Self {
        Self {
            output_dir: None,
            save_model: true,
            save_performances: false,
            save_importances: true,
            model_file_name: "best_model.bin".to_string(),
            performances_file_name: "model_performances.csv".to_string(),
            importances_file_name: "model_feature_importances.csv".to_string(),
        }
    }
}

impl PersistOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Directory to write into. It must already exist.
    #[must_use]
    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(output_dir.into());
        self
    }

    #[must_use]
    pub fn with_save_model(mut self, save_model: bool) -> Self {
        self.save_model = save_model;
        self
    }

    #[must_use]
    pub fn with_save_performances(mut self, save_performances: bool) -> Self {
        self.save_performances = save_performances;
        self
    }

    #[must_use]
    pub fn with_save_importances(mut self, save_importances: bool) -> Self {
        self.save_importances = save_importances;
        self
    }

    #[must_use]
    pub fn with_model_file_name(mut self, name: impl Into<String>) -> Self {
        self.model_file_name = name.into();
        self
    }

    #[must_use]
    pub fn with_performances_file_name(mut self, name: impl Into<String>) -> Self {
        self.performances_file_name = name.into();
        self
    }

    #[must_use]
    pub fn with_importances_file_name(mut self, name: impl Into<String>) -> Self {
        self.importances_file_name = name.into();
        self
    }

    #[must_use]
    pub fn output_dir(&self) -> Option<&Path> {
        self.output_dir.as_deref()
    }

    fn settings(&self, artifact: Artifact) -> (bool, &str) {
        match artifact {
            Artifact::Model => (self.save_model, &self.model_file_name),
            Artifact::Performances => (self.save_performances, &self.performances_file_name),
            Artifact::Importances => (self.save_importances, &self.importances_file_name),
        }
    }

    /// Write one artifact with `write`, downgrading every failure to an outcome.
    pub(crate) fn persist(
        &self,
        artifact: Artifact,
        write: impl FnOnce(&Path) -> Result<(), ModelError>,
    ) -> PersistOutcome {
        let (enabled, file_name) = self.settings(artifact);
        if !enabled {
            return PersistOutcome::Skipped {
                artifact,
                reason: SkipReason::Disabled,
            };
        }
        let Some(dir) = self.output_dir.as_deref() else {
            return PersistOutcome::Skipped {
                artifact,
                reason: SkipReason::NoOutputDir,
            };
        };

        let path = dir.join(file_name);
        if !dir.is_dir() {
            warn!(dir = %dir.display(), %artifact, "output directory does not exist, not saving");
            return PersistOutcome::Failed {
                artifact,
                path,
                reason: format!("output directory {} does not exist", dir.display()),
            };
        }

        match write(&path) {
            Ok(()) => {
                info!(path = %path.display(), %artifact, "saved");
                PersistOutcome::Saved { artifact, path }
            }
            Err(e) => {
                warn!(path = %path.display(), %artifact, error = %e, "failed to save, continuing");
                PersistOutcome::Failed {
                    artifact,
                    path,
                    reason: e.to_string(),
                }
            }
        }
    }
}

/// Write rows of string cells to a CSV file with a header.
pub(crate) fn write_csv(
    path: &Path,
    header: &[String],
    rows: impl IntoIterator<Item = Vec<String>>,
) -> Result<(), ModelError> {
    let to_err = |source: csv::Error| ModelError::WriteTable {
        path: path.to_path_buf(),
        source,
    };
    let mut writer = csv::Writer::from_path(path).map_err(to_err)?;
    writer.write_record(header).map_err(to_err)?;
    for row in rows {
        writer.write_record(&row).map_err(to_err)?;
    }
    writer.flush().map_err(|e| to_err(e.into()))?;
    Ok(())
}
