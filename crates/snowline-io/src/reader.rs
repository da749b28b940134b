//! CSV training-table reader with full input validation.

use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};

use crate::IoError;
use crate::domain::TrainingTable;

/// Reads named feature columns and one label column from a CSV file.
///
/// Expected CSV format:
/// - Header row required; column order is free and extra columns are ignored
/// - Every selected cell must parse as a finite float
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`IoError::FileNotFound`] | File doesn't exist or is unreadable |
/// | [`IoError::CsvParse`] | Malformed CSV record |
/// | [`IoError::NoFeatureColumns`] | No feature names were given |
/// | [`IoError::MissingColumn`] | A requested column is not in the header |
/// | [`IoError::DuplicateColumn`] | A requested column appears twice in the header |
/// | [`IoError::InconsistentRowLength`] | Row has different column count than header |
/// | [`IoError::NonFiniteValue`] | Selected cell is NaN, Inf, or unparseable |
/// | [`IoError::EmptyDataset`] | Zero data rows after header |
pub struct TrainingTableReader {
    path: PathBuf,
    feature_names: Vec<String>,
    label: String,
}

impl TrainingTableReader {
    /// Create a reader selecting `feature_names` as inputs and `label` as target.
    pub fn new(path: &Path, feature_names: &[String], label: &str) -> Self {
        Self {
            path: path.to_path_buf(),
            feature_names: feature_names.to_vec(),
            label: label.to_string(),
        }
    }

    /// Read and validate the CSV file, returning a [`TrainingTable`].
    #[instrument(skip(self), fields(path = %self.path.display(), label = %self.label))]
    pub fn read(&self) -> Result<TrainingTable, IoError> {
        if self.feature_names.is_empty() {
            return Err(IoError::NoFeatureColumns {
                path: self.path.clone(),
            });
        }

        let file = std::fs::File::open(&self.path).map_err(|e| IoError::FileNotFound {
            path: self.path.clone(),
            source: e,
        })?;

        // flexible(true) so our own InconsistentRowLength check fires instead
        // of a low-level CsvParse error.
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(file);

        let header = rdr.headers().map_err(|e| self.csv_error(e))?.clone();
        let expected_cols = header.len();
        debug!(expected_cols, "read CSV header");

        let feature_cols = self
            .feature_names
            .iter()
            .map(|name| self.column_index(&header, name))
            .collect::<Result<Vec<usize>, IoError>>()?;
        let label_col = self.column_index(&header, &self.label)?;

        let mut features = Vec::new();
        let mut targets = Vec::new();
        for (row_index, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| self.csv_error(e))?;
            if record.len() != expected_cols {
                return Err(IoError::InconsistentRowLength {
                    path: self.path.clone(),
                    row_index,
                    expected: expected_cols,
                    got: record.len(),
                });
            }

            let row = feature_cols
                .iter()
                .map(|&col| self.parse_cell(&record, &header, row_index, col))
                .collect::<Result<Vec<f64>, IoError>>()?;
            targets.push(self.parse_cell(&record, &header, row_index, label_col)?);
            features.push(row);
        }

        if targets.is_empty() {
            return Err(IoError::EmptyDataset {
                path: self.path.clone(),
            });
        }

        info!(
            n_samples = targets.len(),
            n_features = self.feature_names.len(),
            "training table loaded"
        );

        Ok(TrainingTable::new(
            self.feature_names.clone(),
            self.label.clone(),
            features,
            targets,
        ))
    }

    fn csv_error(&self, e: csv::Error) -> IoError {
        IoError::CsvParse {
            path: self.path.clone(),
            offset: e.position().map_or(0, |p| p.byte()),
            source: e,
        }
    }

    fn column_index(&self, header: &csv::StringRecord, name: &str) -> Result<usize, IoError> {
        let mut matches = header.iter().enumerate().filter(|&(_, h)| h.trim() == name);
        let (index, _) = matches.next().ok_or_else(|| IoError::MissingColumn {
            path: self.path.clone(),
            column: name.to_string(),
        })?;
        if matches.next().is_some() {
            return Err(IoError::DuplicateColumn {
                path: self.path.clone(),
                column: name.to_string(),
            });
        }
        Ok(index)
    }

    fn parse_cell(
        &self,
        record: &csv::StringRecord,
        header: &csv::StringRecord,
        row_index: usize,
        col: usize,
    ) -> Result<f64, IoError> {
        let raw = record.get(col).unwrap_or("").trim();
        match raw.parse::<f64>() {
            Ok(value) if value.is_finite() => Ok(value),
            _ => Err(IoError::NonFiniteValue {
                path: self.path.clone(),
                row_index,
                column: header.get(col).unwrap_or("").to_string(),
                raw: raw.to_string(),
            }),
        }
    }
}
