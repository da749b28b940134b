//! I/O error types for snowline-io.

use std::path::PathBuf;

/// Errors from file I/O, CSV and ASCII grid parsing, and result serialization.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    /// Returned when the input file does not exist or is unreadable.
    #[error("file not found: {path}")]
    FileNotFound {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when the CSV parser encounters a malformed record.
    #[error("CSV parse error in {path} at byte offset {offset}")]
    CsvParse {
        /// Path to the CSV file.
        path: PathBuf,
        /// Byte offset where the error occurred.
        offset: u64,
        /// Underlying CSV error.
        source: csv::Error,
    },

    /// Returned when the CSV file contains a header but zero data rows.
    #[error("empty dataset (no data rows) in {path}")]
    EmptyDataset {
        /// Path to the CSV file.
        path: PathBuf,
    },

    /// Returned when no feature columns were requested.
    #[error("no feature columns requested for {path}")]
    NoFeatureColumns {
        /// Path to the CSV file.
        path: PathBuf,
    },

    /// Returned when a requested column is absent from the header.
    #[error("column \"{column}\" not found in {path}")]
    MissingColumn {
        /// Path to the CSV file.
        path: PathBuf,
        /// The requested column name.
        column: String,
    },

    /// Returned when a column name appears more than once in the header.
    #[error("column \"{column}\" appears more than once in {path}")]
    DuplicateColumn {
        /// Path to the CSV file.
        path: PathBuf,
        /// The duplicated column name.
        column: String,
    },

    /// Returned when a data row has a different number of columns than the header.
    #[error("inconsistent row length in {path}: row {row_index} has {got} columns, expected {expected}")]
    InconsistentRowLength {
        /// Path to the CSV file.
        path: PathBuf,
        /// Zero-based row index (excluding header).
        row_index: usize,
        /// Expected number of columns (from header).
        expected: usize,
        /// Actual number of columns in this row.
        got: usize,
    },

    /// Returned when a cell value is NaN, Inf, or otherwise not a finite float.
    #[error("non-finite value in {path}: row {row_index}, column \"{column}\", raw value \"{raw}\"")]
    NonFiniteValue {
        /// Path to the CSV file.
        path: PathBuf,
        /// Zero-based row index (excluding header).
        row_index: usize,
        /// Name of the offending column.
        column: String,
        /// The raw string value that failed to parse.
        raw: String,
    },

    /// Returned when an ASCII grid header is missing a key or has a bad value.
    #[error("invalid ASCII grid header in {path}: {reason}")]
    InvalidGridHeader {
        /// Path to the grid file.
        path: PathBuf,
        /// What was wrong.
        reason: String,
    },

    /// Returned when an ASCII grid body value cannot be parsed as a float.
    #[error("unparseable grid value \"{raw}\" in {path} at cell {cell_index}")]
    InvalidGridValue {
        /// Path to the grid file.
        path: PathBuf,
        /// Zero-based row-major cell index.
        cell_index: usize,
        /// The raw token.
        raw: String,
    },

    /// Returned when the grid body holds a different number of values than the header declares.
    #[error("grid {path} declares {expected} cells but holds {got}")]
    GridCellCount {
        /// Path to the grid file.
        path: PathBuf,
        /// `nrows * ncols` from the header.
        expected: usize,
        /// Values actually read.
        got: usize,
    },

    /// Returned when the loaded grids violate a raster contract.
    #[error("invalid raster from {path}")]
    Raster {
        /// Path to the offending grid file.
        path: PathBuf,
        /// Underlying raster error.
        source: snowline_raster::RasterError,
    },

    /// Returned when the experiment name contains characters outside `[a-zA-Z0-9_-]`.
    #[error("invalid experiment name \"{name}\": must match [a-zA-Z0-9_-]+")]
    InvalidExperimentName {
        /// The invalid name.
        name: String,
    },

    /// Returned when the output directory cannot be created.
    #[error("cannot create output directory {path}")]
    OutputDirCreate {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when a result cannot be encoded as JSON.
    #[error("cannot serialize result for {path}")]
    Serialize {
        /// Destination path.
        path: PathBuf,
        /// Underlying JSON error.
        source: serde_json::Error,
    },

    /// Returned when a result file cannot be written.
    #[error("cannot write file {path}")]
    WriteFile {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}
