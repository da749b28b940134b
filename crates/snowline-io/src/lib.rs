//! File I/O, validation, and serialization for the snowline pipeline.

mod domain;
mod error;
mod grid_reader;
mod reader;
mod writer;

pub use domain::{ExperimentName, TrainingTable};
pub use error::IoError;
pub use grid_reader::{AsciiGridReader, GridHeader, load_raster};
pub use reader::TrainingTableReader;
pub use writer::ResultWriter;
