//! Raster misclassification statistics and snowline-altitude uncertainty bounds.
//!
//! Compares a classified snow-cover mask against a co-registered DEM to count
//! snow-free cells above a snowline threshold and snow-covered cells below it,
//! then turns those areas into a percentile envelope around the AAR-derived
//! snowline altitude.

mod area;
mod bounds;
mod elevation;
mod error;
mod estimate;
mod grid;
mod percentile;

pub use area::{AreaStatistic, AreaStatistics};
pub use bounds::{BoundReport, SlaBound, SlaBoundEstimator, SlaEstimate, adjust_percentiles};
pub use elevation::{
    HypsometricCategory, HypsometricIndex, NO_DATA_CEILING, NO_DATA_FLOOR, hypsometric_index,
    is_no_data, mask_no_data,
};
pub use error::RasterError;
pub use estimate::{Estimate, Unavailable};
pub use grid::{Grid, RasterGrid, SnowClass};
pub use percentile::ElevationSamples;
