//! DEM no-data normalization and the hypsometric index.

use serde::Serialize;

use crate::estimate::{Estimate, Unavailable};
use crate::grid::Grid;
use crate::percentile::ElevationSamples;

/// Values above this are treated as no-data (float fill values).
pub const NO_DATA_CEILING: f64 = 1e38;

/// Values at or below this are treated as no-data.
pub const NO_DATA_FLOOR: f64 = -9999.0;

/// Return `true` if `z` is a DEM fill value or not finite.
#[must_use]
pub fn is_no_data(z: f64) -> bool {
    !z.is_finite() || z > NO_DATA_CEILING || z <= NO_DATA_FLOOR
}

/// Replace every no-data cell with NaN.
///
/// Every path that reads a DEM goes through this, so missing cells always
/// look the same to downstream statistics.
#[must_use]
pub fn mask_no_data(dem: Grid<f64>) -> Grid<f64> {
    let mut dem = dem;
    for z in dem.data_mut() {
        if is_no_data(*z) {
            *z = f64::NAN;
        }
    }
    dem
}

/// Shape class of a glacier's elevation distribution (Jiskoot et al., 2009).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HypsometricCategory {
    VeryTopHeavy,
    TopHeavy,
    Equidimensional,
    BottomHeavy,
    VeryBottomHeavy,
}

impl HypsometricCategory {
    fn classify(hi: f64) -> Self {
        if hi <= -1.5 {
            Self::VeryTopHeavy
        } else if hi <= -1.2 {
            Self::TopHeavy
        } else if hi <= 1.2 {
            Self::Equidimensional
        } else if hi <= 1.5 {
            Self::BottomHeavy
        } else {
            Self::VeryBottomHeavy
        }
    }
}

/// Hypsometric index and its category.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HypsometricIndex {
    pub value: f64,
    pub category: HypsometricCategory,
}

/// Compute `HI = (H_max - H_med) / (H_med - H_min)`, with `HI = -1 / HI`
/// when `0 < HI < 1`.
///
/// No-data cells are ignored. Returns [`Unavailable::AllElevationMissing`]
/// for an empty DEM and [`Unavailable::FlatElevation`] when the median
/// equals the minimum.
pub fn hypsometric_index(dem: &Grid<f64>) -> Estimate<HypsometricIndex> {
    let values = dem.data().iter().copied().filter(|&z| !is_no_data(z));
    ElevationSamples::from_values(values).and_then(|samples| {
        let (min, med, max) = (samples.min(), samples.median(), samples.max());
        if med - min <= 0.0 {
            return Estimate::NotAvailable(Unavailable::FlatElevation);
        }
        let mut hi = (max - med) / (med - min);
        if 0.0 < hi && hi < 1.0 {
            hi = -1.0 / hi;
        }
        Estimate::Available(HypsometricIndex {
            value: hi,
            category: HypsometricCategory::classify(hi),
        })
    })
}
