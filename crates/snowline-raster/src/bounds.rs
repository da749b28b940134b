//! Snowline-altitude uncertainty bounds from misclassified snow cover.

use serde::Serialize;
use tracing::{debug, instrument};

use crate::area::AreaStatistics;
use crate::error::RasterError;
use crate::estimate::{Estimate, Unavailable};
use crate::grid::RasterGrid;
use crate::percentile::ElevationSamples;

/// Snowline altitude at the `1 - AAR` percentile of the DEM.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SlaEstimate {
    /// Fraction of glacier area that is snow-free, `1 - AAR`.
    pub percentile: f64,
    /// DEM elevation at that percentile.
    pub altitude: f64,
}

/// Snowline altitude with its lower and upper uncertainty bound.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SlaBound {
    pub central: f64,
    pub lower: f64,
    pub upper: f64,
}

/// Everything the estimator derived on the way to a [`SlaBound`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoundReport {
    pub estimate: SlaEstimate,
    pub bound: SlaBound,
    pub areas: AreaStatistics,
    /// Snow-free area above the threshold as a fraction of valid area.
    pub delta_up: f64,
    /// Snow-covered area below the threshold as a fraction of valid area.
    pub delta_down: f64,
    pub lower_percentile: f64,
    pub upper_percentile: f64,
}

/// Shift the snowline percentile by the misclassified fractions, clipped to `[0, 1]`.
///
/// Returns `(lower_percentile, upper_percentile)`.
#[must_use]
pub fn adjust_percentiles(percentile: f64, delta_up: f64, delta_down: f64) -> (f64, f64) {
    let upper = (percentile + delta_up).clamp(0.0, 1.0);
    let lower = (percentile - delta_down).clamp(0.0, 1.0);
    (lower, upper)
}

/// Converts an AAR and its snowline threshold into altitude bounds.
///
/// Construct via [`SlaBoundEstimator::new`], then call
/// [`estimate`](Self::estimate) once per classified image.
#[derive(Debug, Clone, Copy)]
pub struct SlaBoundEstimator {
    aar: f64,
    threshold: f64,
}

impl SlaBoundEstimator {
    /// Create an estimator for one observation.
    ///
    /// `threshold` is the snowline elevation the misclassification predicates
    /// compare against.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`RasterError::InvalidAar`] | `aar` is not a finite value in `[0, 1]` |
    /// | [`RasterError::NonFiniteThreshold`] | `threshold` is NaN or infinite |
    pub fn new(aar: f64, threshold: f64) -> Result<Self, RasterError> {
        if !aar.is_finite() || !(0.0..=1.0).contains(&aar) {
            return Err(RasterError::InvalidAar { aar });
        }
        if !threshold.is_finite() {
            return Err(RasterError::NonFiniteThreshold { threshold });
        }
        Ok(Self { aar, threshold })
    }

    #[must_use]
    pub fn aar(&self) -> f64 {
        self.aar
    }

    #[must_use]
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Compute the bound for `grid`.
    ///
    /// Returns [`Unavailable::NoValidArea`] when no cell has both inputs
    /// present, and [`Unavailable::AllElevationMissing`] when the DEM has no
    /// valid samples at all.
    ///
    /// # Errors
    ///
    /// Propagates [`RasterError`] from [`AreaStatistics::compute`].
    #[instrument(skip(self, grid), fields(aar = self.aar, threshold = self.threshold))]
    pub fn estimate(&self, grid: &RasterGrid) -> Result<Estimate<BoundReport>, RasterError> {
        let areas = AreaStatistics::compute(grid, self.threshold)?;
        if !areas.has_valid_area() {
            debug!("no valid area, bound not available");
            return Ok(Estimate::NotAvailable(Unavailable::NoValidArea));
        }

        let samples = match ElevationSamples::from_values(grid.valid_elevations()) {
            Estimate::Available(s) => s,
            Estimate::NotAvailable(reason) => return Ok(Estimate::NotAvailable(reason)),
        };

        let percentile = 1.0 - self.aar;
        let total = areas.total_valid.area;
        let delta_up = areas.snow_free_above.area / total;
        let delta_down = areas.snow_covered_below.area / total;
        let (lower_percentile, upper_percentile) =
            adjust_percentiles(percentile, delta_up, delta_down);

        let estimate = SlaEstimate {
            percentile,
            altitude: samples.percentile(percentile),
        };
        let bound = SlaBound {
            central: estimate.altitude,
            lower: samples.percentile(lower_percentile),
            upper: samples.percentile(upper_percentile),
        };

        debug!(
            total_area = total,
            delta_up,
            delta_down,
            sla_percentile = percentile,
            lower_percentile,
            upper_percentile,
            sla = bound.central,
            sla_lower = bound.lower,
            sla_upper = bound.upper,
            "snowline bounds computed"
        );

        Ok(Estimate::Available(BoundReport {
            estimate,
            bound,
            areas,
            delta_up,
            delta_down,
            lower_percentile,
            upper_percentile,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{Grid, SnowClass};

    /// A 10x10 glacier with elevations 1000..=1990 in 10 m steps.
    /// Cells above `snowline` are snow-covered, cells below are snow-free.
    fn ideal_glacier(snowline: f64) -> RasterGrid {
        let elevation: Vec<f64> = (0..100).map(|i| 1000.0 + i as f64 * 10.0).collect();
        let snow = elevation
            .iter()
            .map(|&z| {
                if z > snowline {
                    SnowClass::SnowCovered
                } else {
                    SnowClass::SnowFree
                }
            })
            .collect();
        RasterGrid::new(
            Grid::new(10, 10, 30.0, elevation).unwrap(),
            Grid::new(10, 10, 30.0, snow).unwrap(),
        )
        .unwrap()
    }

    fn report(grid: &RasterGrid, aar: f64, threshold: f64) -> BoundReport {
        SlaBoundEstimator::new(aar, threshold)
            .unwrap()
            .estimate(grid)
            .unwrap()
            .available()
            .unwrap()
    }

    #[test]
    fn clean_classification_collapses_bound() {
        let median = 1495.0;
        let grid = ideal_glacier(median);
        let r = report(&grid, 0.5, median);
        assert_eq!(r.delta_up, 0.0);
        assert_eq!(r.delta_down, 0.0);
        assert_eq!(r.estimate.percentile, 0.5);
        assert!((r.bound.central - median).abs() < 1e-9);
        assert_eq!(r.bound.lower, r.bound.central);
        assert_eq!(r.bound.upper, r.bound.central);
    }

    #[test]
    fn misclassified_cells_widen_bound() {
        let elevation: Vec<f64> = (0..100).map(|i| 1000.0 + i as f64 * 10.0).collect();
        let mut snow: Vec<SnowClass> = elevation
            .iter()
            .map(|&z| if z > 1495.0 { SnowClass::SnowCovered } else { SnowClass::SnowFree })
            .collect();
        // 5 snow-free cells high up, 3 snow-covered cells low down
        for i in 90..95 {
            snow[i] = SnowClass::SnowFree;
        }
        for i in 0..3 {
            snow[i] = SnowClass::SnowCovered;
        }
        let grid = RasterGrid::new(
            Grid::new(10, 10, 30.0, elevation).unwrap(),
            Grid::new(10, 10, 30.0, snow).unwrap(),
        )
        .unwrap();
        let r = report(&grid, 0.5, 1495.0);
        assert!((r.delta_up - 0.05).abs() < 1e-12);
        assert!((r.delta_down - 0.03).abs() < 1e-12);
        assert!((r.upper_percentile - 0.55).abs() < 1e-12);
        assert!((r.lower_percentile - 0.47).abs() < 1e-12);
        assert!(r.bound.lower < r.bound.central);
        assert!(r.bound.central < r.bound.upper);
    }

    #[test]
    fn upper_percentile_clamps_to_max_elevation() {
        let elevation: Vec<f64> = (0..100).map(|i| 1000.0 + i as f64 * 10.0).collect();
        // Everything classified snow-free: delta_up = fraction above threshold.
        let snow = vec![SnowClass::SnowFree; 100];
        let grid = RasterGrid::new(
            Grid::new(10, 10, 30.0, elevation).unwrap(),
            Grid::new(10, 10, 30.0, snow).unwrap(),
        )
        .unwrap();
        // AAR 0.1 -> percentile 0.9; delta_up = 0.5 -> clipped to 1.0
        let r = report(&grid, 0.1, 1495.0);
        assert_eq!(r.upper_percentile, 1.0);
        assert_eq!(r.bound.upper, 1990.0);
    }

    #[test]
    fn lower_percentile_clamps_to_min_elevation() {
        let elevation: Vec<f64> = (0..100).map(|i| 1000.0 + i as f64 * 10.0).collect();
        let snow = vec![SnowClass::SnowCovered; 100];
        let grid = RasterGrid::new(
            Grid::new(10, 10, 30.0, elevation).unwrap(),
            Grid::new(10, 10, 30.0, snow).unwrap(),
        )
        .unwrap();
        let r = report(&grid, 0.9, 1495.0);
        assert_eq!(r.lower_percentile, 0.0);
        assert_eq!(r.bound.lower, 1000.0);
    }

    #[test]
    fn no_valid_area_is_not_available() {
        let grid = RasterGrid::new(
            Grid::new(2, 2, 30.0, vec![f64::NAN; 4]).unwrap(),
            Grid::new(2, 2, 30.0, vec![SnowClass::SnowFree; 4]).unwrap(),
        )
        .unwrap();
        let result = SlaBoundEstimator::new(0.5, 1000.0)
            .unwrap()
            .estimate(&grid)
            .unwrap();
        assert_eq!(result.reason(), Some(Unavailable::NoValidArea));
    }

    #[test]
    fn invalid_aar_rejected() {
        assert!(matches!(
            SlaBoundEstimator::new(1.2, 1000.0),
            Err(RasterError::InvalidAar { .. })
        ));
        assert!(SlaBoundEstimator::new(f64::NAN, 1000.0).is_err());
        assert!(SlaBoundEstimator::new(0.5, f64::INFINITY).is_err());
    }

    #[test]
    fn adjust_percentiles_clips_both_ends() {
        assert_eq!(adjust_percentiles(0.9, 0.3, 0.0), (0.9, 1.0));
        assert_eq!(adjust_percentiles(0.1, 0.0, 0.4), (0.0, 0.1));
    }
}
