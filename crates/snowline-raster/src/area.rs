//! Pixel-count areas of snow misclassification relative to a snowline threshold.

use serde::Serialize;
use tracing::{debug, instrument};

use crate::error::RasterError;
use crate::grid::{RasterGrid, SnowClass};

/// A cell count and its ground area, `count * dx²`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AreaStatistic {
    /// Number of matching cells.
    pub count: usize,
    /// Ground area of the matching cells.
    pub area: f64,
}

impl AreaStatistic {
    fn from_count(count: usize, cell_area: f64) -> Self {
        Self {
            count,
            area: count as f64 * cell_area,
        }
    }
}

/// Misclassification areas of one classified image against a snowline threshold.
///
/// A cell contributes only when both its elevation and its classification are
/// present. Comparisons against the threshold are strict, so cells lying
/// exactly on the threshold count toward the valid area only.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AreaStatistics {
    /// Elevation threshold the cells were compared against.
    pub threshold: f64,
    /// Snow-free cells with elevation above the threshold.
    pub snow_free_above: AreaStatistic,
    /// Snow-covered cells with elevation below the threshold.
    pub snow_covered_below: AreaStatistic,
    /// All cells with both inputs present.
    pub total_valid: AreaStatistic,
}

impl AreaStatistics {
    /// Count misclassified and valid cells of `grid` relative to `threshold`.
    ///
    /// A grid with no valid cells is not an error: every area is zero and
    /// [`has_valid_area`](Self::has_valid_area) returns `false`.
    ///
    /// # Errors
    ///
    /// Returns [`RasterError::NonFiniteThreshold`] if `threshold` is NaN or infinite.
    #[instrument(skip(grid), fields(shape = ?grid.elevation().shape()))]
    pub fn compute(grid: &RasterGrid, threshold: f64) -> Result<Self, RasterError> {
        if !threshold.is_finite() {
            return Err(RasterError::NonFiniteThreshold { threshold });
        }

        let (mut free_above, mut covered_below, mut valid) = (0usize, 0usize, 0usize);
        for (z, class) in grid.valid_cells() {
            valid += 1;
            match class {
                SnowClass::SnowFree if z > threshold => free_above += 1,
                SnowClass::SnowCovered if z < threshold => covered_below += 1,
                _ => {}
            }
        }

        let cell_area = grid.cell_area();
        let stats = Self {
            threshold,
            snow_free_above: AreaStatistic::from_count(free_above, cell_area),
            snow_covered_below: AreaStatistic::from_count(covered_below, cell_area),
            total_valid: AreaStatistic::from_count(valid, cell_area),
        };

        debug!(
            valid_cells = valid,
            snow_free_above = free_above,
            snow_covered_below = covered_below,
            total_area = stats.total_valid.area,
            "area statistics computed"
        );

        Ok(stats)
    }

    /// Return `true` if at least one cell has both inputs present.
    #[must_use]
    pub fn has_valid_area(&self) -> bool {
        self.total_valid.count > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Grid;

    fn raster(elevation: Vec<f64>, snow: Vec<SnowClass>, dx: f64) -> RasterGrid {
        let n = elevation.len();
        RasterGrid::new(
            Grid::new(1, n, dx, elevation).unwrap(),
            Grid::new(1, n, dx, snow).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn counts_both_error_predicates() {
        use SnowClass::*;
        let grid = raster(
            vec![100.0, 200.0, 300.0, 400.0, 500.0],
            vec![SnowCovered, SnowFree, SnowCovered, SnowFree, SnowCovered],
            10.0,
        );
        let stats = AreaStatistics::compute(&grid, 300.0).unwrap();
        // snow-free above 300: only 400
        assert_eq!(stats.snow_free_above.count, 1);
        // snow-covered below 300: only 100
        assert_eq!(stats.snow_covered_below.count, 1);
        assert_eq!(stats.total_valid.count, 5);
        assert_eq!(stats.total_valid.area, 500.0);
        assert_eq!(stats.snow_free_above.area, 100.0);
    }

    #[test]
    fn missing_cells_excluded_everywhere() {
        use SnowClass::*;
        let grid = raster(
            vec![f64::NAN, 900.0, 50.0, 60.0],
            vec![SnowFree, Missing, SnowCovered, SnowFree],
            2.0,
        );
        let stats = AreaStatistics::compute(&grid, 500.0).unwrap();
        assert_eq!(stats.total_valid.count, 2);
        assert_eq!(stats.snow_free_above.count, 0);
        assert_eq!(stats.snow_covered_below.count, 1);
        assert_eq!(stats.snow_covered_below.area, 4.0);
    }

    #[test]
    fn zero_valid_area_is_not_an_error() {
        let grid = raster(vec![f64::NAN; 3], vec![SnowClass::SnowFree; 3], 30.0);
        let stats = AreaStatistics::compute(&grid, 1000.0).unwrap();
        assert!(!stats.has_valid_area());
        assert_eq!(stats.total_valid.area, 0.0);
    }

    #[test]
    fn non_finite_threshold_rejected() {
        let grid = raster(vec![1.0], vec![SnowClass::SnowFree], 1.0);
        assert!(matches!(
            AreaStatistics::compute(&grid, f64::NAN),
            Err(RasterError::NonFiniteThreshold { .. })
        ));
    }
}
