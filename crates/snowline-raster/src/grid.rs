//! Row-major raster grids and the co-registered DEM / snow-mask pair.

use serde::{Deserialize, Serialize};

use crate::error::RasterError;

/// Snow classification of a single cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SnowClass {
    /// Classified as snow-free (mask value 0).
    SnowFree,
    /// Classified as snow-covered (mask value 1).
    SnowCovered,
    /// Outside the area of interest or unclassified.
    Missing,
}

impl SnowClass {
    /// Map a raw mask value to a class: `0` is snow-free, `1` is snow-covered,
    /// anything else (including NaN) is missing.
    #[must_use]
    pub fn from_value(value: f64) -> Self {
        if value == 0.0 {
            Self::SnowFree
        } else if value == 1.0 {
            Self::SnowCovered
        } else {
            Self::Missing
        }
    }

    /// Return `true` unless the cell is [`SnowClass::Missing`].
    #[must_use]
    pub fn is_valid(self) -> bool {
        self != Self::Missing
    }
}

/// A 2D raster stored row-major with square cells of side `cell_size`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grid<T> {
    nrows: usize,
    ncols: usize,
    cell_size: f64,
    data: Vec<T>,
}

impl<T> Grid<T> {
    /// Create a grid from row-major data.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`RasterError::DataLengthMismatch`] | `data.len() != nrows * ncols` |
    /// | [`RasterError::InvalidCellSize`] | `cell_size` is not finite and positive |
    pub fn new(nrows: usize, ncols: usize, cell_size: f64, data: Vec<T>) -> Result<Self, RasterError> {
        let expected = nrows * ncols;
        if data.len() != expected {
            return Err(RasterError::DataLengthMismatch {
                nrows,
                ncols,
                expected,
                got: data.len(),
            });
        }
        if !cell_size.is_finite() || cell_size <= 0.0 {
            return Err(RasterError::InvalidCellSize { cell_size });
        }
        Ok(Self {
            nrows,
            ncols,
            cell_size,
            data,
        })
    }

    #[must_use]
    pub fn nrows(&self) -> usize {
        self.nrows
    }

    #[must_use]
    pub fn ncols(&self) -> usize {
        self.ncols
    }

    /// Return `(nrows, ncols)`.
    #[must_use]
    pub fn shape(&self) -> (usize, usize) {
        (self.nrows, self.ncols)
    }

    /// Ground length of one cell side, `dx`.
    #[must_use]
    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    /// Ground area of one cell, `dx²`.
    #[must_use]
    pub fn cell_area(&self) -> f64 {
        self.cell_size * self.cell_size
    }

    /// Borrow the row-major cell values.
    #[must_use]
    pub fn data(&self) -> &[T] {
        &self.data
    }

    /// Mutably borrow the row-major cell values.
    pub fn data_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Return the cell at `(row, col)`, or `None` if out of bounds.
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> Option<&T> {
        if row >= self.nrows || col >= self.ncols {
            return None;
        }
        self.data.get(row * self.ncols + col)
    }

    /// Map every cell to a new value, keeping shape and cell size.
    #[must_use]
    pub fn map<U>(&self, f: impl FnMut(&T) -> U) -> Grid<U> {
        Grid {
            nrows: self.nrows,
            ncols: self.ncols,
            cell_size: self.cell_size,
            data: self.data.iter().map(f).collect(),
        }
    }
}

/// A DEM and a snow-cover classification over the same grid.
///
/// Elevation cells holding NaN are missing. The pair is validated on
/// construction and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct RasterGrid {
    elevation: Grid<f64>,
    snow: Grid<SnowClass>,
}

impl RasterGrid {
    /// Pair an elevation grid with a snow-cover grid.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`RasterError::ShapeMismatch`] | grids differ in `(nrows, ncols)` |
    /// | [`RasterError::CellSizeMismatch`] | grids differ in cell size |
    pub fn new(elevation: Grid<f64>, snow: Grid<SnowClass>) -> Result<Self, RasterError> {
        if elevation.shape() != snow.shape() {
            return Err(RasterError::ShapeMismatch {
                elevation: elevation.shape(),
                snow: snow.shape(),
            });
        }
        if (elevation.cell_size() - snow.cell_size()).abs() > f64::EPSILON * elevation.cell_size() {
            return Err(RasterError::CellSizeMismatch {
                elevation: elevation.cell_size(),
                snow: snow.cell_size(),
            });
        }
        Ok(Self { elevation, snow })
    }

    #[must_use]
    pub fn elevation(&self) -> &Grid<f64> {
        &self.elevation
    }

    #[must_use]
    pub fn snow(&self) -> &Grid<SnowClass> {
        &self.snow
    }

    /// Ground area of one cell, `dx²`.
    #[must_use]
    pub fn cell_area(&self) -> f64 {
        self.elevation.cell_area()
    }

    /// Iterate `(elevation, class)` pairs for cells where both inputs are present.
    /// Infinite elevations count as missing.
    pub fn valid_cells(&self) -> impl Iterator<Item = (f64, SnowClass)> + '_ {
        self.elevation
            .data()
            .iter()
            .zip(self.snow.data())
            .filter(|&(z, class)| z.is_finite() && class.is_valid())
            .map(|(&z, &class)| (z, class))
    }

    /// Iterate every finite elevation value, regardless of classification.
    pub fn valid_elevations(&self) -> impl Iterator<Item = f64> + '_ {
        self.elevation.data().iter().copied().filter(|z| z.is_finite())
    }
}
