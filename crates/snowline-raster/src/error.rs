/// Errors from raster construction and snowline bound estimation.
///
/// These are input-contract violations. Degenerate data (no valid cells,
/// an all-missing DEM) is reported through [`Estimate`](crate::Estimate)
/// instead.
#[derive(Debug, thiserror::Error)]
pub enum RasterError {
    /// Returned when a grid's data length does not match `nrows * ncols`.
    #[error("grid data has {got} cells, expected {nrows} x {ncols} = {expected}")]
    DataLengthMismatch {
        /// Number of rows declared.
        nrows: usize,
        /// Number of columns declared.
        ncols: usize,
        /// Expected cell count.
        expected: usize,
        /// Actual number of values supplied.
        got: usize,
    },

    /// Returned when the cell size is zero, negative, or not finite.
    #[error("cell size must be finite and positive, got {cell_size}")]
    InvalidCellSize {
        /// The invalid cell size.
        cell_size: f64,
    },

    /// Returned when the elevation and snow grids have different shapes.
    #[error("grid shape mismatch: elevation is {elevation:?}, snow cover is {snow:?}")]
    ShapeMismatch {
        /// `(nrows, ncols)` of the elevation grid.
        elevation: (usize, usize),
        /// `(nrows, ncols)` of the snow-cover grid.
        snow: (usize, usize),
    },

    /// Returned when the elevation and snow grids have different cell sizes.
    #[error("cell size mismatch: elevation is {elevation}, snow cover is {snow}")]
    CellSizeMismatch {
        /// Cell size of the elevation grid.
        elevation: f64,
        /// Cell size of the snow-cover grid.
        snow: f64,
    },

    /// Returned when the accumulation-area ratio is outside `[0, 1]` or not finite.
    #[error("AAR must be a finite value in [0, 1], got {aar}")]
    InvalidAar {
        /// The invalid AAR value.
        aar: f64,
    },

    /// Returned when the snowline threshold is NaN or infinite.
    #[error("snowline threshold must be finite, got {threshold}")]
    NonFiniteThreshold {
        /// The invalid threshold.
        threshold: f64,
    },
}
