//! ESRI ASCII grid reader for DEMs and snow-cover masks.

use std::path::{Path, PathBuf};

use snowline_raster::{Grid, RasterGrid, SnowClass, mask_no_data};
use tracing::{debug, info, instrument};

use crate::IoError;

/// Georeferencing read from an ASCII grid header.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridHeader {
    pub ncols: usize,
    pub nrows: usize,
    /// X of the lower-left corner (or center, see `centered`).
    pub xll: f64,
    /// Y of the lower-left corner (or center, see `centered`).
    pub yll: f64,
    /// `true` when the header used `xllcenter`/`yllcenter`.
    pub centered: bool,
    pub cell_size: f64,
    pub no_data: Option<f64>,
}

/// Reads an ESRI ASCII grid (`.asc`).
///
/// Header keys are case-insensitive: `ncols`, `nrows`, `xllcorner` or
/// `xllcenter`, `yllcorner` or `yllcenter`, `cellsize`, and optional
/// `NODATA_value`. The body holds `nrows * ncols` whitespace-separated
/// values, top row first. Cells equal to `NODATA_value` become NaN.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`IoError::FileNotFound`] | File doesn't exist or is unreadable |
/// | [`IoError::InvalidGridHeader`] | Missing or unparseable header key |
/// | [`IoError::InvalidGridValue`] | Body token is not a number |
/// | [`IoError::GridCellCount`] | Body size differs from `nrows * ncols` |
/// | [`IoError::Raster`] | Header describes an invalid grid |
pub struct AsciiGridReader {
    path: PathBuf,
}

impl AsciiGridReader {
    /// Create a new reader for the given grid file path.
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    /// Read raw values with no-data cells set to NaN.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn read(&self) -> Result<(GridHeader, Grid<f64>), IoError> {
        let text = std::fs::read_to_string(&self.path).map_err(|e| IoError::FileNotFound {
            path: self.path.clone(),
            source: e,
        })?;

        let mut tokens = text.split_whitespace().peekable();
        let mut keys: Vec<(String, String)> = Vec::new();
        while let Some(token) = tokens.peek() {
            if !token.starts_with(|c: char| c.is_ascii_alphabetic()) || is_special_float(token) {
                break;
            }
            let key = token.to_ascii_lowercase();
            tokens.next();
            let value = tokens.next().ok_or_else(|| self.header_error(format!("{key} has no value")))?;
            keys.push((key, value.to_string()));
        }
        let header = self.parse_header(&keys)?;
        debug!(nrows = header.nrows, ncols = header.ncols, cell_size = header.cell_size, "read grid header");

        let expected = header.nrows * header.ncols;
        let mut data = Vec::with_capacity(expected);
        for (cell_index, raw) in tokens.enumerate() {
            let value: f64 = raw.parse().map_err(|_| IoError::InvalidGridValue {
                path: self.path.clone(),
                cell_index,
                raw: raw.to_string(),
            })?;
            data.push(match header.no_data {
                Some(nd) if value == nd => f64::NAN,
                _ => value,
            });
        }
        if data.len() != expected {
            return Err(IoError::GridCellCount {
                path: self.path.clone(),
                expected,
                got: data.len(),
            });
        }

        let grid = Grid::new(header.nrows, header.ncols, header.cell_size, data).map_err(|e| {
            IoError::Raster {
                path: self.path.clone(),
                source: e,
            }
        })?;
        Ok((header, grid))
    }

    /// Read a DEM: no-data values and fill values are masked to NaN.
    pub fn read_elevation(&self) -> Result<Grid<f64>, IoError> {
        let (_, grid) = self.read()?;
        Ok(mask_no_data(grid))
    }

    /// Read a snow mask: `0` is snow-free, `1` snow-covered, anything else missing.
    pub fn read_snow(&self) -> Result<Grid<SnowClass>, IoError> {
        let (_, grid) = self.read()?;
        Ok(grid.map(|&v| SnowClass::from_value(v)))
    }

    fn header_error(&self, reason: String) -> IoError {
        IoError::InvalidGridHeader {
            path: self.path.clone(),
            reason,
        }
    }

    fn parse_header(&self, keys: &[(String, String)]) -> Result<GridHeader, IoError> {
        let lookup = |names: &[&str]| {
            keys.iter()
                .find(|(k, _)| names.contains(&k.as_str()))
                .map(|(k, v)| (k.as_str(), v.as_str()))
        };
        let require = |names: &[&str]| {
            lookup(names).ok_or_else(|| self.header_error(format!("missing {}", names.join(" or "))))
        };
        let float = |(key, raw): (&str, &str)| {
            raw.parse::<f64>()
                .map_err(|_| self.header_error(format!("{key} = \"{raw}\" is not a number")))
        };
        let count = |(key, raw): (&str, &str)| {
            raw.parse::<usize>()
                .map_err(|_| self.header_error(format!("{key} = \"{raw}\" is not a count")))
        };

        let (x_key, _) = require(&["xllcorner", "xllcenter"])?;
        Ok(GridHeader {
            ncols: count(require(&["ncols"])?)?,
            nrows: count(require(&["nrows"])?)?,
            xll: float(require(&["xllcorner", "xllcenter"])?)?,
            yll: float(require(&["yllcorner", "yllcenter"])?)?,
            centered: x_key == "xllcenter",
            cell_size: float(require(&["cellsize"])?)?,
            no_data: lookup(&["nodata_value"]).map(float).transpose()?,
        })
    }
}

fn is_special_float(token: &str) -> bool {
    matches!(token.to_ascii_lowercase().as_str(), "nan" | "inf" | "infinity")
}

/// Load a DEM and a snow mask into a co-registered [`RasterGrid`].
///
/// # Errors
///
/// Any [`AsciiGridReader`] error, or [`IoError::Raster`] if the two grids
/// differ in shape or cell size.
#[instrument(skip_all, fields(dem = %dem.display(), snow = %snow.display()))]
pub fn load_raster(dem: &Path, snow: &Path) -> Result<RasterGrid, IoError> {
    let elevation = AsciiGridReader::new(dem).read_elevation()?;
    let snow_cover = AsciiGridReader::new(snow).read_snow()?;
    let grid = RasterGrid::new(elevation, snow_cover).map_err(|e| IoError::Raster {
        path: snow.to_path_buf(),
        source: e,
    })?;
    info!(
        nrows = grid.elevation().nrows(),
        ncols = grid.elevation().ncols(),
        "raster pair loaded"
    );
    Ok(grid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_grid(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f.flush().unwrap();
        f
    }

    const DEM: &str = "ncols 3\nnrows 2\nxllcorner 100.0\nyllcorner 200.0\ncellsize 30\nNODATA_value -9999\n2500 2600 -9999\n2700 3.4e38 2900\n";

    #[test]
    fn reads_header_and_values() {
        let f = write_grid(DEM);
        let (header, grid) = AsciiGridReader::new(f.path()).read().unwrap();
        assert_eq!((header.nrows, header.ncols), (2, 3));
        assert_eq!(header.cell_size, 30.0);
        assert_eq!(header.no_data, Some(-9999.0));
        assert!(!header.centered);
        assert_eq!(grid.data()[0], 2500.0);
        assert!(grid.data()[2].is_nan());
        assert_eq!(grid.data()[4], 3.4e38);
    }

    #[test]
    fn elevation_masks_fill_values() {
        let f = write_grid(DEM);
        let dem = AsciiGridReader::new(f.path()).read_elevation().unwrap();
        assert!(dem.data()[4].is_nan());
        assert_eq!(dem.data()[5], 2900.0);
    }

    #[test]
    fn snow_mask_classes() {
        let f = write_grid("NCOLS 2\nNROWS 2\nXLLCENTER 0\nYLLCENTER 0\nCELLSIZE 10\n0 1\n2 -1\n");
        let snow = AsciiGridReader::new(f.path()).read_snow().unwrap();
        assert_eq!(
            snow.data(),
            &[
                SnowClass::SnowFree,
                SnowClass::SnowCovered,
                SnowClass::Missing,
                SnowClass::Missing
            ]
        );
    }

    #[test]
    fn missing_header_key() {
        let f = write_grid("ncols 2\nnrows 1\nxllcorner 0\nyllcorner 0\n1 2\n");
        let err = AsciiGridReader::new(f.path()).read().unwrap_err();
        assert!(matches!(err, IoError::InvalidGridHeader { reason, .. } if reason.contains("cellsize")));
    }

    #[test]
    fn wrong_cell_count() {
        let f = write_grid("ncols 2\nnrows 2\nxllcorner 0\nyllcorner 0\ncellsize 1\n1 2 3\n");
        let err = AsciiGridReader::new(f.path()).read().unwrap_err();
        assert!(matches!(err, IoError::GridCellCount { expected: 4, got: 3, .. }));
    }

    #[test]
    fn bad_body_token() {
        let f = write_grid("ncols 2\nnrows 1\nxllcorner 0\nyllcorner 0\ncellsize 1\n1 x\n");
        let err = AsciiGridReader::new(f.path()).read().unwrap_err();
        assert!(matches!(err, IoError::InvalidGridValue { cell_index: 1, .. }));
    }

    #[test]
    fn mismatched_pair_rejected() {
        let dem = write_grid("ncols 2\nnrows 1\nxllcorner 0\nyllcorner 0\ncellsize 1\n1 2\n");
        let snow = write_grid("ncols 1\nnrows 2\nxllcorner 0\nyllcorner 0\ncellsize 1\n0\n1\n");
        let err = load_raster(dem.path(), snow.path()).unwrap_err();
        assert!(matches!(err, IoError::Raster { .. }));
    }
}
