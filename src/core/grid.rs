use crate::core::stats::GridStats;
use crate::types::{GeoTransform, GridError, GridGeometry, GridResult, DEFAULT_NODATA};
use ndarray::{Array2, Zip};
use num_traits::ToPrimitive;

/// Default co-registration tolerance: exact match
pub const EXACT: f64 = 0.0;

/// Dense 2D raster of `f64` samples with georeferencing and a nodata sentinel.
///
/// Grids are immutable once built. Every operation in this crate returns a
/// new grid and never mutates its inputs.
#[derive(Debug, Clone)]
pub struct Grid {
    geometry: GridGeometry,
    nodata: f64,
    values: Array2<f64>,
}

impl Grid {
    /// Wrap an existing `(rows, cols)` array
    pub fn new(geometry: GridGeometry, nodata: f64, values: Array2<f64>) -> GridResult<Self> {
        geometry.validate()?;
        if values.dim() != geometry.dim() {
            return Err(GridError::InvalidParameter(format!(
                "Value array is {:?} but geometry is {}x{}",
                values.dim(),
                geometry.height,
                geometry.width
            )));
        }
        Ok(Self {
            geometry,
            nodata,
            values,
        })
    }

    /// Build from row-major values; `values.len()` must equal `width * height`
    pub fn from_vec(geometry: GridGeometry, nodata: f64, values: Vec<f64>) -> GridResult<Self> {
        geometry.validate()?;
        if values.len() != geometry.len() {
            return Err(GridError::InvalidParameter(format!(
                "Expected {} values for a {}x{} grid, got {}",
                geometry.len(),
                geometry.width,
                geometry.height,
                values.len()
            )));
        }
        let values = Array2::from_shape_vec(geometry.dim(), values)
            .map_err(|e| GridError::InvalidParameter(e.to_string()))?;
        Ok(Self {
            geometry,
            nodata,
            values,
        })
    }

    /// Grid with every cell set to `value`
    pub fn filled(geometry: GridGeometry, value: f64, nodata: f64) -> GridResult<Self> {
        geometry.validate()?;
        Ok(Self {
            geometry,
            nodata,
            values: Array2::from_elem(geometry.dim(), value),
        })
    }

    /// Build a grid by evaluating `f(row, col)` for every cell
    pub fn from_fn<F>(geometry: GridGeometry, nodata: f64, f: F) -> GridResult<Self>
    where
        F: Fn(usize, usize) -> f64 + Sync,
    {
        geometry.validate()?;
        Ok(Self {
            geometry,
            nodata,
            values: fill_cells(geometry.dim(), f),
        })
    }

    /// Import a band of any primitive numeric type (e.g. `u16` reflectance).
    ///
    /// Cells equal to `band_nodata` or not representable as `f64` become
    /// nodata. The grid keeps the band's sentinel when it converts cleanly,
    /// otherwise [`DEFAULT_NODATA`].
    pub fn from_band<T>(geometry: GridGeometry, band: &Array2<T>, band_nodata: Option<T>) -> GridResult<Self>
    where
        T: ToPrimitive + Copy + PartialEq + Sync,
    {
        geometry.validate()?;
        if band.dim() != geometry.dim() {
            return Err(GridError::InvalidParameter(format!(
                "Band is {:?} but geometry is {}x{}",
                band.dim(),
                geometry.height,
                geometry.width
            )));
        }

        let nodata = band_nodata
            .and_then(|v| v.to_f64())
            .filter(|v| v.is_finite())
            .unwrap_or(DEFAULT_NODATA);

        let values = fill_cells(geometry.dim(), |row, col| {
            let raw = band[[row, col]];
            if Some(raw) == band_nodata {
                return nodata;
            }
            match raw.to_f64() {
                Some(v) if v.is_finite() => v,
                _ => nodata,
            }
        });

        Ok(Self {
            geometry,
            nodata,
            values,
        })
    }

    pub fn geometry(&self) -> &GridGeometry {
        &self.geometry
    }

    pub fn transform(&self) -> &GeoTransform {
        &self.geometry.transform
    }

    pub fn width(&self) -> usize {
        self.geometry.width
    }

    pub fn height(&self) -> usize {
        self.geometry.height
    }

    /// `(rows, cols)`
    pub fn dim(&self) -> (usize, usize) {
        self.geometry.dim()
    }

    pub fn nodata(&self) -> f64 {
        self.nodata
    }

    /// Raw samples, nodata cells included
    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    pub fn into_values(self) -> Array2<f64> {
        self.values
    }

    /// True if `value` is this grid's sentinel or NaN
    pub fn is_nodata_value(&self, value: f64) -> bool {
        value.is_nan() || value == self.nodata
    }

    /// Value at `(row, col)`, `Ok(None)` for nodata
    pub fn get(&self, row: usize, col: usize) -> GridResult<Option<f64>> {
        if !self.geometry.contains_index(row, col) {
            return Err(GridError::OutOfBounds {
                row,
                col,
                height: self.height(),
                width: self.width(),
            });
        }
        Ok(self.valid(row, col))
    }

    /// Unchecked lookup for in-range indices
    pub(crate) fn valid(&self, row: usize, col: usize) -> Option<f64> {
        let v = self.values[[row, col]];
        (!self.is_nodata_value(v)).then_some(v)
    }

    pub fn is_nodata(&self, row: usize, col: usize) -> GridResult<bool> {
        Ok(self.get(row, col)?.is_none())
    }

    /// Value of the cell containing world point `(x, y)`
    pub fn sample_at(&self, x: f64, y: f64) -> Option<f64> {
        let (row, col) = self.geometry.cell_at(x, y)?;
        self.valid(row, col)
    }

    /// Apply `f` to every valid cell. Nodata stays nodata and a non-finite
    /// result becomes nodata.
    pub fn map<F>(&self, f: F) -> Grid
    where
        F: Fn(f64) -> f64 + Sync,
    {
        Grid::collect_cells(self.geometry, self.nodata, |row, col| self.valid(row, col).map(&f))
    }

    /// Combine two co-registered grids cell by cell (exact georeferencing match)
    pub fn zip_with<F>(&self, other: &Grid, f: F) -> GridResult<Grid>
    where
        F: Fn(f64, f64) -> f64 + Sync,
    {
        self.zip_with_tolerance(other, EXACT, f)
    }

    /// Like [`Grid::zip_with`] with an explicit georeferencing tolerance.
    ///
    /// The output takes this grid's geometry and nodata sentinel (NaN if a
    /// valid result equals that sentinel). A cell is nodata if either input
    /// is nodata there or `f` is non-finite.
    pub fn zip_with_tolerance<F>(&self, other: &Grid, tolerance: f64, f: F) -> GridResult<Grid>
    where
        F: Fn(f64, f64) -> f64 + Sync,
    {
        self.geometry.ensure_coregistered(&other.geometry, tolerance)?;

        Ok(Grid::collect_cells(self.geometry, self.nodata, |row, col| {
            match (self.valid(row, col), other.valid(row, col)) {
                (Some(a), Some(b)) => Some(f(a, b)),
                _ => None,
            }
        }))
    }

    /// Same data under a different sentinel; existing nodata cells are rewritten.
    ///
    /// Valid cells already equal to `nodata` become nodata too.
    pub fn with_nodata(&self, nodata: f64) -> Grid {
        let values = fill_cells(self.dim(), |row, col| self.valid(row, col).unwrap_or(nodata));
        Grid {
            geometry: self.geometry,
            nodata,
            values,
        }
    }

    /// Same values on a different geometry of identical shape
    pub fn with_geometry(&self, geometry: GridGeometry) -> GridResult<Grid> {
        Grid::new(geometry, self.nodata, self.values.clone())
    }

    /// Valid samples in row-major order
    pub fn iter_valid(&self) -> impl Iterator<Item = f64> + '_ {
        self.values.iter().copied().filter(move |v| !self.is_nodata_value(*v))
    }

    pub fn valid_count(&self) -> usize {
        self.iter_valid().count()
    }

    /// Summary statistics over valid cells, `None` if every cell is nodata
    pub fn statistics(&self) -> Option<GridStats> {
        GridStats::from_grid(self)
    }

    /// Build a derived grid from per-cell results, `None` meaning nodata.
    ///
    /// Non-finite results are nodata. The grid keeps `nodata` as its sentinel
    /// unless a valid result equals it, in which case the sentinel becomes NaN
    /// so that result still reads as data. `geometry` must already be valid.
    pub(crate) fn collect_cells<F>(geometry: GridGeometry, nodata: f64, f: F) -> Grid
    where
        F: Fn(usize, usize) -> Option<f64> + Sync,
    {
        let mut values = fill_cells(geometry.dim(), |row, col| match f(row, col) {
            Some(v) if v.is_finite() => v,
            _ => f64::NAN,
        });

        if nodata.is_nan() {
            return Grid {
                geometry,
                nodata,
                values,
            };
        }

        if values.iter().any(|&v| v == nodata) {
            log::warn!(
                "Valid results equal the nodata sentinel {}, using NaN as nodata instead",
                nodata
            );
            return Grid {
                geometry,
                nodata: f64::NAN,
                values,
            };
        }

        values.mapv_inplace(|v| if v.is_nan() { nodata } else { v });
        Grid {
            geometry,
            nodata,
            values,
        }
    }
}

/// Evaluate `f(row, col)` for every cell of a `(rows, cols)` array.
///
/// Cells are independent, so with the `parallel` feature they are computed
/// on the rayon pool.
pub(crate) fn fill_cells<F>(dim: (usize, usize), f: F) -> Array2<f64>
where
    F: Fn(usize, usize) -> f64 + Sync,
{
    let mut out = Array2::<f64>::zeros(dim);

    #[cfg(feature = "parallel")]
    Zip::indexed(&mut out).par_for_each(|(row, col), v| *v = f(row, col));

    #[cfg(not(feature = "parallel"))]
    Zip::indexed(&mut out).for_each(|(row, col), v| *v = f(row, col));

    out
}
