use serde::{Deserialize, Serialize};

/// Default nodata sentinel for derived grids
pub const DEFAULT_NODATA: f64 = -9999.0;

/// Affine georeferencing for a north-up grid (no rotation)
///
/// The origin is the upper-left corner of the upper-left cell. Rows grow
/// southward, so the center of cell `(row, col)` lies at
/// `(origin_x + (col + 0.5) * cellsize_x, origin_y - (row + 0.5) * cellsize_y)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    pub origin_x: f64,
    pub origin_y: f64,
    pub cellsize_x: f64,   // map units, > 0
    pub cellsize_y: f64,   // map units, > 0
}

impl GeoTransform {
    /// Create a validated transform
    pub fn new(origin_x: f64, origin_y: f64, cellsize_x: f64, cellsize_y: f64) -> GridResult<Self> {
        let transform = Self {
            origin_x,
            origin_y,
            cellsize_x,
            cellsize_y,
        };
        transform.validate()?;
        Ok(transform)
    }

    /// Square cells anchored at the given origin
    pub fn square(origin_x: f64, origin_y: f64, cellsize: f64) -> GridResult<Self> {
        Self::new(origin_x, origin_y, cellsize, cellsize)
    }

    pub fn validate(&self) -> GridResult<()> {
        if !self.origin_x.is_finite() || !self.origin_y.is_finite() {
            return Err(GridError::InvalidParameter(format!(
                "Origin must be finite, got ({}, {})",
                self.origin_x, self.origin_y
            )));
        }
        if !(self.cellsize_x.is_finite() && self.cellsize_x > 0.0)
            || !(self.cellsize_y.is_finite() && self.cellsize_y > 0.0)
        {
            return Err(GridError::InvalidParameter(format!(
                "Cell size must be positive, got ({}, {})",
                self.cellsize_x, self.cellsize_y
            )));
        }
        Ok(())
    }

    /// World coordinates of a cell center
    pub fn cell_center(&self, row: usize, col: usize) -> (f64, f64) {
        let x = self.origin_x + (col as f64 + 0.5) * self.cellsize_x;
        let y = self.origin_y - (row as f64 + 0.5) * self.cellsize_y;
        (x, y)
    }

    /// Continuous pixel coordinates `(col, row)` of a world point.
    ///
    /// Cell `(r, c)` covers `[c, c+1) x [r, r+1)` in this space, so its
    /// center sits at `(c + 0.5, r + 0.5)`.
    pub fn world_to_pixel(&self, x: f64, y: f64) -> (f64, f64) {
        let col = (x - self.origin_x) / self.cellsize_x;
        let row = (self.origin_y - y) / self.cellsize_y;
        (col, row)
    }

    /// Compare origin and cell size within an absolute tolerance
    pub fn approx_eq(&self, other: &GeoTransform, tolerance: f64) -> bool {
        approx::abs_diff_eq!(self.origin_x, other.origin_x, epsilon = tolerance)
            && approx::abs_diff_eq!(self.origin_y, other.origin_y, epsilon = tolerance)
            && approx::abs_diff_eq!(self.cellsize_x, other.cellsize_x, epsilon = tolerance)
            && approx::abs_diff_eq!(self.cellsize_y, other.cellsize_y, epsilon = tolerance)
    }
}

/// World-coordinate bounding box of a grid
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

/// Shape plus georeferencing of a grid.
///
/// This is also the resampling target: origin, cell size and extent
/// (through width and height).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridGeometry {
    pub width: usize,
    pub height: usize,
    pub transform: GeoTransform,
}

impl GridGeometry {
    pub fn new(width: usize, height: usize, transform: GeoTransform) -> GridResult<Self> {
        let geometry = Self {
            width,
            height,
            transform,
        };
        geometry.validate()?;
        Ok(geometry)
    }

    pub fn validate(&self) -> GridResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(GridError::InvalidParameter(format!(
                "Grid dimensions must be non-zero, got {}x{}",
                self.width, self.height
            )));
        }
        self.transform.validate()
    }

    /// Number of cells
    pub fn len(&self) -> usize {
        self.width * self.height
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `(rows, cols)` as used by ndarray
    pub fn dim(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    pub fn extent(&self) -> Extent {
        let t = &self.transform;
        Extent {
            min_x: t.origin_x,
            max_x: t.origin_x + self.width as f64 * t.cellsize_x,
            min_y: t.origin_y - self.height as f64 * t.cellsize_y,
            max_y: t.origin_y,
        }
    }

    pub fn cell_center(&self, row: usize, col: usize) -> (f64, f64) {
        self.transform.cell_center(row, col)
    }

    pub fn contains_index(&self, row: usize, col: usize) -> bool {
        row < self.height && col < self.width
    }

    /// Index of the cell containing a world point, if any
    pub fn cell_at(&self, x: f64, y: f64) -> Option<(usize, usize)> {
        let (col, row) = self.transform.world_to_pixel(x, y);
        if !col.is_finite() || !row.is_finite() || col < 0.0 || row < 0.0 {
            return None;
        }
        let (row, col) = (row.floor() as usize, col.floor() as usize);
        self.contains_index(row, col).then_some((row, col))
    }

    /// Same shape and georeferencing within `tolerance`
    pub fn is_coregistered(&self, other: &GridGeometry, tolerance: f64) -> bool {
        self.width == other.width
            && self.height == other.height
            && self.transform.approx_eq(&other.transform, tolerance)
    }

    /// Fail with [`GridError::ShapeMismatch`] unless co-registered
    pub fn ensure_coregistered(&self, other: &GridGeometry, tolerance: f64) -> GridResult<()> {
        if self.is_coregistered(other, tolerance) {
            return Ok(());
        }
        Err(GridError::ShapeMismatch(format!(
            "{}x{} grid at ({}, {}) cell ({}, {}) vs {}x{} grid at ({}, {}) cell ({}, {})",
            self.width,
            self.height,
            self.transform.origin_x,
            self.transform.origin_y,
            self.transform.cellsize_x,
            self.transform.cellsize_y,
            other.width,
            other.height,
            other.transform.origin_x,
            other.transform.origin_y,
            other.transform.cellsize_x,
            other.transform.cellsize_y,
        )))
    }
}

/// Angular unit for slope, aspect and hillshade inputs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AngleUnit {
    #[default]
    Degrees,
    Radians,
}

impl AngleUnit {
    /// Convert a value expressed in radians into this unit
    pub fn from_radians(&self, radians: f64) -> f64 {
        match self {
            AngleUnit::Degrees => radians.to_degrees(),
            AngleUnit::Radians => radians,
        }
    }

    /// Convert a value expressed in this unit into radians
    pub fn to_radians(&self, value: f64) -> f64 {
        match self {
            AngleUnit::Degrees => value.to_radians(),
            AngleUnit::Radians => value,
        }
    }
}

/// Error types for grid processing
#[derive(Debug, thiserror::Error)]
pub enum GridError {
    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("Cell ({row}, {col}) is outside a {height}x{width} grid")]
    OutOfBounds {
        row: usize,
        col: usize,
        height: usize,
        width: usize,
    },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for grid operations
pub type GridResult<T> = Result<T, GridError>;
