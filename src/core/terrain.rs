//! Terrain derivatives from elevation grids: slope, aspect and hillshade.
//!
//! Gradients use Horn's 3x3 kernel. Where the full neighbourhood is not
//! available (grid edges, nodata neighbours) the kernel is reduced: every
//! row/column difference becomes one-sided or is dropped, and the remaining
//! differences keep Horn's 1-2-1 weighting. A planar surface therefore has
//! the same slope at the edges as in the interior.

use crate::core::grid::{fill_cells, Grid};
use crate::types::{AngleUnit, GridError, GridResult, DEFAULT_NODATA};
use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, TAU};

/// Aspect value assigned to flat cells (outside both [0, 360) and [0, 2π))
pub const FLAT_ASPECT: f64 = -1.0;

/// Gradient magnitude below which a cell counts as flat
pub const FLAT_THRESHOLD: f64 = 1e-10;

/// Parameters for slope computation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SlopeParams {
    pub units: AngleUnit,
    /// Multiplier applied to elevations (e.g. feet to meters)
    pub z_factor: f64,
}

impl Default for SlopeParams {
    fn default() -> Self {
        Self {
            units: AngleUnit::Degrees,
            z_factor: 1.0,
        }
    }
}

/// Parameters for aspect computation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AspectParams {
    pub units: AngleUnit,
}

/// Parameters for hillshading
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HillshadeParams {
    /// Sun azimuth in degrees, clockwise from north
    pub azimuth: f64,
    /// Sun altitude above the horizon in degrees (0-90)
    pub altitude: f64,
    /// Unit of the slope and aspect grids passed in
    pub input_units: AngleUnit,
}

impl Default for HillshadeParams {
    fn default() -> Self {
        Self {
            azimuth: 315.0,     // NW illumination
            altitude: 45.0,
            input_units: AngleUnit::Radians,
        }
    }
}

impl HillshadeParams {
    pub fn validate(&self) -> GridResult<()> {
        if !self.azimuth.is_finite() {
            return Err(GridError::InvalidParameter(format!(
                "Sun azimuth must be finite, got {}",
                self.azimuth
            )));
        }
        if !(0.0..=90.0).contains(&self.altitude) {
            return Err(GridError::InvalidParameter(format!(
                "Sun altitude must be within [0, 90] degrees, got {}",
                self.altitude
            )));
        }
        Ok(())
    }
}

/// Surface gradient at one cell, elevation units per map unit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gradient {
    /// dz/dx, positive when elevation rises eastward
    pub east: f64,
    /// dz/dy, positive when elevation rises northward
    pub north: f64,
}

impl Gradient {
    pub fn magnitude(&self) -> f64 {
        self.east.hypot(self.north)
    }

    /// Slope angle in radians
    pub fn slope(&self) -> f64 {
        self.magnitude().atan()
    }

    /// Compass bearing of steepest descent in radians, `None` on flat ground
    pub fn aspect(&self) -> Option<f64> {
        if self.magnitude() < FLAT_THRESHOLD {
            return None;
        }
        let bearing = (-self.east).atan2(-self.north);
        let bearing = if bearing < 0.0 { bearing + TAU } else { bearing };
        Some(if bearing >= TAU { 0.0 } else { bearing })
    }
}

/// Horn gradient at `(row, col)` with the reduced-kernel edge policy.
///
/// `None` if the center is nodata or no difference can be formed in either
/// direction (e.g. a 1x1 grid). A direction with no usable difference counts
/// as level.
pub fn gradient_at(dem: &Grid, row: usize, col: usize, z_factor: f64) -> Option<Gradient> {
    dem.valid(row, col)?;

    let (height, width) = dem.dim();
    let cell = |dr: isize, dc: isize| -> Option<f64> {
        let r = row.checked_add_signed(dr)?;
        let c = col.checked_add_signed(dc)?;
        if r >= height || c >= width {
            return None;
        }
        dem.valid(r, c)
    };

    // per-cell differences across the west->east and north->south axes
    let along_x = weighted_difference(|k| (cell(k, -1), cell(k, 0), cell(k, 1)));
    let along_row = weighted_difference(|k| (cell(-1, k), cell(0, k), cell(1, k)));

    if along_x.is_none() && along_row.is_none() {
        return None;
    }

    let t = dem.transform();
    Some(Gradient {
        east: along_x.unwrap_or(0.0) * z_factor / t.cellsize_x,
        // rows grow southward
        north: -along_row.unwrap_or(0.0) * z_factor / t.cellsize_y,
    })
}

/// Horn-weighted mean of the three parallel differences of a 3x3 window.
///
/// `line(k)` yields `(before, middle, after)` for offset `k` in -1..=1.
fn weighted_difference<F>(line: F) -> Option<f64>
where
    F: Fn(isize) -> (Option<f64>, Option<f64>, Option<f64>),
{
    let mut sum = 0.0;
    let mut weight = 0.0;

    for (k, w) in [(-1, 1.0), (0, 2.0), (1, 1.0)] {
        let diff = match line(k) {
            (Some(before), _, Some(after)) => Some((after - before) / 2.0),
            (None, Some(middle), Some(after)) => Some(after - middle),
            (Some(before), Some(middle), None) => Some(middle - before),
            _ => None,
        };
        if let Some(d) = diff {
            sum += w * d;
            weight += w;
        }
    }

    (weight > 0.0).then(|| sum / weight)
}

fn check_z_factor(z_factor: f64) -> GridResult<()> {
    if !z_factor.is_finite() || z_factor <= 0.0 {
        return Err(GridError::InvalidParameter(format!(
            "z-factor must be finite and positive, got {}",
            z_factor
        )));
    }
    Ok(())
}

/// Slope from an elevation grid. Output nodata is [`DEFAULT_NODATA`].
pub fn slope(dem: &Grid, params: &SlopeParams) -> GridResult<Grid> {
    check_z_factor(params.z_factor)?;
    log::info!("Computing slope for {}x{} DEM", dem.width(), dem.height());
    log::debug!("Slope parameters: {:?}", params);

    Grid::from_fn(*dem.geometry(), DEFAULT_NODATA, |row, col| {
        match gradient_at(dem, row, col, params.z_factor) {
            Some(g) => params.units.from_radians(g.slope()),
            None => DEFAULT_NODATA,
        }
    })
}

/// Aspect (direction of steepest descent, clockwise from north).
///
/// Values lie in [0, 360) degrees or [0, 2π) radians; flat cells are
/// [`FLAT_ASPECT`]. Output nodata is [`DEFAULT_NODATA`].
pub fn aspect(dem: &Grid, params: &AspectParams) -> GridResult<Grid> {
    log::info!("Computing aspect for {}x{} DEM", dem.width(), dem.height());

    let full_turn = params.units.from_radians(TAU);
    Grid::from_fn(*dem.geometry(), DEFAULT_NODATA, |row, col| {
        match gradient_at(dem, row, col, 1.0) {
            Some(g) => match g.aspect() {
                Some(a) => {
                    let v = params.units.from_radians(a);
                    if v >= full_turn {
                        v - full_turn
                    } else {
                        v
                    }
                }
                None => FLAT_ASPECT,
            },
            None => DEFAULT_NODATA,
        }
    })
}

/// Slope and aspect in one call, both in `units`
pub fn slope_aspect(dem: &Grid, units: AngleUnit, z_factor: f64) -> GridResult<(Grid, Grid)> {
    let slope = slope(dem, &SlopeParams { units, z_factor })?;
    let aspect = aspect(dem, &AspectParams { units })?;
    Ok((slope, aspect))
}

/// Hillshade from slope and aspect grids:
/// `cos(zenith)*cos(slope) + sin(zenith)*sin(slope)*cos(azimuth - aspect)`,
/// clamped to [0, 1].
///
/// Fails with `ShapeMismatch` unless the grids are co-registered. Flat cells
/// ([`FLAT_ASPECT`]) shade as level ground.
pub fn hillshade(slope: &Grid, aspect: &Grid, params: &HillshadeParams) -> GridResult<Grid> {
    params.validate()?;
    slope.geometry().ensure_coregistered(aspect.geometry(), 0.0)?;

    log::debug!(
        "Hillshade: sun azimuth {:.1}°, altitude {:.1}°",
        params.azimuth,
        params.altitude
    );

    let zenith = (90.0 - params.altitude).to_radians();
    let azimuth = params.azimuth.rem_euclid(360.0).to_radians();
    let (cos_zenith, sin_zenith) = (zenith.cos(), zenith.sin());
    let units = params.input_units;

    let values = fill_cells(slope.dim(), |row, col| {
        let (s, a) = match (slope.valid(row, col), aspect.valid(row, col)) {
            (Some(s), Some(a)) => (s, a),
            _ => return DEFAULT_NODATA,
        };
        let s = units.to_radians(s);
        if !(0.0..=FRAC_PI_2 + 1e-9).contains(&s) {
            return DEFAULT_NODATA;
        }
        let a = if a == FLAT_ASPECT { 0.0 } else { units.to_radians(a) };

        let shade = cos_zenith * s.cos() + sin_zenith * s.sin() * (azimuth - a).cos();
        shade.clamp(0.0, 1.0)
    });

    Grid::new(*slope.geometry(), DEFAULT_NODATA, values)
}

/// Hillshade straight from elevations
pub fn hillshade_from_dem(dem: &Grid, params: &HillshadeParams, z_factor: f64) -> GridResult<Grid> {
    let (slope, aspect) = slope_aspect(dem, AngleUnit::Radians, z_factor)?;
    let params = HillshadeParams {
        input_units: AngleUnit::Radians,
        ..params.clone()
    };
    hillshade(&slope, &aspect, &params)
}

/// Mean of hillshades lit from several azimuths (degrees).
///
/// Softens the directional bias of a single light source.
pub fn multidirectional_hillshade(
    slope: &Grid,
    aspect: &Grid,
    azimuths: &[f64],
    params: &HillshadeParams,
) -> GridResult<Grid> {
    if azimuths.is_empty() {
        return Err(GridError::InvalidParameter(
            "At least one sun azimuth is required".to_string(),
        ));
    }
    log::info!("Multi-directional hillshade from {} azimuths", azimuths.len());

    let shade_from = |azimuth: &f64| {
        let p = HillshadeParams {
            azimuth: *azimuth,
            ..params.clone()
        };
        hillshade(slope, aspect, &p)
    };

    #[cfg(feature = "parallel")]
    let shades: Vec<Grid> = {
        use rayon::prelude::*;
        azimuths.par_iter().map(shade_from).collect::<GridResult<_>>()?
    };

    #[cfg(not(feature = "parallel"))]
    let shades: Vec<Grid> = azimuths.iter().map(shade_from).collect::<GridResult<_>>()?;

    let n = shades.len() as f64;
    let mut total = shades[0].clone();
    for shade in &shades[1..] {
        total = total.zip_with(shade, |a, b| a + b)?;
    }
    Ok(total.map(|v| v / n))
}
