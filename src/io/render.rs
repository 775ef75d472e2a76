//! Rendering collaborator: turns grids into 8-bit RGBA buffers.
//!
//! All styling travels in an explicit [`RenderConfig`]; nothing is kept in
//! global state. Encoding the buffers (PNG etc.) is left to the caller.

use crate::core::grid::Grid;
use crate::core::stack::BandStack;
use crate::core::stats::percentiles;
use crate::types::{GridError, GridResult};
use ndarray::Array3;
use serde::{Deserialize, Serialize};

/// `(rows, cols, 4)` RGBA pixels
pub type RgbaImage = Array3<u8>;

/// A colour at position `t` in [0, 1] along a ramp
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorStop {
    pub t: f64,
    pub color: [u8; 3],
}

impl ColorStop {
    pub const fn new(t: f64, r: u8, g: u8, b: u8) -> Self {
        Self { t, color: [r, g, b] }
    }
}

const TERRAIN: &[ColorStop] = &[
    ColorStop::new(0.00, 0, 97, 71),
    ColorStop::new(0.25, 122, 175, 90),
    ColorStop::new(0.50, 232, 214, 125),
    ColorStop::new(0.75, 161, 103, 62),
    ColorStop::new(1.00, 255, 255, 255),
];

const GRAYSCALE: &[ColorStop] = &[ColorStop::new(0.0, 0, 0, 0), ColorStop::new(1.0, 255, 255, 255)];

const NDVI: &[ColorStop] = &[
    ColorStop::new(0.0, 140, 81, 10),
    ColorStop::new(0.4, 246, 232, 195),
    ColorStop::new(0.6, 199, 234, 150),
    ColorStop::new(1.0, 1, 102, 44),
];

/// Colour ramps for single-band rendering
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum ColorRamp {
    /// Green -> tan -> brown -> white, for elevation
    #[default]
    Terrain,
    /// Black -> white, for hillshade and slope
    Grayscale,
    /// Brown -> pale -> green, for vegetation indices
    Ndvi,
    Custom(Vec<ColorStop>),
}

impl ColorRamp {
    pub fn stops(&self) -> &[ColorStop] {
        match self {
            ColorRamp::Terrain => TERRAIN,
            ColorRamp::Grayscale => GRAYSCALE,
            ColorRamp::Ndvi => NDVI,
            ColorRamp::Custom(stops) => stops.as_slice(),
        }
    }

    pub fn validate(&self) -> GridResult<()> {
        let stops = self.stops();
        if stops.len() < 2 {
            return Err(GridError::InvalidParameter(
                "A colour ramp needs at least two stops".to_string(),
            ));
        }
        let ordered = stops.windows(2).all(|w| w[0].t < w[1].t);
        let bounded = stops.iter().all(|s| (0.0..=1.0).contains(&s.t));
        if !ordered || !bounded {
            return Err(GridError::InvalidParameter(
                "Colour stops must be strictly increasing within [0, 1]".to_string(),
            ));
        }
        Ok(())
    }

    /// Colour at `t`, clamped to [0, 1], linearly interpolated between stops.
    ///
    /// `None` for a ramp without stops.
    pub fn evaluate(&self, t: f64) -> Option<[u8; 3]> {
        let stops = self.stops();
        let t = t.clamp(0.0, 1.0);

        let first = *stops.first()?;
        if t <= first.t {
            return Some(first.color);
        }
        for pair in stops.windows(2) {
            let (lo, hi) = (pair[0], pair[1]);
            if t <= hi.t {
                let f = (t - lo.t) / (hi.t - lo.t);
                let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * f).round() as u8;
                return Some([
                    mix(lo.color[0], hi.color[0]),
                    mix(lo.color[1], hi.color[1]),
                    mix(lo.color[2], hi.color[2]),
                ]);
            }
        }
        stops.last().map(|s| s.color)
    }
}

/// Value range mapped onto a ramp or an 8-bit channel
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum ValueRange {
    /// Minimum and maximum of the valid data
    #[default]
    Auto,
    /// Percentile stretch, e.g. 2/98
    Percentile { low: f64, high: f64 },
    Fixed { min: f64, max: f64 },
}

impl ValueRange {
    /// Concrete `(min, max)` for a grid, `None` if it holds no valid cells
    pub fn resolve(&self, grid: &Grid) -> GridResult<Option<(f64, f64)>> {
        let range = match *self {
            ValueRange::Fixed { min, max } => {
                if !(min.is_finite() && max.is_finite()) || min >= max {
                    return Err(GridError::InvalidParameter(format!(
                        "Render range must satisfy min < max, got [{}, {}]",
                        min, max
                    )));
                }
                Some((min, max))
            }
            ValueRange::Auto => grid.statistics().map(|s| (s.min, s.max)),
            ValueRange::Percentile { low, high } => {
                if low >= high {
                    return Err(GridError::InvalidParameter(format!(
                        "Percentile stretch needs low < high, got {} / {}",
                        low, high
                    )));
                }
                percentiles(grid, &[low, high])?.map(|v| (v[0], v[1]))
            }
        };

        if range.is_none() {
            log::warn!("Nothing to stretch: grid has no valid cells");
        }
        Ok(range)
    }
}

/// Explicit styling for one rendered layer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub ramp: ColorRamp,
    pub range: ValueRange,
    /// RGBA used for nodata cells
    pub nodata_color: [u8; 4],
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            ramp: ColorRamp::Terrain,
            range: ValueRange::Auto,
            nodata_color: [0, 0, 0, 0],
        }
    }
}

impl RenderConfig {
    pub fn with_ramp(ramp: ColorRamp) -> Self {
        Self {
            ramp,
            ..Self::default()
        }
    }
}

/// Something that can draw a grid
pub trait GridRenderer {
    fn render(&self, grid: &Grid, config: &RenderConfig) -> GridResult<RgbaImage>;
}

/// Maps each valid cell through a colour ramp
#[derive(Debug, Clone, Copy, Default)]
pub struct RampRenderer;

impl GridRenderer for RampRenderer {
    fn render(&self, grid: &Grid, config: &RenderConfig) -> GridResult<RgbaImage> {
        config.ramp.validate()?;
        let (rows, cols) = grid.dim();
        let mut image = Array3::<u8>::zeros((rows, cols, 4));

        let (min, max) = config.range.resolve(grid)?.unwrap_or((0.0, 1.0));
        let span = if max > min { max - min } else { 1.0 };

        for row in 0..rows {
            for col in 0..cols {
                let rgba = match grid.valid(row, col) {
                    Some(v) => match config.ramp.evaluate((v - min) / span) {
                        Some([r, g, b]) => [r, g, b, 255],
                        None => config.nodata_color,
                    },
                    None => config.nodata_color,
                };
                for (k, channel) in rgba.into_iter().enumerate() {
                    image[[row, col, k]] = channel;
                }
            }
        }

        Ok(image)
    }
}

/// Colour composite of three stack bands with a per-band linear stretch.
///
/// A cell that is nodata in any of the three bands is fully transparent.
pub fn rgb_composite(
    stack: &BandStack,
    bands: [&str; 3],
    stretch: &ValueRange,
) -> GridResult<RgbaImage> {
    log::info!("Building RGB composite from {:?}", bands);

    let channels = [
        stack.require(bands[0])?,
        stack.require(bands[1])?,
        stack.require(bands[2])?,
    ];

    let mut ranges = [(0.0, 1.0); 3];
    for (range, band) in ranges.iter_mut().zip(channels.iter()) {
        if let Some((min, max)) = stretch.resolve(band)? {
            *range = (min, if max > min { max } else { min + 1.0 });
        }
    }
    log::debug!("Composite stretch ranges: {:?}", ranges);

    let (rows, cols) = stack.geometry().dim();
    let mut image = Array3::<u8>::zeros((rows, cols, 4));

    for row in 0..rows {
        for col in 0..cols {
            let mut pixel = [0u8; 4];
            let mut valid = true;
            for (k, band) in channels.iter().enumerate() {
                match band.valid(row, col) {
                    Some(v) => {
                        let (min, max) = ranges[k];
                        pixel[k] = to_byte((v - min) / (max - min));
                    }
                    None => valid = false,
                }
            }
            if valid {
                pixel[3] = 255;
                for (k, channel) in pixel.into_iter().enumerate() {
                    image[[row, col, k]] = channel;
                }
            }
        }
    }

    Ok(image)
}

fn to_byte(t: f64) -> u8 {
    (t.clamp(0.0, 1.0) * 255.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{GeoTransform, GridGeometry};

    fn geometry() -> GridGeometry {
        GridGeometry::new(3, 1, GeoTransform::square(0.0, 0.0, 1.0).unwrap()).unwrap()
    }

    #[test]
    fn test_ramp_evaluate_endpoints_and_midpoint() {
        let ramp = ColorRamp::Grayscale;
        assert_eq!(ramp.evaluate(-1.0), Some([0, 0, 0]));
        assert_eq!(ramp.evaluate(0.5), Some([128, 128, 128]));
        assert_eq!(ramp.evaluate(2.0), Some([255, 255, 255]));

        let bad = ColorRamp::Custom(vec![ColorStop::new(0.5, 0, 0, 0), ColorStop::new(0.2, 1, 1, 1)]);
        assert!(bad.validate().is_err());
        assert!(ColorRamp::Terrain.validate().is_ok());
    }

    #[test]
    fn test_empty_custom_ramp() {
        let empty = ColorRamp::Custom(Vec::new());
        assert_eq!(empty.evaluate(0.5), None);
        assert!(empty.validate().is_err());

        let grid = Grid::filled(geometry(), 1.0, -1.0).unwrap();
        assert!(RampRenderer.render(&grid, &RenderConfig::with_ramp(empty)).is_err());
    }

    #[test]
    fn test_render_grayscale_with_nodata() {
        let grid = Grid::from_vec(geometry(), -1.0, vec![10.0, -1.0, 20.0]).unwrap();
        let config = RenderConfig {
            nodata_color: [1, 2, 3, 0],
            ..RenderConfig::with_ramp(ColorRamp::Grayscale)
        };
        let image = RampRenderer.render(&grid, &config).unwrap();

        assert_eq!(image.dim(), (1, 3, 4));
        assert_eq!(image.slice(ndarray::s![0, 0, ..]).to_vec(), vec![0, 0, 0, 255]);
        assert_eq!(image.slice(ndarray::s![0, 1, ..]).to_vec(), vec![1, 2, 3, 0]);
        assert_eq!(image.slice(ndarray::s![0, 2, ..]).to_vec(), vec![255, 255, 255, 255]);
    }

    #[test]
    fn test_fixed_range_validation() {
        let grid = Grid::filled(geometry(), 1.0, -1.0).unwrap();
        let config = RenderConfig {
            range: ValueRange::Fixed { min: 2.0, max: 1.0 },
            ..RenderConfig::default()
        };
        assert!(RampRenderer.render(&grid, &config).is_err());
    }

    #[test]
    fn test_rgb_composite() {
        let red = Grid::from_vec(geometry(), 0.0, vec![100.0, 200.0, 300.0]).unwrap();
        let green = Grid::from_vec(geometry(), 0.0, vec![1.0, 2.0, 3.0]).unwrap();
        let blue = Grid::from_vec(geometry(), 0.0, vec![5.0, 0.0, 5.0]).unwrap();
        let stack = BandStack::new(vec![
            ("red".to_string(), red),
            ("green".to_string(), green),
            ("blue".to_string(), blue),
        ])
        .unwrap();

        let image = rgb_composite(&stack, ["red", "green", "blue"], &ValueRange::Auto).unwrap();
        assert_eq!(image.slice(ndarray::s![0, 0, ..]).to_vec(), vec![0, 0, 0, 255]);
        // blue is nodata in the middle cell
        assert_eq!(image[[0, 1, 3]], 0);
        assert_eq!(image.slice(ndarray::s![0, 2, ..]).to_vec(), vec![255, 255, 0, 255]);

        assert!(rgb_composite(&stack, ["nir", "green", "blue"], &ValueRange::Auto).is_err());
    }
}
