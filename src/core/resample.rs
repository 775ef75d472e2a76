use crate::core::grid::Grid;
use crate::types::{GridGeometry, GridResult};
use serde::{Deserialize, Serialize};

/// Interpolation used when sampling the source grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ResampleMethod {
    /// Value of the source cell containing the target center
    #[default]
    Nearest,
    /// Weighted average of the four surrounding source cell centers
    Bilinear,
}

/// Parameters for resampling
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ResampleParams {
    pub method: ResampleMethod,
}

/// Re-evaluates a grid on a different geometry
pub struct Resampler {
    params: ResampleParams,
}

impl Resampler {
    pub fn new(params: ResampleParams) -> Self {
        Self { params }
    }

    pub fn nearest() -> Self {
        Self::new(ResampleParams {
            method: ResampleMethod::Nearest,
        })
    }

    pub fn bilinear() -> Self {
        Self::new(ResampleParams {
            method: ResampleMethod::Bilinear,
        })
    }

    /// Sample `source` at every cell center of `target`.
    ///
    /// Target cells whose center falls outside the source extent are nodata.
    /// The output keeps the source nodata sentinel unless an interpolated
    /// value lands on it, in which case nodata becomes NaN.
    pub fn resample(&self, source: &Grid, target: &GridGeometry) -> GridResult<Grid> {
        log::info!(
            "Resampling {}x{} grid to {}x{} ({:?})",
            source.width(),
            source.height(),
            target.width,
            target.height,
            self.params.method
        );

        target.validate()?;
        let output = Grid::collect_cells(*target, source.nodata(), |row, col| {
            let (x, y) = target.cell_center(row, col);
            match self.params.method {
                ResampleMethod::Nearest => sample_nearest(source, x, y),
                ResampleMethod::Bilinear => sample_bilinear(source, x, y),
            }
        });

        log::debug!(
            "Resampled grid has {} valid cells of {}",
            output.valid_count(),
            target.len()
        );
        Ok(output)
    }

    /// Resample onto another grid's geometry
    pub fn resample_to_match(&self, source: &Grid, reference: &Grid) -> GridResult<Grid> {
        self.resample(source, reference.geometry())
    }
}

/// Nearest-neighbour lookup at a world point
pub fn sample_nearest(source: &Grid, x: f64, y: f64) -> Option<f64> {
    source.sample_at(x, y)
}

/// Bilinear interpolation at a world point.
///
/// Falls back to nearest where the point is not enclosed by four source cell
/// centers (the outer half-cell ring) or where any of the four is nodata.
pub fn sample_bilinear(source: &Grid, x: f64, y: f64) -> Option<f64> {
    // outside the extent entirely
    source.geometry().cell_at(x, y)?;

    let (col, row) = source.transform().world_to_pixel(x, y);
    let fx = col - 0.5;
    let fy = row - 0.5;
    let c0 = fx.floor();
    let r0 = fy.floor();

    let (height, width) = source.dim();
    if c0 < 0.0 || r0 < 0.0 || c0 as usize + 1 >= width || r0 as usize + 1 >= height {
        return sample_nearest(source, x, y);
    }

    let (c0, r0) = (c0 as usize, r0 as usize);
    let corners = (
        source.valid(r0, c0),
        source.valid(r0, c0 + 1),
        source.valid(r0 + 1, c0),
        source.valid(r0 + 1, c0 + 1),
    );
    let (v11, v21, v12, v22) = match corners {
        (Some(a), Some(b), Some(c), Some(d)) => (a, b, c, d),
        _ => return sample_nearest(source, x, y),
    };

    let dx = fx - c0 as f64;
    let dy = fy - r0 as f64;

    Some(
        v11 * (1.0 - dx) * (1.0 - dy)
            + v21 * dx * (1.0 - dy)
            + v12 * (1.0 - dx) * dy
            + v22 * dx * dy,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::GeoTransform;
    use approx::assert_relative_eq;

    fn source() -> Grid {
        let geom = GridGeometry::new(2, 2, GeoTransform::square(0.0, 20.0, 10.0).unwrap()).unwrap();
        Grid::from_vec(geom, -9999.0, vec![0.0, 10.0, 20.0, 30.0]).unwrap()
    }

    #[test]
    fn test_nearest_identity() {
        let geom = GridGeometry::new(5, 4, GeoTransform::new(310.5, 4200.0, 30.0, 25.0).unwrap()).unwrap();
        let src = Grid::from_fn(geom, -9999.0, |r, c| {
            if r == 2 && c == 1 {
                -9999.0
            } else {
                (r * 7 + c) as f64 * 1.37
            }
        })
        .unwrap();

        let out = Resampler::nearest().resample(&src, src.geometry()).unwrap();
        assert_eq!(out.values(), src.values());
    }

    #[test]
    fn test_bilinear_upsample() {
        let target = GridGeometry::new(4, 4, GeoTransform::square(0.0, 20.0, 5.0).unwrap()).unwrap();
        let out = Resampler::bilinear().resample(&source(), &target).unwrap();

        assert_relative_eq!(out.get(1, 1).unwrap().unwrap(), 7.5, epsilon = 1e-12);
        assert_relative_eq!(out.get(2, 2).unwrap().unwrap(), 22.5, epsilon = 1e-12);
        // outer ring falls back to nearest
        assert_eq!(out.get(0, 0).unwrap(), Some(0.0));
        assert_eq!(out.get(3, 3).unwrap(), Some(30.0));
    }

    #[test]
    fn test_bilinear_falls_back_on_nodata() {
        let geom = *source().geometry();
        let src = Grid::from_vec(geom, -9999.0, vec![0.0, -9999.0, 20.0, 30.0]).unwrap();
        let target = GridGeometry::new(4, 4, GeoTransform::square(0.0, 20.0, 5.0).unwrap()).unwrap();
        let out = Resampler::bilinear().resample(&src, &target).unwrap();

        assert_eq!(out.get(1, 1).unwrap(), Some(0.0));
        assert_eq!(out.get(1, 2).unwrap(), None);
    }

    #[test]
    fn test_interpolated_value_on_sentinel_stays_valid() {
        let src = source().with_nodata(7.5);
        let target = GridGeometry::new(4, 4, GeoTransform::square(0.0, 20.0, 5.0).unwrap()).unwrap();
        let out = Resampler::bilinear().resample(&src, &target).unwrap();

        assert!(out.nodata().is_nan());
        assert_relative_eq!(out.get(1, 1).unwrap().unwrap(), 7.5, epsilon = 1e-12);
        assert_eq!(out.valid_count(), 16);
    }

    #[test]
    fn test_out_of_extent_is_nodata() {
        let target = GridGeometry::new(3, 1, GeoTransform::square(5.0, 20.0, 10.0).unwrap()).unwrap();

        let nearest = Resampler::nearest().resample(&source(), &target).unwrap();
        assert_eq!(nearest.get(0, 0).unwrap(), Some(10.0));

        let bilinear = Resampler::bilinear().resample(&source(), &target).unwrap();
        assert_relative_eq!(bilinear.get(0, 0).unwrap().unwrap(), 5.0, epsilon = 1e-12);

        for out in [nearest, bilinear] {
            assert_eq!(out.get(0, 1).unwrap(), None);
            assert_eq!(out.get(0, 2).unwrap(), None);
            assert_eq!(out.nodata(), -9999.0);
        }
    }

    #[test]
    fn test_nearest_downsample() {
        let geom = GridGeometry::new(4, 4, GeoTransform::square(0.0, 40.0, 10.0).unwrap()).unwrap();
        let src = Grid::from_fn(geom, -9999.0, |r, c| (r * 4 + c) as f64).unwrap();
        let coarse = GridGeometry::new(2, 2, GeoTransform::square(0.0, 40.0, 20.0).unwrap()).unwrap();

        let out = Resampler::nearest().resample(&src, &coarse).unwrap();
        // coarse centers sit on source cell corners and pick the lower-right cell
        assert_eq!(out.get(0, 0).unwrap(), Some(5.0));
        assert_eq!(out.get(1, 1).unwrap(), Some(15.0));
    }
}
