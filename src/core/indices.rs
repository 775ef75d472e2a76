use crate::core::algebra;
use crate::core::grid::Grid;
use crate::types::{GridResult, DEFAULT_NODATA};

/// Normalized difference `(a - b) / (a + b)`.
///
/// Cells where `a + b == 0` are nodata. Results outside [-1, 1] can only come
/// from negative inputs (invalid reflectance) and are nodata as well.
/// Output nodata is [`DEFAULT_NODATA`], whatever sentinels the bands use.
pub fn normalized_difference(a: &Grid, b: &Grid) -> GridResult<Grid> {
    // NaN intermediates so a zero difference never collides with a 0 sentinel
    let a = a.with_nodata(f64::NAN);
    let b = b.with_nodata(f64::NAN);

    let diff = algebra::sub(&a, &b)?;
    let sum = algebra::add(&a, &b)?;
    let ratio = algebra::div(&diff, &sum)?;

    Ok(ratio
        .map(|v| if (-1.0..=1.0).contains(&v) { v } else { f64::NAN })
        .with_nodata(DEFAULT_NODATA))
}

/// Normalized Difference Vegetation Index, `(NIR - Red) / (NIR + Red)`
pub fn ndvi(nir: &Grid, red: &Grid) -> GridResult<Grid> {
    log::debug!("Computing NDVI over {}x{} bands", nir.width(), nir.height());
    normalized_difference(nir, red)
}

/// Normalized Difference Water Index (McFeeters), `(Green - NIR) / (Green + NIR)`
pub fn ndwi(green: &Grid, nir: &Grid) -> GridResult<Grid> {
    normalized_difference(green, nir)
}
