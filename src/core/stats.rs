use crate::core::grid::Grid;
use crate::types::{GridError, GridResult};
use serde::{Deserialize, Serialize};

/// Summary statistics over the valid cells of a grid
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridStats {
    pub valid_count: usize,
    pub nodata_count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    /// Population standard deviation
    pub std_dev: f64,
}

impl GridStats {
    /// Compute statistics, skipping nodata. Returns `None` for an all-nodata grid.
    pub fn from_grid(grid: &Grid) -> Option<GridStats> {
        let mut count = 0usize;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut mean = 0.0;
        let mut m2 = 0.0;

        // Welford's running variance
        for v in grid.iter_valid() {
            count += 1;
            min = min.min(v);
            max = max.max(v);
            let delta = v - mean;
            mean += delta / count as f64;
            m2 += delta * (v - mean);
        }

        if count == 0 {
            log::warn!("No valid cells in {}x{} grid", grid.width(), grid.height());
            return None;
        }

        Some(GridStats {
            valid_count: count,
            nodata_count: grid.geometry().len() - count,
            min,
            max,
            mean,
            std_dev: (m2 / count as f64).sqrt(),
        })
    }
}

/// Percentile of the valid cells (`p` in [0, 100]), linear interpolation
/// between closest ranks. `Ok(None)` for an all-nodata grid.
pub fn percentile(grid: &Grid, p: f64) -> GridResult<Option<f64>> {
    Ok(percentiles(grid, &[p])?.map(|v| v[0]))
}

/// Several percentiles with a single sort
pub fn percentiles(grid: &Grid, ps: &[f64]) -> GridResult<Option<Vec<f64>>> {
    if let Some(bad) = ps.iter().find(|p| !(0.0..=100.0).contains(*p)) {
        return Err(GridError::InvalidParameter(format!(
            "Percentile must be within [0, 100], got {}",
            bad
        )));
    }

    let mut sorted: Vec<f64> = grid.iter_valid().collect();
    if sorted.is_empty() {
        return Ok(None);
    }
    sorted.sort_by(|a, b| a.total_cmp(b));

    let last = (sorted.len() - 1) as f64;
    let values = ps
        .iter()
        .map(|p| {
            let rank = p / 100.0 * last;
            let lo = rank.floor() as usize;
            let hi = rank.ceil() as usize;
            let frac = rank - lo as f64;
            sorted[lo] + (sorted[hi] - sorted[lo]) * frac
        })
        .collect();

    Ok(Some(values))
}
