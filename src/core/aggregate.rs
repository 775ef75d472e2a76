use crate::core::grid::Grid;
use crate::types::{GeoTransform, GridError, GridGeometry, GridResult};
use serde::{Deserialize, Serialize};

/// How the cells of one block are combined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AggregateMethod {
    #[default]
    Mean,
    Min,
    Max,
    Sum,
}

/// Block aggregation parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregateParams {
    /// Number of source columns per output cell
    pub factor_x: usize,
    /// Number of source rows per output cell
    pub factor_y: usize,
    pub method: AggregateMethod,
}

impl Default for AggregateParams {
    fn default() -> Self {
        Self {
            factor_x: 2,
            factor_y: 2,
            method: AggregateMethod::Mean,
        }
    }
}

/// Reduces resolution by combining `factor_y x factor_x` blocks of cells
pub struct Aggregator {
    params: AggregateParams,
}

impl Aggregator {
    pub fn new(params: AggregateParams) -> Self {
        Self { params }
    }

    /// Mean over square blocks
    pub fn mean(factor: usize) -> Self {
        Self::new(AggregateParams {
            factor_x: factor,
            factor_y: factor,
            method: AggregateMethod::Mean,
        })
    }

    /// Aggregate a grid.
    ///
    /// Only valid cells contribute; a block without any is nodata. Partial
    /// blocks on the right and bottom edges are kept, so the output is
    /// `ceil(width / factor_x) x ceil(height / factor_y)`.
    pub fn apply(&self, grid: &Grid) -> GridResult<Grid> {
        let AggregateParams {
            factor_x,
            factor_y,
            method,
        } = self.params;
        if factor_x == 0 || factor_y == 0 {
            return Err(GridError::InvalidParameter(format!(
                "Aggregation factors must be positive, got {}x{}",
                factor_x, factor_y
            )));
        }

        let (rows, cols) = grid.dim();
        let out_rows = rows.div_ceil(factor_y);
        let out_cols = cols.div_ceil(factor_x);

        log::info!(
            "Aggregating {}x{} grid by {}x{} ({:?}) to {}x{}",
            cols,
            rows,
            factor_x,
            factor_y,
            method,
            out_cols,
            out_rows
        );

        let t = grid.transform();
        let transform = GeoTransform::new(
            t.origin_x,
            t.origin_y,
            t.cellsize_x * factor_x as f64,
            t.cellsize_y * factor_y as f64,
        )?;
        let geometry = GridGeometry::new(out_cols, out_rows, transform)?;

        Ok(Grid::collect_cells(geometry, grid.nodata(), |out_row, out_col| {
            let row_start = out_row * factor_y;
            let col_start = out_col * factor_x;
            let row_end = (row_start + factor_y).min(rows);
            let col_end = (col_start + factor_x).min(cols);

            let mut count = 0usize;
            let mut acc = match method {
                AggregateMethod::Mean | AggregateMethod::Sum => 0.0,
                AggregateMethod::Min => f64::INFINITY,
                AggregateMethod::Max => f64::NEG_INFINITY,
            };

            for row in row_start..row_end {
                for col in col_start..col_end {
                    if let Some(v) = grid.valid(row, col) {
                        count += 1;
                        acc = match method {
                            AggregateMethod::Mean | AggregateMethod::Sum => acc + v,
                            AggregateMethod::Min => acc.min(v),
                            AggregateMethod::Max => acc.max(v),
                        };
                    }
                }
            }

            match (count, method) {
                (0, _) => None,
                (n, AggregateMethod::Mean) => Some(acc / n as f64),
                _ => Some(acc),
            }
        }))
    }
}
