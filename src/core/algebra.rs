//! Cell-by-cell arithmetic between co-registered grids.
//!
//! Missing data never raises: a nodata operand, a division by zero or any
//! other non-finite result yields nodata in that cell.

use crate::core::grid::Grid;
use crate::types::GridResult;
use serde::{Deserialize, Serialize};

/// Binary operators available for band math
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl BinaryOp {
    /// Apply to a pair of valid samples; `None` marks an undefined result
    pub fn apply(&self, a: f64, b: f64) -> Option<f64> {
        let v = match self {
            BinaryOp::Add => a + b,
            BinaryOp::Sub => a - b,
            BinaryOp::Mul => a * b,
            BinaryOp::Div => {
                if b == 0.0 {
                    return None;
                }
                a / b
            }
        };
        v.is_finite().then_some(v)
    }

    pub fn symbol(&self) -> char {
        match self {
            BinaryOp::Add => '+',
            BinaryOp::Sub => '-',
            BinaryOp::Mul => '*',
            BinaryOp::Div => '/',
        }
    }
}

/// `lhs <op> rhs` for every cell. Fails with `ShapeMismatch` unless the
/// grids share shape and georeferencing exactly.
pub fn binary(lhs: &Grid, rhs: &Grid, op: BinaryOp) -> GridResult<Grid> {
    log::debug!("Band math: {}x{} {} grid", lhs.width(), lhs.height(), op.symbol());
    lhs.zip_with(rhs, |a, b| op.apply(a, b).unwrap_or(f64::NAN))
}

/// `lhs <op> scalar` for every valid cell
pub fn scalar(lhs: &Grid, value: f64, op: BinaryOp) -> Grid {
    lhs.map(|a| op.apply(a, value).unwrap_or(f64::NAN))
}

pub fn add(lhs: &Grid, rhs: &Grid) -> GridResult<Grid> {
    binary(lhs, rhs, BinaryOp::Add)
}

pub fn sub(lhs: &Grid, rhs: &Grid) -> GridResult<Grid> {
    binary(lhs, rhs, BinaryOp::Sub)
}

pub fn mul(lhs: &Grid, rhs: &Grid) -> GridResult<Grid> {
    binary(lhs, rhs, BinaryOp::Mul)
}

/// Division; zero divisors give nodata
pub fn div(lhs: &Grid, rhs: &Grid) -> GridResult<Grid> {
    binary(lhs, rhs, BinaryOp::Div)
}

pub fn add_scalar(lhs: &Grid, value: f64) -> Grid {
    scalar(lhs, value, BinaryOp::Add)
}

pub fn sub_scalar(lhs: &Grid, value: f64) -> Grid {
    scalar(lhs, value, BinaryOp::Sub)
}

pub fn mul_scalar(lhs: &Grid, value: f64) -> Grid {
    scalar(lhs, value, BinaryOp::Mul)
}

pub fn div_scalar(lhs: &Grid, value: f64) -> Grid {
    scalar(lhs, value, BinaryOp::Div)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{GeoTransform, GridError, GridGeometry};

    fn grid(values: Vec<f64>) -> Grid {
        let geom = GridGeometry::new(values.len(), 1, GeoTransform::square(0.0, 0.0, 30.0).unwrap()).unwrap();
        Grid::from_vec(geom, -9999.0, values).unwrap()
    }

    #[test]
    fn test_basic_ops() {
        let a = grid(vec![6.0, 8.0, -9999.0]);
        let b = grid(vec![2.0, 4.0, 1.0]);

        assert_eq!(add(&a, &b).unwrap().values().as_slice().unwrap(), &[8.0, 12.0, -9999.0]);
        assert_eq!(sub(&a, &b).unwrap().values().as_slice().unwrap(), &[4.0, 4.0, -9999.0]);
        assert_eq!(mul(&a, &b).unwrap().values().as_slice().unwrap(), &[12.0, 32.0, -9999.0]);
        assert_eq!(div(&a, &b).unwrap().values().as_slice().unwrap(), &[3.0, 2.0, -9999.0]);
    }

    #[test]
    fn test_division_by_zero_is_nodata() {
        let a = grid(vec![1.0, 0.0, 5.0]);
        let b = grid(vec![0.0, 0.0, -9999.0]);
        let q = div(&a, &b).unwrap();

        assert_eq!(q.get(0, 0).unwrap(), None);
        assert_eq!(q.get(0, 1).unwrap(), None);
        assert_eq!(q.get(0, 2).unwrap(), None);

        assert_eq!(div_scalar(&a, 0.0).valid_count(), 0);
    }

    #[test]
    fn test_scalar_ops_keep_nodata() {
        let a = grid(vec![1.0, -9999.0]);
        let shifted = add_scalar(&a, 10.0);
        assert_eq!(shifted.get(0, 0).unwrap(), Some(11.0));
        assert_eq!(shifted.get(0, 1).unwrap(), None);

        assert_eq!(mul_scalar(&a, 3.0).get(0, 0).unwrap(), Some(3.0));
        assert_eq!(sub_scalar(&a, 1.0).get(0, 0).unwrap(), Some(0.0));
    }

    #[test]
    fn test_result_equal_to_sentinel_stays_valid() {
        let a = grid(vec![-5000.0, 3.0, -9999.0]);
        let b = grid(vec![-4999.0, 4.0, 1.0]);

        let sum = add(&a, &b).unwrap();
        assert!(sum.nodata().is_nan());
        assert_eq!(sum.get(0, 0).unwrap(), Some(-9999.0));
        assert_eq!(sum.get(0, 2).unwrap(), None);

        let back = sub(&sum, &b).unwrap();
        assert_eq!(back.get(0, 0).unwrap(), Some(-5000.0));
        assert_eq!(back.get(0, 1).unwrap(), Some(3.0));
        assert_eq!(back.get(0, 2).unwrap(), None);
    }

    #[test]
    fn test_equal_u16_reflectance_difference_is_zero() {
        let geom = GridGeometry::new(2, 1, GeoTransform::square(0.0, 0.0, 10.0).unwrap()).unwrap();
        let b04 = Grid::from_band(geom, &ndarray::array![[1200u16, 300]], Some(0)).unwrap();
        let b03 = Grid::from_band(geom, &ndarray::array![[1200u16, 100]], Some(0)).unwrap();

        let diff = sub(&b04, &b03).unwrap();
        assert_eq!(diff.get(0, 0).unwrap(), Some(0.0));
        assert_eq!(diff.get(0, 1).unwrap(), Some(200.0));
    }

    #[test]
    fn test_shape_mismatch() {
        let a = grid(vec![1.0, 2.0]);
        let b = grid(vec![1.0, 2.0, 3.0]);
        assert!(matches!(add(&a, &b), Err(GridError::ShapeMismatch(_))));
    }
}
