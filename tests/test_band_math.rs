use approx::assert_relative_eq;
use rasterlab::core::{algebra, indices};
use rasterlab::{GeoTransform, Grid, GridError, GridGeometry, GridSource, MemorySource};

fn geometry(width: usize, height: usize) -> GridGeometry {
    let transform = GeoTransform::square(500_000.0, 4_200_000.0, 10.0).expect("Failed to build transform");
    GridGeometry::new(width, height, transform).expect("Failed to build geometry")
}

#[test]
fn test_add_then_subtract_reconstructs_input() {
    let _ = env_logger::builder().is_test(true).try_init();

    let nodata = -9999.0;
    let a = Grid::from_fn(geometry(6, 5), nodata, |r, c| {
        if (r + c) % 7 == 0 {
            nodata
        } else {
            (r as f64 * 1.37 - c as f64 * 0.21).sin() * 100.0
        }
    })
    .expect("Failed to build grid A");
    let b = Grid::from_fn(geometry(6, 5), nodata, |r, c| {
        if r == 4 && c == 1 {
            f64::NAN
        } else {
            r as f64 * 3.3 + c as f64 * 0.7 - 5.0
        }
    })
    .expect("Failed to build grid B");

    let sum = algebra::add(&a, &b).expect("Addition failed");
    let back = algebra::sub(&sum, &b).expect("Subtraction failed");

    for row in 0..5 {
        for col in 0..6 {
            let original = a.get(row, col).unwrap();
            let other = b.get(row, col).unwrap();
            let restored = back.get(row, col).unwrap();
            match (original, other) {
                (Some(expected), Some(_)) => {
                    assert_relative_eq!(restored.unwrap(), expected, epsilon = 1e-9);
                }
                _ => assert_eq!(restored, None, "nodata must propagate at ({}, {})", row, col),
            }
        }
    }
}

#[test]
fn test_reconstruction_when_sum_hits_sentinel() {
    let a = Grid::from_vec(geometry(2, 1), -9999.0, vec![-5000.0, 12.0]).unwrap();
    let b = Grid::from_vec(geometry(2, 1), -9999.0, vec![-4999.0, 1.0]).unwrap();

    let sum = algebra::add(&a, &b).expect("Addition failed");
    assert_eq!(sum.get(0, 0).unwrap(), Some(-9999.0));

    let back = algebra::sub(&sum, &b).expect("Subtraction failed");
    assert_eq!(back.get(0, 0).unwrap(), Some(-5000.0));
    assert_eq!(back.get(0, 1).unwrap(), Some(12.0));
}

#[test]
fn test_mismatched_grids_are_rejected() {
    let a = Grid::filled(geometry(4, 4), 1.0, -1.0).unwrap();
    let b = Grid::filled(geometry(4, 3), 1.0, -1.0).unwrap();
    assert!(matches!(algebra::add(&a, &b), Err(GridError::ShapeMismatch(_))));
}

#[test]
fn test_ndvi_from_loaded_bands() {
    let mut source = MemorySource::new();
    source.insert(
        "nir",
        Grid::from_vec(geometry(3, 2), 0.0, vec![200.0, 0.0, 0.8, 0.5, 0.3, 0.05]).unwrap(),
    );
    source.insert(
        "red",
        Grid::from_vec(geometry(3, 2), 0.0, vec![100.0, 0.0, 0.1, 0.5, 0.6, 0.04]).unwrap(),
    );

    let stack = source.read_stack(&["nir", "red"]).expect("Failed to read bands");
    let ndvi = indices::ndvi(stack.require("nir").unwrap(), stack.require("red").unwrap())
        .expect("NDVI failed");

    assert_relative_eq!(ndvi.get(0, 0).unwrap().unwrap(), 1.0 / 3.0, epsilon = 1e-12);
    assert_eq!(ndvi.get(0, 1).unwrap(), None);
    assert_relative_eq!(ndvi.get(0, 2).unwrap().unwrap(), 0.7 / 0.9, epsilon = 1e-12);
    // equal reflectance is a real zero even though the bands use 0 as nodata
    assert_eq!(ndvi.get(1, 0).unwrap(), Some(0.0));

    for v in ndvi.iter_valid() {
        assert!((-1.0..=1.0).contains(&v), "NDVI {} outside [-1, 1]", v);
    }
}
