use crate::core::grid::{Grid, EXACT};
use crate::types::{GridError, GridGeometry, GridResult};

/// Ordered set of co-registered bands, e.g. the channels of a multispectral scene
#[derive(Debug, Clone)]
pub struct BandStack {
    geometry: GridGeometry,
    names: Vec<String>,
    bands: Vec<Grid>,
    /// Georeferencing tolerance applied to every band, including pushed ones
    tolerance: f64,
}

impl BandStack {
    /// Stack named bands; all must share shape and georeferencing exactly
    pub fn new(bands: Vec<(String, Grid)>) -> GridResult<Self> {
        Self::with_tolerance(bands, EXACT)
    }

    /// Stack bands whose georeferencing may differ by up to `tolerance`
    pub fn with_tolerance(bands: Vec<(String, Grid)>, tolerance: f64) -> GridResult<Self> {
        let geometry = match bands.first() {
            Some((_, first)) => *first.geometry(),
            None => {
                return Err(GridError::InvalidParameter(
                    "A band stack needs at least one band".to_string(),
                ))
            }
        };

        let mut names = Vec::with_capacity(bands.len());
        let mut grids = Vec::with_capacity(bands.len());
        for (name, grid) in bands {
            geometry
                .ensure_coregistered(grid.geometry(), tolerance)
                .map_err(|e| GridError::ShapeMismatch(format!("band '{}': {}", name, e)))?;
            if names.contains(&name) {
                return Err(GridError::InvalidParameter(format!("Duplicate band name '{}'", name)));
            }
            names.push(name);
            grids.push(grid);
        }

        log::debug!("Stacked {} bands: {:?}", grids.len(), names);
        Ok(Self {
            geometry,
            names,
            bands: grids,
            tolerance,
        })
    }

    pub fn geometry(&self) -> &GridGeometry {
        &self.geometry
    }

    pub fn len(&self) -> usize {
        self.bands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bands.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Band by position
    pub fn band(&self, index: usize) -> Option<&Grid> {
        self.bands.get(index)
    }

    /// Band by name
    pub fn get(&self, name: &str) -> Option<&Grid> {
        self.names.iter().position(|n| n == name).map(|i| &self.bands[i])
    }

    /// Band by name, or an `InvalidParameter` error naming what is available
    pub fn require(&self, name: &str) -> GridResult<&Grid> {
        self.get(name).ok_or_else(|| {
            GridError::InvalidParameter(format!(
                "No band named '{}' (available: {})",
                name,
                self.names.join(", ")
            ))
        })
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Append another band, co-registered within the stack's tolerance
    pub fn push(&mut self, name: impl Into<String>, grid: Grid) -> GridResult<()> {
        let name = name.into();
        self.geometry.ensure_coregistered(grid.geometry(), self.tolerance)?;
        if self.names.contains(&name) {
            return Err(GridError::InvalidParameter(format!("Duplicate band name '{}'", name)));
        }
        self.names.push(name);
        self.bands.push(grid);
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Grid)> {
        self.names.iter().map(String::as_str).zip(self.bands.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::GeoTransform;

    fn band(width: usize, value: f64) -> Grid {
        let geom = GridGeometry::new(width, 2, GeoTransform::square(0.0, 0.0, 10.0).unwrap()).unwrap();
        Grid::filled(geom, value, -1.0).unwrap()
    }

    #[test]
    fn test_stack_lookup() {
        let stack = BandStack::new(vec![
            ("B04".to_string(), band(3, 0.1)),
            ("B03".to_string(), band(3, 0.2)),
            ("B02".to_string(), band(3, 0.3)),
        ])
        .unwrap();

        assert_eq!(stack.len(), 3);
        assert_eq!(stack.get("B03").unwrap().get(0, 0).unwrap(), Some(0.2));
        assert_eq!(stack.band(2).unwrap().get(1, 2).unwrap(), Some(0.3));
        assert!(stack.require("B08").is_err());
        assert_eq!(stack.iter().map(|(n, _)| n).collect::<Vec<_>>(), vec!["B04", "B03", "B02"]);
    }

    #[test]
    fn test_stack_rejects_mismatched_bands() {
        let result = BandStack::new(vec![("a".to_string(), band(3, 0.0)), ("b".to_string(), band(4, 0.0))]);
        assert!(matches!(result, Err(GridError::ShapeMismatch(_))));

        let mut stack = BandStack::new(vec![("a".to_string(), band(3, 0.0))]).unwrap();
        assert!(stack.push("b", band(4, 0.0)).is_err());
        assert!(stack.push("a", band(3, 0.0)).is_err());
        assert!(stack.push("c", band(3, 0.0)).is_ok());

        assert!(BandStack::new(Vec::new()).is_err());
    }

    #[test]
    fn test_push_uses_stack_tolerance() {
        let shifted = |width: usize| {
            let geom = GridGeometry::new(width, 2, GeoTransform::square(0.05, 0.0, 10.0).unwrap()).unwrap();
            Grid::filled(geom, 0.5, -1.0).unwrap()
        };

        let mut loose = BandStack::with_tolerance(vec![("a".to_string(), band(3, 0.0))], 0.1).unwrap();
        assert_eq!(loose.tolerance(), 0.1);
        assert!(loose.push("b", shifted(3)).is_ok());
        assert!(loose.push("c", shifted(4)).is_err());

        let mut exact = BandStack::new(vec![("a".to_string(), band(3, 0.0))]).unwrap();
        assert!(matches!(exact.push("b", shifted(3)), Err(GridError::ShapeMismatch(_))));
    }
}
