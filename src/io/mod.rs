//! Collaborator seams: where grids come from and where they go.
//!
//! File formats live outside this crate. Loaders implement [`GridSource`];
//! renderers implement [`render::GridRenderer`].

pub mod render;

use crate::core::grid::Grid;
use crate::core::stack::BandStack;
use crate::types::{GridError, GridResult};
use std::collections::HashMap;

pub use render::{rgb_composite, ColorRamp, ColorStop, GridRenderer, RampRenderer, RenderConfig, RgbaImage, ValueRange};

/// Supplies grids by name (a file path, a band id, a tile key...)
pub trait GridSource {
    fn read_grid(&self, name: &str) -> GridResult<Grid>;

    /// Read several co-registered bands into a stack
    fn read_stack(&self, names: &[&str]) -> GridResult<BandStack> {
        let bands = names
            .iter()
            .map(|name| Ok((name.to_string(), self.read_grid(name)?)))
            .collect::<GridResult<Vec<_>>>()?;
        BandStack::new(bands)
    }
}

/// Grids held in memory, keyed by name
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    grids: HashMap<String, Grid>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, grid: Grid) -> Option<Grid> {
        self.grids.insert(name.into(), grid)
    }

    pub fn len(&self) -> usize {
        self.grids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grids.is_empty()
    }
}

impl GridSource for MemorySource {
    fn read_grid(&self, name: &str) -> GridResult<Grid> {
        log::debug!("Reading grid '{}' from memory", name);
        self.grids
            .get(name)
            .cloned()
            .ok_or_else(|| GridError::InvalidParameter(format!("Unknown grid '{}'", name)))
    }
}
