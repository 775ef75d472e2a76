//! rasterlab: raster grid processing for terrain and satellite imagery
//!
//! Georeferenced 2D grids with nodata propagation, band algebra between
//! co-registered grids, resampling, and derived terrain metrics (slope,
//! aspect, hillshade) and spectral indices (NDVI). File formats and plotting
//! are left to collaborators plugged in through the [`io`] traits.

pub mod types;
pub mod core;
pub mod io;
pub mod config;
pub mod pipeline;

// Re-export main types and functions for easier access
pub use types::{
    GeoTransform, GridGeometry, Extent, AngleUnit, GridError, GridResult, DEFAULT_NODATA,
};
pub use crate::core::{BandStack, Grid, GridStats, Resampler, ResampleMethod};
pub use io::{GridRenderer, GridSource, MemorySource, RampRenderer, RenderConfig};
pub use config::ProcessingConfig;
pub use pipeline::{Pipeline, TerrainProducts};
