//! Core grid processing modules

pub mod grid;
pub mod stats;
pub mod algebra;
pub mod stack;
pub mod resample;
pub mod terrain;
pub mod indices;
pub mod aggregate;

// Re-export main types
pub use grid::{Grid, EXACT};
pub use stats::{GridStats, percentile, percentiles};
pub use algebra::BinaryOp;
pub use stack::BandStack;
pub use resample::{Resampler, ResampleParams, ResampleMethod};
pub use terrain::{
    Gradient, SlopeParams, AspectParams, HillshadeParams, FLAT_ASPECT,
    slope, aspect, slope_aspect, hillshade, hillshade_from_dem, multidirectional_hillshade,
};
pub use indices::{ndvi, ndwi, normalized_difference};
pub use aggregate::{Aggregator, AggregateParams, AggregateMethod};
