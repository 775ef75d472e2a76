use crate::config::ProcessingConfig;
use crate::core::aggregate::Aggregator;
use crate::core::grid::Grid;
use crate::core::indices;
use crate::core::resample::Resampler;
use crate::core::terrain::{self, HillshadeParams};
use crate::io::render::{GridRenderer, RgbaImage};
use crate::types::{AngleUnit, GridResult};

/// Slope, aspect and hillshade derived from one DEM
#[derive(Debug, Clone)]
pub struct TerrainProducts {
    /// In the configured slope units
    pub slope: Grid,
    /// In the configured aspect units
    pub aspect: Grid,
    pub hillshade: Grid,
}

/// Runs the common map-making steps with one [`ProcessingConfig`]
pub struct Pipeline {
    config: ProcessingConfig,
}

impl Pipeline {
    pub fn new(config: ProcessingConfig) -> GridResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ProcessingConfig {
        &self.config
    }

    /// Complete terrain workflow: slope, aspect, then hillshade from radian
    /// slope/aspect lit from the configured sun position(s)
    pub fn terrain_products(&self, dem: &Grid) -> GridResult<TerrainProducts> {
        log::info!("Starting terrain workflow on {}x{} DEM", dem.width(), dem.height());

        let slope = terrain::slope(dem, &self.config.slope)?;
        let aspect = terrain::aspect(dem, &self.config.aspect)?;

        let (slope_rad, aspect_rad) = terrain::slope_aspect(dem, AngleUnit::Radians, self.config.slope.z_factor)?;
        let params = HillshadeParams {
            input_units: AngleUnit::Radians,
            ..self.config.hillshade.clone()
        };
        let hillshade = if self.config.hillshade_azimuths.is_empty() {
            terrain::hillshade(&slope_rad, &aspect_rad, &params)?
        } else {
            terrain::multidirectional_hillshade(&slope_rad, &aspect_rad, &self.config.hillshade_azimuths, &params)?
        };

        log::info!("Terrain workflow completed");
        Ok(TerrainProducts {
            slope,
            aspect,
            hillshade,
        })
    }

    /// Put `grid` on `reference`'s geometry.
    ///
    /// Grids already co-registered within the configured tolerance are
    /// relabelled without touching values; anything else is resampled.
    pub fn align(&self, grid: &Grid, reference: &Grid) -> GridResult<Grid> {
        if grid.geometry().is_coregistered(reference.geometry(), self.config.tolerance) {
            return grid.with_geometry(*reference.geometry());
        }
        log::debug!("Grid not co-registered with reference, resampling");
        Resampler::new(self.config.resample.clone()).resample_to_match(grid, reference)
    }

    /// NDVI after aligning the red band onto the NIR band
    pub fn vegetation_index(&self, nir: &Grid, red: &Grid) -> GridResult<Grid> {
        let red = self.align(red, nir)?;
        indices::ndvi(nir, &red)
    }

    /// Block-aggregate with the configured factors
    pub fn coarsen(&self, grid: &Grid) -> GridResult<Grid> {
        Aggregator::new(self.config.aggregate.clone()).apply(grid)
    }

    /// Render with the configured styling
    pub fn render(&self, grid: &Grid, renderer: &dyn GridRenderer) -> GridResult<RgbaImage> {
        renderer.render(grid, &self.config.render)
    }
}
