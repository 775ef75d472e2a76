use crate::core::aggregate::AggregateParams;
use crate::core::resample::ResampleParams;
use crate::core::terrain::{AspectParams, HillshadeParams, SlopeParams};
use crate::io::render::RenderConfig;
use crate::types::{GridError, GridResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// All processing knobs in one place, loadable from JSON.
///
/// Missing sections fall back to their defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Allowed georeferencing difference for band math (map units)
    pub tolerance: f64,
    pub slope: SlopeParams,
    pub aspect: AspectParams,
    pub hillshade: HillshadeParams,
    /// Extra azimuths for multi-directional hillshade; empty for a single light
    pub hillshade_azimuths: Vec<f64>,
    pub resample: ResampleParams,
    pub aggregate: AggregateParams,
    pub render: RenderConfig,
}

impl ProcessingConfig {
    pub fn from_json_str(text: &str) -> GridResult<Self> {
        let config: ProcessingConfig =
            serde_json::from_str(text).map_err(|e| GridError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> GridResult<Self> {
        let path = path.as_ref();
        log::info!("Loading processing config from {}", path.display());
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn to_json(&self) -> GridResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| GridError::Config(e.to_string()))
    }

    /// Reject values no operation could accept
    pub fn validate(&self) -> GridResult<()> {
        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            return Err(GridError::Config(format!(
                "tolerance must be a non-negative number, got {}",
                self.tolerance
            )));
        }
        if !self.slope.z_factor.is_finite() || self.slope.z_factor <= 0.0 {
            return Err(GridError::Config(format!(
                "slope.z_factor must be finite and positive, got {}",
                self.slope.z_factor
            )));
        }
        self.hillshade
            .validate()
            .map_err(|e| GridError::Config(format!("hillshade: {}", e)))?;
        if self.hillshade_azimuths.iter().any(|a| !a.is_finite()) {
            return Err(GridError::Config("hillshade_azimuths must be finite".to_string()));
        }
        if self.aggregate.factor_x == 0 || self.aggregate.factor_y == 0 {
            return Err(GridError::Config("aggregate factors must be positive".to_string()));
        }
        self.render
            .ramp
            .validate()
            .map_err(|e| GridError::Config(format!("render: {}", e)))?;
        Ok(())
    }
}
