//! Bake Configuration
//!
//! Shadow map size, depth bias and depth format with serde support so the
//! settings can live next to the rest of a scene description.

use serde::{Deserialize, Serialize};

use crate::backend::DepthFormat;
use crate::error::{ShadowError, ShadowResult};

/// Smallest accepted shadow map edge length
pub const MIN_RESOLUTION: u32 = 1;

/// Largest accepted shadow map edge length
pub const MAX_RESOLUTION: u32 = 16384;

/// Settings for the shadow map baking stage
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadowBakeConfig {
    /// Edge length of every (square) shadow map in texels
    pub resolution: u32,

    /// Slope-scaled depth bias applied while rendering occluders
    pub polygon_offset_factor: f32,

    /// Constant depth bias applied while rendering occluders
    pub polygon_offset_units: f32,

    /// Storage format of the depth textures
    pub depth_format: DepthFormat,
}

impl Default for ShadowBakeConfig {
    fn default() -> Self {
        Self {
            resolution: 256,
            polygon_offset_factor: 1.1,
            polygon_offset_units: 4.0,
            depth_format: DepthFormat::Depth24Plus,
        }
    }
}

impl ShadowBakeConfig {
    /// Small maps, cheap to bake
    pub fn low_quality() -> Self {
        Self {
            resolution: 256,
            ..Default::default()
        }
    }

    /// Large maps for crisp shadow edges
    pub fn high_quality() -> Self {
        Self {
            resolution: 2048,
            depth_format: DepthFormat::Depth32Float,
            ..Default::default()
        }
    }

    /// Parse a configuration from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> ShadowResult<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| ShadowError::InvalidConfig(e.to_string()))?;
        config.check()?;
        Ok(config)
    }

    /// Serialize to pretty-printed JSON
    pub fn to_json(&self) -> ShadowResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| ShadowError::InvalidConfig(e.to_string()))
    }

    /// Validate configuration and clamp values to valid ranges
    pub fn validate(&mut self) {
        self.resolution = self.resolution.clamp(MIN_RESOLUTION, MAX_RESOLUTION);
        if !self.polygon_offset_factor.is_finite() {
            self.polygon_offset_factor = 1.1;
        }
        if !self.polygon_offset_units.is_finite() {
            self.polygon_offset_units = 4.0;
        }
    }

    /// Reject values that cannot be baked with instead of clamping them
    pub fn check(&self) -> ShadowResult<()> {
        if self.resolution < MIN_RESOLUTION || self.resolution > MAX_RESOLUTION {
            return Err(ShadowError::InvalidConfig(format!(
                "resolution {} outside {}..={}",
                self.resolution, MIN_RESOLUTION, MAX_RESOLUTION
            )));
        }
        if !self.polygon_offset_factor.is_finite() || !self.polygon_offset_units.is_finite() {
            return Err(ShadowError::InvalidConfig(format!(
                "polygon offset ({}, {}) must be finite",
                self.polygon_offset_factor, self.polygon_offset_units
            )));
        }
        Ok(())
    }

    /// Size of one shadow map texel in normalized texture coordinates
    #[inline]
    pub fn texel_size(&self) -> f32 {
        1.0 / self.resolution.max(MIN_RESOLUTION) as f32
    }
}
