//! Unified configuration for the local SLAM front-end.
//!
//! Every tunable is a serde-deserializable struct with per-field
//! defaults; `validate()` rejects configurations that would put a
//! component into service with nonsensical parameters.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::grid::RangeDataInserterConfig;
use crate::matching::RealTimeCorrelativeScanMatcherConfig;

/// Construction-time configuration rejection.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Grid resolution must be positive.
    #[error("resolution must be positive, got {0}")]
    InvalidResolution(f32),

    /// The submap rotation threshold must be at least one scan.
    #[error("num_range_data must be at least 1")]
    InvalidNumRangeData,

    /// Hit probability outside (0.5, 0.9].
    #[error("hit_probability must be in (0.5, 0.9], got {0}")]
    InvalidHitProbability(f32),

    /// Miss probability outside [0.1, 0.5).
    #[error("miss_probability must be in [0.1, 0.5), got {0}")]
    InvalidMissProbability(f32),

    /// Search windows cannot be negative.
    #[error("search windows must be non-negative, got {0}")]
    NegativeSearchWindow(f32),

    /// Cost weights cannot be negative.
    #[error("cost weights must be non-negative, got {0}")]
    NegativeCostWeight(f32),

    /// Sensor range limits must be positive.
    #[error("range limits must be positive, got {0}")]
    InvalidRange(f32),
}

/// Top-level configuration of the local trajectory builder.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LocalSlamConfig {
    /// Submap grid resolution in meters per cell.
    #[serde(default = "default_resolution")]
    pub resolution: f32,

    /// Scans inserted into a submap before the rotation advances.
    #[serde(default = "default_num_range_data")]
    pub num_range_data: u32,

    /// Beams longer than this are treated as misses.
    #[serde(default = "default_max_range")]
    pub max_range: f32,

    /// Length that over-range beams are truncated to before being
    /// inserted as misses.
    #[serde(default = "default_missing_data_ray_length")]
    pub missing_data_ray_length: f32,

    /// Range data insertion parameters.
    #[serde(default)]
    pub inserter: RangeDataInserterConfig,

    /// Correlative scan matcher parameters.
    #[serde(default)]
    pub matcher: RealTimeCorrelativeScanMatcherConfig,
}

fn default_resolution() -> f32 {
    0.05
}
fn default_num_range_data() -> u32 {
    90
}
fn default_max_range() -> f32 {
    12.0
}
fn default_missing_data_ray_length() -> f32 {
    5.0
}

impl Default for LocalSlamConfig {
    fn default() -> Self {
        Self {
            resolution: default_resolution(),
            num_range_data: default_num_range_data(),
            max_range: default_max_range(),
            missing_data_ray_length: default_missing_data_ray_length(),
            inserter: RangeDataInserterConfig::default(),
            matcher: RealTimeCorrelativeScanMatcherConfig::default(),
        }
    }
}

impl LocalSlamConfig {
    /// Validate every section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.resolution > 0.0) {
            return Err(ConfigError::InvalidResolution(self.resolution));
        }
        if self.num_range_data < 1 {
            return Err(ConfigError::InvalidNumRangeData);
        }
        if !(self.max_range > 0.0) {
            return Err(ConfigError::InvalidRange(self.max_range));
        }
        if !(self.missing_data_ray_length > 0.0) {
            return Err(ConfigError::InvalidRange(self.missing_data_ray_length));
        }
        self.inserter.validate()?;
        self.matcher.validate()?;
        Ok(())
    }
}
