//! Configuration system for mosaic geometry, motion and loading behaviour
//!
//! Options can be picked from a preset profile, built by hand, or loaded from
//! a JSON document. Every path goes through [`MosaicConfig::validate`].

use crate::core::constants::*;
use crate::{MosaicError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub enum MosaicProfile {
    Balanced,
    LowResource,
    Custom(MosaicConfig),
}

impl MosaicProfile {
    pub fn resolve(&self) -> MosaicConfig {
        match self {
            Self::Balanced => MosaicConfig::default(),
            Self::LowResource => MosaicConfig {
                max_zoom_level: 2.0,
                preload_margin: 50.0,
                removal_margin: 150.0,
                preview_batch_size: 20,
                image_cache_capacity: 64,
                fade_in_ms: 0,
                ..MosaicConfig::default()
            },
            Self::Custom(config) => config.clone(),
        }
    }
}

impl Default for MosaicProfile {
    fn default() -> Self {
        Self::Balanced
    }
}

/// All recognised options for a mosaic instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MosaicConfig {
    /// Base tile edge in pixels (zoom level 1.0)
    pub tile_size: f64,
    pub min_zoom_level: f64,
    pub max_zoom_level: f64,
    pub preload_margin: f64,
    /// Must exceed `preload_margin`
    pub removal_margin: f64,
    /// Per-tick multiplier on drift velocity
    pub drift_decay_factor: f64,
    pub drift_velocity_scale: f64,
    pub drift_stop_threshold: f64,
    pub wheel_zoom_sensitivity: f64,
    pub preview_batch_size: usize,
    /// `None` lets a hung fetch keep its tile in `Downloading` forever
    pub fetch_timeout_ms: Option<u64>,
    /// Opt-in: a failed per-tile fetch moves the tile to `Errored`
    pub mark_fetch_failures_errored: bool,
    pub image_cache_capacity: usize,
    pub fade_in_ms: u64,
}

impl Default for MosaicConfig {
    fn default() -> Self {
        Self {
            tile_size: TILE_SIZE,
            min_zoom_level: MIN_ZOOM_LEVEL,
            max_zoom_level: MAX_ZOOM_LEVEL,
            preload_margin: PRELOAD_MARGIN,
            removal_margin: REMOVAL_MARGIN,
            drift_decay_factor: DRIFT_DECAY_FACTOR,
            drift_velocity_scale: DRIFT_VELOCITY_SCALE,
            drift_stop_threshold: DRIFT_STOP_THRESHOLD,
            wheel_zoom_sensitivity: WHEEL_ZOOM_SENSITIVITY,
            preview_batch_size: PREVIEW_BATCH_SIZE,
            fetch_timeout_ms: None,
            mark_fetch_failures_errored: false,
            image_cache_capacity: IMAGE_CACHE_CAPACITY,
            fade_in_ms: FADE_IN_MS,
        }
    }
}

impl MosaicConfig {
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(MosaicError::InvalidConfig(msg));

        if !(self.tile_size > 0.0) {
            return invalid(format!("tile_size must be positive, got {}", self.tile_size));
        }
        if !(self.min_zoom_level > 0.0) {
            return invalid(format!(
                "min_zoom_level must be positive, got {}",
                self.min_zoom_level
            ));
        }
        if self.min_zoom_level > self.max_zoom_level {
            return invalid(format!(
                "min_zoom_level {} exceeds max_zoom_level {}",
                self.min_zoom_level, self.max_zoom_level
            ));
        }
        if !(1.0 >= self.min_zoom_level && 1.0 <= self.max_zoom_level) {
            return invalid("zoom range must include the base level 1.0".to_string());
        }
        if self.preload_margin < 0.0 {
            return invalid(format!(
                "preload_margin must not be negative, got {}",
                self.preload_margin
            ));
        }
        if self.removal_margin <= self.preload_margin {
            return invalid(format!(
                "removal_margin {} must exceed preload_margin {}",
                self.removal_margin, self.preload_margin
            ));
        }
        if !(self.drift_decay_factor > 0.0 && self.drift_decay_factor < 1.0) {
            return invalid(format!(
                "drift_decay_factor must be in (0, 1), got {}",
                self.drift_decay_factor
            ));
        }
        if self.preview_batch_size == 0 {
            return invalid("preview_batch_size must be at least 1".to_string());
        }
        Ok(())
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: MosaicConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn fetch_timeout(&self) -> Option<Duration> {
        self.fetch_timeout_ms.map(Duration::from_millis)
    }

    pub fn fade_in(&self) -> Duration {
        Duration::from_millis(self.fade_in_ms)
    }

    pub fn grid(&self) -> GridConfig {
        GridConfig {
            min_tile_size: self.tile_size * self.min_zoom_level,
            max_tile_size: self.tile_size * self.max_zoom_level,
            preload_margin: self.preload_margin,
            removal_margin: self.removal_margin,
        }
    }
}

/// The subset of options the grid engine needs
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridConfig {
    pub min_tile_size: f64,
    pub max_tile_size: f64,
    pub preload_margin: f64,
    pub removal_margin: f64,
}

impl GridConfig {
    pub fn clamp_tile_size(&self, size: f64) -> f64 {
        size.clamp(self.min_tile_size, self.max_tile_size)
    }
}

impl Default for GridConfig {
    fn default() -> Self {
        MosaicConfig::default().grid()
    }
}
