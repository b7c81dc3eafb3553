//! Replay configuration.

use crate::reveal::{ArcLengthReveal, ArcLengthScheduler, DEFAULT_REVEAL_STEP, IndexScheduler};
use crate::ribbon::{DEFAULT_RESAMPLE_MULTIPLIER, RibbonGeometryBuilder3D};
use crate::style::{SerializableColor, StrokeStyle};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Tunables for the 2D recreation and the 3D ribbon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplayConfig {
    pub pen_color: SerializableColor,
    /// Line width at capture scale.
    pub base_line_width: f64,
    /// Live preview background.
    pub preview_background: SerializableColor,
    /// Fraction of ribbon length revealed per frame.
    pub reveal_step: f64,
    /// Centerline samples per input segment.
    pub resample_multiplier: usize,
    /// Ribbon depth at full pressure, in units of capture height.
    pub depth: f32,
    /// Ribbon width, in units of capture height.
    pub ribbon_width: f32,
    pub ribbon_color: SerializableColor,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            pen_color: SerializableColor::black(),
            base_line_width: 2.0,
            preview_background: SerializableColor::white(),
            reveal_step: DEFAULT_REVEAL_STEP,
            resample_multiplier: DEFAULT_RESAMPLE_MULTIPLIER,
            depth: 0.5,
            ribbon_width: 0.01,
            ribbon_color: SerializableColor::new(30, 64, 175, 255),
        }
    }
}

impl ReplayConfig {
    /// Parse and validate a configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.base_line_width.is_finite() && self.base_line_width > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "base_line_width must be positive, got {}",
                self.base_line_width
            )));
        }
        if !(self.reveal_step.is_finite() && self.reveal_step > 0.0 && self.reveal_step <= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "reveal_step must be in (0, 1], got {}",
                self.reveal_step
            )));
        }
        if self.resample_multiplier == 0 {
            return Err(ConfigError::Invalid("resample_multiplier must be at least 1".to_string()));
        }
        if !(self.ribbon_width.is_finite() && self.ribbon_width > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "ribbon_width must be positive, got {}",
                self.ribbon_width
            )));
        }
        if !self.depth.is_finite() {
            return Err(ConfigError::Invalid("depth must be finite".to_string()));
        }
        Ok(())
    }

    pub fn stroke_style(&self) -> StrokeStyle {
        StrokeStyle::new(self.pen_color.into(), self.base_line_width)
    }

    pub fn ribbon_builder(&self) -> RibbonGeometryBuilder3D {
        RibbonGeometryBuilder3D::new(self.resample_multiplier, self.depth, self.ribbon_width)
    }

    pub fn index_scheduler(&self) -> IndexScheduler {
        IndexScheduler::default()
    }

    pub fn arc_length_scheduler(&self) -> ArcLengthScheduler {
        ArcLengthScheduler::new(ArcLengthReveal::new(self.reveal_step))
    }
}
