//! Stage configuration
//!
//! One document configures the whole stage: director, lip-sync, layout,
//! anchor cadence, frame clock and logging. Every section falls back to
//! its defaults when omitted.

use std::path::Path;
use std::time::Duration;

use marionette_core::{MarionetteError, MarionetteResult};
use marionette_director::DirectorConfig;
use marionette_lipsync::LipSyncConfig;
use marionette_time::FrameClockConfig;
use serde::{Deserialize, Serialize};

use crate::LogConfig;

/// Fit of the puppet inside its container
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Share of the container width the puppet may take
    pub safe_width: f32,
    /// Share of the container height the puppet may take
    pub safe_height: f32,
    /// Ceiling on the renderer resolution
    pub max_device_pixel_ratio: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        LayoutConfig {
            safe_width: 0.82,
            safe_height: 0.92,
            max_device_pixel_ratio: 2.0,
        }
    }
}

impl LayoutConfig {
    /// Fill the whole container at native resolution
    pub fn full_bleed() -> Self {
        LayoutConfig {
            safe_width: 1.0,
            safe_height: 1.0,
            max_device_pixel_ratio: 1.0,
        }
    }

    pub fn validate(&self) -> MarionetteResult<()> {
        let in_unit = |v: f32| v > 0.0 && v <= 1.0;
        if !in_unit(self.safe_width) || !in_unit(self.safe_height) {
            return Err(MarionetteError::InvalidConfig(format!(
                "safe area {}x{} outside (0, 1]",
                self.safe_width, self.safe_height
            )));
        }
        if !(self.max_device_pixel_ratio >= 1.0) {
            return Err(MarionetteError::InvalidConfig(format!(
                "max_device_pixel_ratio {} below 1",
                self.max_device_pixel_ratio
            )));
        }
        Ok(())
    }
}

/// Speech-bubble anchor reporting
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnchorConfig {
    /// Recompute period, in milliseconds
    pub period_ms: u64,
    /// Movement below this many logical pixels is not reported
    pub min_movement_px: f32,
    /// Head point height as a share of the puppet bounds, from the top
    pub head_fraction: f32,
}

impl Default for AnchorConfig {
    fn default() -> Self {
        AnchorConfig {
            period_ms: 100,
            min_movement_px: 1.0,
            head_fraction: 0.2,
        }
    }
}

impl AnchorConfig {
    pub fn period(&self) -> Duration {
        Duration::from_millis(self.period_ms)
    }

    pub fn validate(&self) -> MarionetteResult<()> {
        if self.period_ms == 0 {
            return Err(MarionetteError::InvalidConfig("anchor period_ms is zero".into()));
        }
        if !(self.min_movement_px >= 0.0) {
            return Err(MarionetteError::InvalidConfig(format!(
                "anchor min_movement_px {} is negative",
                self.min_movement_px
            )));
        }
        if !(0.0..=1.0).contains(&self.head_fraction) {
            return Err(MarionetteError::InvalidConfig(format!(
                "anchor head_fraction {} outside [0, 1]",
                self.head_fraction
            )));
        }
        Ok(())
    }
}

/// Stage configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StageConfig {
    pub director: DirectorConfig,
    pub lipsync: LipSyncConfig,
    pub layout: LayoutConfig,
    pub anchor: AnchorConfig,
    pub clock: FrameClockConfig,
    pub log: LogConfig,
}

impl StageConfig {
    /// Parse and validate a JSON document
    pub fn from_json_str(json: &str) -> MarionetteResult<Self> {
        let config: StageConfig = serde_json::from_str(json)
            .map_err(|e| MarionetteError::InvalidConfig(format!("stage config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> MarionetteResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| MarionetteError::InvalidConfig(format!("{}: {e}", path.display())))?;
        Self::from_json_str(&json)
    }

    pub fn to_json_string(&self) -> MarionetteResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| MarionetteError::InvalidConfig(format!("stage config: {e}")))
    }

    pub fn validate(&self) -> MarionetteResult<()> {
        self.director.validate()?;
        self.lipsync.validate()?;
        self.layout.validate()?;
        self.anchor.validate()?;
        if !(self.clock.max_delta_ms > 0.0) {
            return Err(MarionetteError::InvalidConfig(format!(
                "clock max_delta_ms {} must be positive",
                self.clock.max_delta_ms
            )));
        }
        Ok(())
    }
}
