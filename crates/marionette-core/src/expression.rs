//! Parameter-set documents and the assignments derived from them
//!
//! A parameter-set document (`*.exp3.json`) lists the parameters an
//! expression drives. When the puppet cannot apply an expression itself,
//! the director interpolates each parameter from its current value toward
//! the document's target over the declared fade-in time.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{MarionetteError, MarionetteResult};

/// Fade-in used when a document does not declare one
pub const DEFAULT_FADE_IN: Duration = Duration::from_millis(200);

/// How a target value combines with the parameter's current value.
/// Any blend name other than `Add` (including `Multiply`) fades as an
/// overwrite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BlendMode {
    /// Target is a delta added on top of the current value
    Add,
    /// Target is the absolute value
    #[default]
    #[serde(other)]
    Overwrite,
}

/// One entry of a parameter-set document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ParameterEntry {
    pub id: String,
    pub value: f32,
    #[serde(default)]
    pub blend: BlendMode,
}

/// Parameter-set document:
/// `{Parameters: [{Id, Value, Blend?}], FadeInTime?: seconds}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ParameterSetDocument {
    #[serde(default)]
    pub parameters: Vec<ParameterEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fade_in_time: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fade_out_time: Option<f32>,
}

impl ParameterSetDocument {
    /// Parse a document; `source_ref` is only used for the error message
    pub fn from_slice(bytes: &[u8], source_ref: &str) -> MarionetteResult<Self> {
        serde_json::from_slice(bytes).map_err(|e| MarionetteError::asset_parse(source_ref, e))
    }

    /// Declared fade-in, or [`DEFAULT_FADE_IN`].
    /// Truncated to whole milliseconds; negative values mean "instant".
    pub fn fade_in(&self) -> Duration {
        match self.fade_in_time {
            Some(secs) if secs.is_finite() => {
                Duration::from_millis((secs.max(0.0) * 1000.0).floor() as u64)
            }
            _ => DEFAULT_FADE_IN,
        }
    }

    pub fn parameter_ids(&self) -> impl Iterator<Item = &str> {
        self.parameters.iter().map(|p| p.id.as_str())
    }

    pub fn references(&self, parameter_id: &str) -> bool {
        self.parameters.iter().any(|p| p.id == parameter_id)
    }
}

/// Transient per-parameter state of a running fade
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterAssignment {
    pub parameter_id: String,
    pub start_value: f32,
    pub target_value: f32,
    pub blend: BlendMode,
}

impl ParameterAssignment {
    pub fn new(entry: &ParameterEntry, start_value: f32) -> Self {
        Self {
            parameter_id: entry.id.clone(),
            start_value,
            target_value: entry.value,
            blend: entry.blend,
        }
    }

    /// Value at progress `k` (clamped to [0, 1])
    pub fn value_at(&self, k: f32) -> f32 {
        let k = k.clamp(0.0, 1.0);
        match self.blend {
            BlendMode::Overwrite => self.start_value + (self.target_value - self.start_value) * k,
            BlendMode::Add => self.start_value + self.target_value * k,
        }
    }
}
