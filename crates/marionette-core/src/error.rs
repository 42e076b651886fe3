//! Error types for Marionette

use thiserror::Error;

use crate::Capability;

/// Coarse classification of a [`MarionetteError`].
///
/// Callers use this to tell "nothing happened because the puppet cannot do
/// it" apart from "nothing happened because the request was invalid".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// No working puppet access path exists for the operation
    CapabilityUnavailable,
    /// The request was rejected before any puppet call
    ValidationFailed,
    /// An asset could not be fetched or parsed
    Asset,
    /// The audio analysis graph could not be built or connected
    Audio,
    /// A configuration value is out of range
    Config,
    /// The component was disposed
    Disposed,
}

/// Core Marionette errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MarionetteError {
    // Capability errors
    #[error("Capability unavailable: {0}")]
    CapabilityUnavailable(Capability),

    // Validation errors
    #[error("Unknown motion group: {0}")]
    UnknownMotionGroup(String),

    #[error("Motion index {index} out of range for group {group} ({len} motions)")]
    MotionIndexOutOfRange {
        group: String,
        index: usize,
        len: usize,
    },

    #[error("Unknown expression id: {0}")]
    UnknownExpressionId(String),

    // Asset errors
    #[error("Asset fetch failed for {source_ref}: {reason}")]
    AssetFetch { source_ref: String, reason: String },

    #[error("Asset parse failed for {source_ref}: {reason}")]
    AssetParse { source_ref: String, reason: String },

    // Audio errors
    #[error("Audio graph error: {0}")]
    AudioGraph(String),

    // Configuration errors
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // Lifecycle errors
    #[error("Component disposed")]
    Disposed,
}

impl MarionetteError {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            MarionetteError::CapabilityUnavailable(_) => ErrorKind::CapabilityUnavailable,
            MarionetteError::UnknownMotionGroup(_)
            | MarionetteError::MotionIndexOutOfRange { .. }
            | MarionetteError::UnknownExpressionId(_) => ErrorKind::ValidationFailed,
            MarionetteError::AssetFetch { .. } | MarionetteError::AssetParse { .. } => {
                ErrorKind::Asset
            }
            MarionetteError::AudioGraph(_) => ErrorKind::Audio,
            MarionetteError::InvalidConfig(_) => ErrorKind::Config,
            MarionetteError::Disposed => ErrorKind::Disposed,
        }
    }

    /// Shorthand for building an [`MarionetteError::AssetFetch`]
    pub fn asset_fetch(source_ref: impl Into<String>, reason: impl ToString) -> Self {
        MarionetteError::AssetFetch {
            source_ref: source_ref.into(),
            reason: reason.to_string(),
        }
    }

    /// Shorthand for building an [`MarionetteError::AssetParse`]
    pub fn asset_parse(source_ref: impl Into<String>, reason: impl ToString) -> Self {
        MarionetteError::AssetParse {
            source_ref: source_ref.into(),
            reason: reason.to_string(),
        }
    }
}

/// Result type for Marionette operations
pub type MarionetteResult<T> = Result<T, MarionetteError>;
