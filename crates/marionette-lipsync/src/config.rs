//! Lip-sync configuration

use marionette_core::{MarionetteError, MarionetteResult};
use serde::{Deserialize, Serialize};

/// Mouth parameter spellings, tried in order
pub const MOUTH_PARAMETER_CANDIDATES: [&str; 6] = [
    "ParamMouthOpenY",
    "PARAM_MOUTH_OPEN_Y",
    "ParamMouthOpen",
    "PARAM_MOUTH_OPEN",
    "MouthOpenY",
    "MouthOpen",
];

/// Analysis window sizes the graph accepts
pub const FFT_SIZES: [usize; 3] = [256, 512, 1024];

/// How the level is written into the mouth parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LipSyncMode {
    /// Replace whatever the animation set
    #[default]
    Override,
    /// Add on top of the animation
    Additive,
}

/// Lip-sync configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LipSyncConfig {
    /// Analysis window in samples (256 is snappier, 1024 steadier)
    pub fft_size: usize,
    /// Sample rate of the analysis graph, in Hz
    pub sample_rate: u32,
    /// Noise gate on the gained level
    pub threshold: f32,
    /// Multiplier applied to the raw RMS
    pub gain: f32,
    /// Rise time constant, in milliseconds
    pub attack_ms: f32,
    /// Fall time constant, in milliseconds
    pub release_ms: f32,
    pub mode: LipSyncMode,
    /// In additive mode, limit the contribution to the headroom left by
    /// the animation so the sum stays within 1
    pub clamp_additive: bool,
    /// Peak of the idle breathing floor
    pub breathing_amplitude: f32,
    /// Angular rate of the breathing floor, in radians per second
    pub breathing_rate: f32,
    /// Candidate mouth parameter ids, most preferred first
    pub mouth_parameters: Vec<String>,
}

impl Default for LipSyncConfig {
    fn default() -> Self {
        LipSyncConfig {
            fft_size: 512,
            sample_rate: 48_000,
            threshold: 0.005,
            gain: 20.0,
            attack_ms: 50.0,
            release_ms: 200.0,
            mode: LipSyncMode::Override,
            clamp_additive: true,
            breathing_amplitude: 0.05,
            breathing_rate: 2.0,
            mouth_parameters: MOUTH_PARAMETER_CANDIDATES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl LipSyncConfig {
    /// Quicker release, for fast talkers
    pub fn snappy() -> Self {
        LipSyncConfig {
            attack_ms: 60.0,
            release_ms: 120.0,
            ..Default::default()
        }
    }

    /// Layer on top of the puppet's own mouth animation
    pub fn additive() -> Self {
        LipSyncConfig {
            mode: LipSyncMode::Additive,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> MarionetteResult<()> {
        let invalid = |msg: String| Err(MarionetteError::InvalidConfig(msg));

        if !FFT_SIZES.contains(&self.fft_size) {
            return invalid(format!("fft_size {} not one of {:?}", self.fft_size, FFT_SIZES));
        }
        if self.sample_rate == 0 {
            return invalid("sample_rate must be positive".into());
        }
        if !(0.0..1.0).contains(&self.threshold) {
            return invalid(format!("threshold {} outside [0, 1)", self.threshold));
        }
        if !(self.gain > 0.0) {
            return invalid(format!("gain {} must be positive", self.gain));
        }
        if !(self.attack_ms > 0.0) || !(self.release_ms > 0.0) {
            return invalid(format!(
                "attack ({}) and release ({}) must be positive",
                self.attack_ms, self.release_ms
            ));
        }
        if !(0.0..=0.5).contains(&self.breathing_amplitude) {
            return invalid(format!(
                "breathing_amplitude {} outside [0, 0.5]",
                self.breathing_amplitude
            ));
        }
        if self.mouth_parameters.is_empty() {
            return invalid("mouth_parameters is empty".into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        let config = LipSyncConfig::default();
        assert_eq!(config.fft_size, 512);
        assert_eq!(config.mode, LipSyncMode::Override);
        assert_eq!(config.mouth_parameters[0], "ParamMouthOpenY");
        assert!(config.validate().is_ok());

        let snappy = LipSyncConfig::snappy();
        assert!(snappy.attack_ms < snappy.release_ms);
        assert!(snappy.validate().is_ok());
        assert_eq!(LipSyncConfig::additive().mode, LipSyncMode::Additive);
    }

    #[test]
    fn test_validate_rejects() {
        let bad = [
            LipSyncConfig {
                fft_size: 300,
                ..Default::default()
            },
            LipSyncConfig {
                threshold: 1.0,
                ..Default::default()
            },
            LipSyncConfig {
                gain: 0.0,
                ..Default::default()
            },
            LipSyncConfig {
                release_ms: f32::NAN,
                ..Default::default()
            },
            LipSyncConfig {
                mouth_parameters: Vec::new(),
                ..Default::default()
            },
        ];
        for config in bad {
            assert!(config.validate().is_err(), "{config:?} accepted");
        }
    }

    #[test]
    fn test_mode_serde() {
        let config: LipSyncConfig = serde_json::from_str(r#"{"mode": "additive", "gain": 12}"#).unwrap();
        assert_eq!(config.mode, LipSyncMode::Additive);
        assert_eq!(config.gain, 12.0);
        assert_eq!(config.fft_size, 512);
    }
}
