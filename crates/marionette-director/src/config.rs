//! Director configuration

use std::time::Duration;

use marionette_core::{
    ExpressionList, KeywordPolicy, MarionetteError, MarionetteResult, MoodHints, MotionGroupTable,
    MotionPriority, DEFAULT_FADE_IN,
};
use serde::{Deserialize, Serialize};

/// Director configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectorConfig {
    /// Group-name hints for the talk loop, tried first
    pub talk_hints: KeywordPolicy,
    /// Group-name hints for idle motions
    pub idle_hints: KeywordPolicy,
    /// Expression-name hints per mood
    pub mood_hints: MoodHints,
    /// Shortest dwell between talk-loop plays, in milliseconds
    pub dwell_min_ms: u64,
    /// Longest dwell between talk-loop plays, in milliseconds
    pub dwell_max_ms: u64,
    /// Priority of talk-loop plays
    pub talk_priority: MotionPriority,
    /// Priority of the idle play after speaking stops
    pub idle_priority: MotionPriority,
    /// Priority of `play_motion` when the caller does not give one
    pub default_priority: MotionPriority,
    /// Fade-in for documents that do not declare one, in milliseconds
    pub default_fade_in_ms: u64,
    /// Seed for dwell randomization; entropy when absent
    pub rng_seed: Option<u64>,
    /// Motion table used when neither the puppet nor a manifest lists motions
    pub fallback_motions: MotionGroupTable,
    /// Expressions used when neither the puppet nor a manifest lists them
    pub fallback_expressions: ExpressionList,
}

impl Default for DirectorConfig {
    fn default() -> Self {
        DirectorConfig {
            talk_hints: KeywordPolicy::new(["talk", "speak", "gesture", "tap"]),
            idle_hints: KeywordPolicy::new(["idle", "loop", "stand"]),
            mood_hints: MoodHints::default(),
            dwell_min_ms: 2000,
            dwell_max_ms: 3200,
            talk_priority: MotionPriority::Normal,
            idle_priority: MotionPriority::Idle,
            default_priority: MotionPriority::Force,
            default_fade_in_ms: DEFAULT_FADE_IN.as_millis() as u64,
            rng_seed: None,
            fallback_motions: MotionGroupTable::new(),
            fallback_expressions: ExpressionList::default(),
        }
    }
}

impl DirectorConfig {
    /// Deterministic dwell times, for tests and replays
    pub fn seeded(seed: u64) -> Self {
        DirectorConfig {
            rng_seed: Some(seed),
            ..Default::default()
        }
    }

    /// Last-resort motion table for models whose metadata cannot be read
    pub fn with_fallback_motions(mut self, motions: MotionGroupTable) -> Self {
        self.fallback_motions = motions;
        self
    }

    pub fn with_fallback_expressions(mut self, expressions: ExpressionList) -> Self {
        self.fallback_expressions = expressions;
        self
    }

    pub fn dwell_range(&self) -> (Duration, Duration) {
        (
            Duration::from_millis(self.dwell_min_ms),
            Duration::from_millis(self.dwell_max_ms),
        )
    }

    pub fn default_fade_in(&self) -> Duration {
        Duration::from_millis(self.default_fade_in_ms)
    }

    pub fn validate(&self) -> MarionetteResult<()> {
        if self.dwell_min_ms > self.dwell_max_ms {
            return Err(MarionetteError::InvalidConfig(format!(
                "dwell_min_ms ({}) exceeds dwell_max_ms ({})",
                self.dwell_min_ms, self.dwell_max_ms
            )));
        }
        if self.dwell_max_ms == 0 {
            return Err(MarionetteError::InvalidConfig(
                "dwell_max_ms must be positive".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DirectorConfig::default();
        assert_eq!(
            config.dwell_range(),
            (Duration::from_millis(2000), Duration::from_millis(3200))
        );
        assert_eq!(config.default_fade_in(), Duration::from_millis(200));
        assert!(config.talk_hints.matches("TapBody"));
        assert!(config.idle_hints.matches("Idle"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_dwell() {
        let config = DirectorConfig {
            dwell_min_ms: 4000,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(MarionetteError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_partial_json() {
        let config: DirectorConfig =
            serde_json::from_str(r#"{"talk_hints": ["m01"], "rng_seed": 7}"#).unwrap();
        assert!(config.talk_hints.matches("motion_m01"));
        assert_eq!(config.rng_seed, Some(7));
        assert_eq!(config.dwell_max_ms, 3200);
    }
}
