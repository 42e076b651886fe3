//! Talk loop - round-robin motion playback while speaking
//!
//! The loop holds no task handle. It captures the director's generation
//! when it starts; at every due time the director compares that token with
//! the current generation and the speaking flag, and drops the loop if
//! either no longer matches.

use std::time::Duration;

use marionette_core::StageTime;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Randomized dwell between two talk-loop plays
#[derive(Debug, Clone)]
pub struct DwellSampler {
    min_ms: u64,
    max_ms: u64,
    rng: StdRng,
}

impl DwellSampler {
    pub fn new(min: Duration, max: Duration, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let min_ms = min.as_millis() as u64;
        let max_ms = (max.as_millis() as u64).max(min_ms);
        Self { min_ms, max_ms, rng }
    }

    /// Next dwell, uniform in [min, max]
    pub fn sample(&mut self) -> Duration {
        Duration::from_millis(self.rng.gen_range(self.min_ms..=self.max_ms))
    }

    pub fn max(&self) -> Duration {
        Duration::from_millis(self.max_ms)
    }
}

/// State of a running talk loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TalkLoop {
    /// Generation captured at start
    pub generation: u64,
    pub group: String,
    /// Motions in the group; never zero
    pub len: usize,
    /// Index of the next play
    pub next_index: usize,
    /// Stage time of the next play
    pub due: StageTime,
}

impl TalkLoop {
    /// Loop over `len` motions, the first already played at `now`.
    /// Returns `None` for an empty group.
    pub fn start(generation: u64, group: impl Into<String>, len: usize, now: StageTime, dwell: Duration) -> Option<Self> {
        if len == 0 {
            return None;
        }
        Some(TalkLoop {
            generation,
            group: group.into(),
            len,
            next_index: 1 % len,
            due: now + dwell,
        })
    }

    pub fn is_due(&self, now: StageTime) -> bool {
        now >= self.due
    }

    /// Is this loop iteration still valid?
    pub fn is_current(&self, generation: u64, speaking: bool) -> bool {
        speaking && self.generation == generation
    }

    /// Take the index to play now and schedule the next play
    pub fn advance(&mut self, now: StageTime, dwell: Duration) -> usize {
        let index = self.next_index;
        self.next_index = (self.next_index + 1) % self.len;
        self.due = now + dwell;
        index
    }
}
