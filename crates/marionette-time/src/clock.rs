//! Frame clock - stage time advanced by the host's render callback

use std::time::Duration;

use marionette_core::StageTime;
use serde::{Deserialize, Serialize};

/// Default ceiling for a single frame delta
pub const DEFAULT_MAX_FRAME_DELTA: Duration = Duration::from_millis(100);

/// A single frame as seen by the components it drives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    /// Stage time after this frame's advance
    pub now: StageTime,
    /// Time since the previous frame, already clamped
    pub delta: Duration,
    /// Frame counter, starting at 1
    pub index: u64,
}

impl Frame {
    /// Delta in fractional milliseconds
    pub fn delta_ms(&self) -> f64 {
        marionette_core::duration_ms(self.delta)
    }
}

/// Frame clock configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameClockConfig {
    /// Largest delta a single frame may report, in milliseconds.
    /// Protects smoothing filters from a huge step after the host was
    /// suspended (background tab, system sleep).
    pub max_delta_ms: f64,
}

impl Default for FrameClockConfig {
    fn default() -> Self {
        Self {
            max_delta_ms: DEFAULT_MAX_FRAME_DELTA.as_secs_f64() * 1000.0,
        }
    }
}

/// Frame clock
/// INVARIANT: stage time is monotonically non-decreasing, deltas never exceed the ceiling
#[derive(Debug, Clone)]
pub struct FrameClock {
    now: StageTime,
    /// Last host timestamp, in milliseconds
    last_host_ms: Option<f64>,
    max_delta: Duration,
    frames: u64,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::with_config(FrameClockConfig::default())
    }

    pub fn with_config(config: FrameClockConfig) -> Self {
        FrameClock {
            now: StageTime::ZERO,
            last_host_ms: None,
            max_delta: marionette_core::millis_f64(config.max_delta_ms),
            frames: 0,
        }
    }

    /// Advance from a host timestamp in milliseconds
    /// (e.g. the `requestAnimationFrame` argument).
    /// The first call establishes the reference and reports a zero delta;
    /// timestamps that go backwards also report zero.
    pub fn advance_to(&mut self, host_ms: f64) -> Frame {
        let delta_ms = match self.last_host_ms {
            Some(last) if host_ms > last => host_ms - last,
            _ => 0.0,
        };
        if self.last_host_ms.map_or(true, |last| host_ms > last) {
            self.last_host_ms = Some(host_ms);
        }
        self.advance_by(marionette_core::millis_f64(delta_ms))
    }

    /// Advance by a delta the host already computed
    pub fn advance_by(&mut self, delta: Duration) -> Frame {
        let clamped = delta.min(self.max_delta);
        self.now = self.now.saturating_add(clamped);
        self.frames += 1;
        Frame {
            now: self.now,
            delta: clamped,
            index: self.frames,
        }
    }

    /// Current stage time without advancing
    pub fn now(&self) -> StageTime {
        self.now
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn max_delta(&self) -> Duration {
        self.max_delta
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}
