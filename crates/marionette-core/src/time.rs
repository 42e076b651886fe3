//! Time primitives for Marionette
//!
//! Everything in Marionette runs off one external render clock. `StageTime`
//! is the position on that clock: monotonic, local, microseconds since the
//! stage started ticking.

use std::ops::{Add, Sub};
use std::time::Duration;

/// Stage time - monotonic, frame-driven
/// Represented as microseconds since the first frame
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct StageTime(pub u64);

impl StageTime {
    pub const ZERO: StageTime = StageTime(0);

    #[inline]
    pub fn from_micros(micros: u64) -> Self {
        StageTime(micros)
    }

    #[inline]
    pub fn from_millis(millis: u64) -> Self {
        StageTime(millis * 1000)
    }

    #[inline]
    pub fn from_millis_f64(millis: f64) -> Self {
        StageTime((millis.max(0.0) * 1000.0) as u64)
    }

    #[inline]
    pub fn as_micros(self) -> u64 {
        self.0
    }

    #[inline]
    pub fn as_millis_f64(self) -> f64 {
        self.0 as f64 / 1000.0
    }

    #[inline]
    pub fn as_secs_f64(self) -> f64 {
        self.0 as f64 / 1_000_000.0
    }

    #[inline]
    pub fn saturating_add(self, duration: Duration) -> Self {
        StageTime(self.0.saturating_add(duration.as_micros() as u64))
    }

    /// Time elapsed since `earlier`, zero if `earlier` is in the future
    #[inline]
    pub fn since(self, earlier: StageTime) -> Duration {
        Duration::from_micros(self.0.saturating_sub(earlier.0))
    }
}

impl Add<Duration> for StageTime {
    type Output = StageTime;

    #[inline]
    fn add(self, rhs: Duration) -> Self::Output {
        self.saturating_add(rhs)
    }
}

impl Sub<StageTime> for StageTime {
    type Output = Duration;

    #[inline]
    fn sub(self, rhs: StageTime) -> Self::Output {
        self.since(rhs)
    }
}

impl std::fmt::Debug for StageTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "t({:.3}ms)", self.as_millis_f64())
    }
}

/// Convert a duration to fractional milliseconds
#[inline]
pub fn duration_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

/// Build a duration from fractional milliseconds, negative values clamp to zero
#[inline]
pub fn millis_f64(ms: f64) -> Duration {
    Duration::from_secs_f64(ms.max(0.0) / 1000.0)
}
