//! Cadences and debouncing on top of frame deltas

use std::time::Duration;

/// Fires at most once per period of accumulated frame time.
///
/// The accumulator restarts from zero when it fires, so a slow frame never
/// causes a burst of catch-up firings.
#[derive(Debug, Clone)]
pub struct Cadence {
    period: Duration,
    accumulated: Duration,
}

impl Cadence {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            accumulated: Duration::ZERO,
        }
    }

    /// Convenience for "at most `hz` times per second"
    pub fn from_hz(hz: f64) -> Self {
        let hz = if hz.is_finite() && hz > 0.0 { hz } else { 1.0 };
        Self::new(Duration::from_secs_f64(1.0 / hz))
    }

    /// Feed one frame's delta; true when the period has elapsed
    pub fn tick(&mut self, delta: Duration) -> bool {
        self.accumulated += delta;
        if self.accumulated >= self.period {
            self.accumulated = Duration::ZERO;
            true
        } else {
            false
        }
    }

    pub fn reset(&mut self) {
        self.accumulated = Duration::ZERO;
    }

    pub fn period(&self) -> Duration {
        self.period
    }
}

/// Coalesces any number of requests between two frames into one.
///
/// Only the latest request survives; `take` hands it out once.
#[derive(Debug, Clone, Default)]
pub struct FrameDebounce<T> {
    pending: Option<T>,
    coalesced: u64,
}

impl<T> FrameDebounce<T> {
    pub fn new() -> Self {
        Self {
            pending: None,
            coalesced: 0,
        }
    }

    /// Queue a request, replacing any request not yet taken
    pub fn request(&mut self, value: T) {
        if self.pending.replace(value).is_some() {
            self.coalesced += 1;
        }
    }

    /// Take the pending request for this frame
    pub fn take(&mut self) -> Option<T> {
        self.pending.take()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// How many requests were dropped in favour of a later one
    pub fn coalesced(&self) -> u64 {
        self.coalesced
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cadence_ten_hz() {
        let mut cadence = Cadence::from_hz(10.0);
        let frame = Duration::from_micros(16_667);
        let fired = (0..60).filter(|_| cadence.tick(frame)).count();
        // One second of 60 fps frames fires about ten times, never more
        assert!(fired <= 10);
        assert!(fired >= 8);
    }

    #[test]
    fn test_cadence_restarts_after_long_frame() {
        let mut cadence = Cadence::new(Duration::from_millis(100));
        assert!(cadence.tick(Duration::from_millis(350)));
        // No catch-up burst
        assert!(!cadence.tick(Duration::from_millis(16)));
    }

    #[test]
    fn test_debounce_keeps_latest() {
        let mut d = FrameDebounce::new();
        d.request((800, 600));
        d.request((801, 600));
        d.request((1024, 768));
        assert!(d.is_pending());
        assert_eq!(d.take(), Some((1024, 768)));
        assert_eq!(d.take(), None);
        assert_eq!(d.coalesced(), 2);
    }
}
