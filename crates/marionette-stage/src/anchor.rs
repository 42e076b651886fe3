//! Anchor tracking - where the UI overlay attaches to the puppet

use std::time::Duration;

use marionette_puppet::{Point, Rect};
use marionette_time::Cadence;

use crate::AnchorConfig;

/// Head point of the puppet: horizontally centered, `head_fraction` of the
/// height below the top of the bounds
pub fn head_point(bounds: &Rect, head_fraction: f32) -> Point {
    bounds.point_at(0.5, head_fraction)
}

/// Low-frequency anchor reporter.
/// INVARIANT: a point is reported only when it moved more than the
/// threshold from the last reported point
#[derive(Debug, Clone)]
pub struct AnchorTracker {
    cadence: Cadence,
    min_movement: f32,
    head_fraction: f32,
    last: Option<Point>,
}

impl AnchorTracker {
    pub fn new(config: &AnchorConfig) -> Self {
        AnchorTracker {
            cadence: Cadence::new(config.period()),
            min_movement: config.min_movement_px,
            head_fraction: config.head_fraction,
            last: None,
        }
    }

    /// Feed one frame; recomputes only when the cadence fires
    pub fn tick(&mut self, delta: Duration, bounds: Option<Rect>) -> Option<Point> {
        if !self.cadence.tick(delta) {
            return None;
        }
        bounds.and_then(|b| self.update(&b))
    }

    /// Recompute now, outside the cadence (after a relayout)
    pub fn update(&mut self, bounds: &Rect) -> Option<Point> {
        let point = head_point(bounds, self.head_fraction);
        let moved = match self.last {
            Some(prev) => prev.distance(&point) > self.min_movement,
            None => true,
        };
        if moved {
            self.last = Some(point);
            Some(point)
        } else {
            None
        }
    }

    pub fn last(&self) -> Option<Point> {
        self.last
    }

    /// Forget the last report so the next recompute is always reported
    pub fn reset(&mut self) {
        self.last = None;
        self.cadence.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> Duration {
        Duration::from_micros(16_667)
    }

    #[test]
    fn test_head_point() {
        let p = head_point(&Rect::new(100.0, 50.0, 200.0, 400.0), 0.2);
        assert_eq!(p, Point::new(200.0, 130.0));
    }

    #[test]
    fn test_reports_only_movement() {
        let mut tracker = AnchorTracker::new(&AnchorConfig::default());
        let bounds = Rect::new(0.0, 0.0, 100.0, 100.0);

        assert_eq!(tracker.update(&bounds), Some(Point::new(50.0, 20.0)));
        assert_eq!(tracker.update(&bounds), None);
        // Sub-pixel sway is suppressed
        assert_eq!(tracker.update(&Rect::new(0.5, 0.5, 100.0, 100.0)), None);
        assert!(tracker.update(&Rect::new(3.0, 0.0, 100.0, 100.0)).is_some());
    }

    #[test]
    fn test_at_most_ten_hz() {
        let mut tracker = AnchorTracker::new(&AnchorConfig::default());
        let mut reports = 0;
        for i in 0..60 {
            // Moves 5 px every frame
            let bounds = Rect::new(i as f32 * 5.0, 0.0, 100.0, 100.0);
            if tracker.tick(frame(), Some(bounds)).is_some() {
                reports += 1;
            }
        }
        assert!(reports <= 10, "{reports} reports in one second");
        assert!(reports >= 8);
    }

    #[test]
    fn test_no_bounds_no_report() {
        let mut tracker = AnchorTracker::new(&AnchorConfig::default());
        assert_eq!(tracker.tick(Duration::from_millis(100), None), None);
        assert_eq!(tracker.last(), None);
    }
}
