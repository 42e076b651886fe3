//! Manual expression fades
//!
//! A fade interpolates every parameter of one expression from its value at
//! registration time toward the document's target. Progress is measured
//! from the first frame after registration, so time that passed before the
//! fade existed does not count. Fades run in registration order once per
//! frame and unregister themselves at k = 1.

use std::time::Duration;

use marionette_core::ParameterAssignment;
use marionette_puppet::CapabilityAdapter;
use tracing::{debug, trace};

/// One expression fading in
#[derive(Debug, Clone)]
pub struct ExpressionFade {
    expression: String,
    assignments: Vec<ParameterAssignment>,
    fade_in: Duration,
    elapsed: Duration,
    started: bool,
}

impl ExpressionFade {
    pub fn new(expression: impl Into<String>, assignments: Vec<ParameterAssignment>, fade_in: Duration) -> Self {
        Self {
            expression: expression.into(),
            assignments,
            fade_in,
            elapsed: Duration::ZERO,
            started: false,
        }
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    pub fn assignments(&self) -> &[ParameterAssignment] {
        &self.assignments
    }

    /// Progress in [0, 1]; a zero-length fade is complete immediately
    pub fn progress(&self) -> f32 {
        if self.fade_in.is_zero() {
            1.0
        } else {
            (self.elapsed.as_secs_f64() / self.fade_in.as_secs_f64()).min(1.0) as f32
        }
    }

    pub fn is_complete(&self) -> bool {
        self.progress() >= 1.0
    }

    /// Advance by one frame and write the interpolated values.
    /// The first frame only writes the start values. Returns true when the
    /// fade has reached k = 1.
    pub fn step(&mut self, delta: Duration, adapter: &mut CapabilityAdapter) -> bool {
        if self.started {
            self.elapsed = self.elapsed.saturating_add(delta);
        } else {
            self.started = true;
        }
        let k = self.progress();
        for assignment in &self.assignments {
            let value = assignment.value_at(k);
            if let Err(e) = adapter.set_parameter(&assignment.parameter_id, value) {
                trace!(param = %assignment.parameter_id, error = %e, "fade write dropped");
            }
        }
        k >= 1.0
    }
}

/// Fades in registration order
#[derive(Debug, Clone, Default)]
pub struct FadeQueue {
    fades: Vec<ExpressionFade>,
}

impl FadeQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, fade: ExpressionFade) {
        debug!(expression = %fade.expression, fade_in_ms = fade.fade_in.as_millis() as u64, "fade registered");
        self.fades.push(fade);
    }

    /// Drop every fade that has not finished
    pub fn cancel_all(&mut self) -> usize {
        let cancelled = self.fades.len();
        if cancelled > 0 {
            debug!(cancelled, "fades superseded");
        }
        self.fades.clear();
        cancelled
    }

    /// Run every fade once; completed fades are removed
    pub fn tick(&mut self, delta: Duration, adapter: &mut CapabilityAdapter) {
        self.fades.retain_mut(|fade| !fade.step(delta, adapter));
    }

    pub fn len(&self) -> usize {
        self.fades.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fades.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ExpressionFade> {
        self.fades.iter()
    }
}
