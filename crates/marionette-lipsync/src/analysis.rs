//! Loudness analysis - the pure per-frame pipeline

/// Root-mean-square amplitude of a window; zero for an empty window
pub fn rms(window: &[f32]) -> f32 {
    if window.is_empty() {
        return 0.0;
    }
    let sum: f32 = window.iter().map(|s| s * s).sum();
    (sum / window.len() as f32).sqrt()
}

/// Noise gate: zero at or below `threshold`, otherwise renormalized so the
/// gate opens at zero and saturates at one
pub fn gate(raw: f32, threshold: f32) -> f32 {
    if raw <= threshold {
        0.0
    } else {
        ((raw - threshold) / (1.0 - threshold)).min(1.0)
    }
}

/// Idle breathing floor at time `t_secs`, oscillating in [0, 2 * amplitude]
pub fn breathing_floor(t_secs: f64, rate: f32, amplitude: f32) -> f32 {
    ((t_secs * rate as f64).sin() as f32) * amplitude + amplitude
}

/// Exponential approach factor for one frame: `1 - exp(-dt / tau)`,
/// with `tau` floored at 1 ms
pub fn smoothing_factor(dt_ms: f32, tau_ms: f32) -> f32 {
    1.0 - (-dt_ms.max(0.0) / tau_ms.max(1.0)).exp()
}

/// Target level for a window: gain, gate, then breathing floor
pub fn target_level(window_rms: f32, gain: f32, threshold: f32, floor: f32) -> f32 {
    gate(window_rms * gain, threshold).max(floor)
}

/// Current and target mouth level.
/// `current` only moves through [`AudioLevelState::step`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AudioLevelState {
    current: f32,
    target: f32,
}

impl AudioLevelState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> f32 {
        self.current
    }

    pub fn target(&self) -> f32 {
        self.target
    }

    /// Move toward `target` with the attack constant when rising and the
    /// release constant otherwise
    pub fn step(&mut self, target: f32, dt_ms: f32, attack_ms: f32, release_ms: f32) -> f32 {
        self.target = target.clamp(0.0, 1.0);
        let tau = if self.target > self.current {
            attack_ms
        } else {
            release_ms
        };
        let k = smoothing_factor(dt_ms, tau);
        self.current += (self.target - self.current) * k;
        self.current
    }
}
