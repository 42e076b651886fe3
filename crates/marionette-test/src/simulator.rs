//! Stage Simulator - deterministic frame-by-frame driving of a full stage
//!
//! Simulates:
//! - A display callback with a fixed interval and optional jitter
//! - Scripted audio fed into the lip-sync engine as it would arrive live
//! - The recording puppet underneath, for call inspection

use std::sync::Arc;
use std::time::Duration;

use marionette_core::{AssetSource, MarionetteResult};
use marionette_director::DirectorConfig;
use marionette_lipsync::SampleFeed;
use marionette_puppet::testing::RecordingPuppet;
use marionette_puppet::Size;
use marionette_stage::{Stage, StageConfig};
use marionette_time::Frame;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::fixtures;

/// Frame interval jitter of the simulated display
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameJitter {
    /// Maximum deviation per frame (microseconds)
    pub jitter_us: u32,
}

impl FrameJitter {
    /// Perfectly regular frames
    pub fn perfect() -> Self {
        FrameJitter { jitter_us: 0 }
    }

    /// A busy browser main thread
    pub fn browser() -> Self {
        FrameJitter { jitter_us: 4_000 }
    }

    /// Apply jitter to the nominal interval
    pub fn apply(&self, interval: Duration, rng: &mut StdRng) -> Duration {
        if self.jitter_us == 0 {
            return interval;
        }
        let j = self.jitter_us as i64;
        let us = interval.as_micros() as i64 + rng.gen_range(-j..=j);
        Duration::from_micros(us.max(0) as u64)
    }
}

/// One constant-loudness stretch of a script
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AudioSegment {
    /// RMS amplitude of the signal
    pub amplitude: f32,
    pub duration: Duration,
}

/// Piecewise-constant loudness over time; silence after the end
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AudioScript {
    segments: Vec<AudioSegment>,
}

impl AudioScript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tone(mut self, amplitude: f32, duration: Duration) -> Self {
        self.segments.push(AudioSegment { amplitude, duration });
        self
    }

    pub fn silence(self, duration: Duration) -> Self {
        self.tone(0.0, duration)
    }

    /// Loudness `elapsed` after the script started
    pub fn amplitude_at(&self, elapsed: Duration) -> f32 {
        let mut start = Duration::ZERO;
        for segment in &self.segments {
            let end = start + segment.duration;
            if elapsed < end {
                return segment.amplitude;
            }
            start = end;
        }
        0.0
    }

    pub fn duration(&self) -> Duration {
        self.segments.iter().map(|s| s.duration).sum()
    }
}

/// Simulator configuration
#[derive(Clone, Debug)]
pub struct SimulatorConfig {
    pub frame_interval: Duration,
    pub jitter: FrameJitter,
    pub seed: u64,
    pub container: Size,
    pub device_pixel_ratio: f32,
    pub stage: StageConfig,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        SimulatorConfig {
            frame_interval: Duration::from_micros(16_667),
            jitter: FrameJitter::perfect(),
            seed: 0,
            container: Size::new(800.0, 600.0),
            device_pixel_ratio: 1.0,
            stage: StageConfig::default(),
        }
    }
}

impl SimulatorConfig {
    /// Default config with seeded dwell times and frame jitter
    pub fn seeded(seed: u64) -> Self {
        let mut config = Self {
            seed,
            ..Default::default()
        };
        config.stage.director = DirectorConfig::seeded(seed);
        config
    }

    pub fn with_jitter(mut self, jitter: FrameJitter) -> Self {
        self.jitter = jitter;
        self
    }
}

/// Full stage on a simulated display
pub struct StageSimulator {
    stage: Stage,
    puppet: RecordingPuppet,
    feed: SampleFeed,
    script: Option<(AudioScript, Duration)>,
    config: SimulatorConfig,
    rng: StdRng,
    elapsed: Duration,
    levels: Vec<f32>,
}

impl StageSimulator {
    /// Stage over `puppet` with the stock expression documents
    pub fn new(puppet: RecordingPuppet, config: SimulatorConfig) -> MarionetteResult<Self> {
        Self::with_assets(puppet, fixtures::expression_assets(), config)
    }

    pub fn with_assets(
        puppet: RecordingPuppet,
        assets: Arc<dyn AssetSource>,
        config: SimulatorConfig,
    ) -> MarionetteResult<Self> {
        let stage = Stage::new(
            Box::new(puppet.clone()),
            assets,
            None,
            config.container,
            config.device_pixel_ratio,
            config.stage.clone(),
        )?;
        let feed = SampleFeed::new(config.stage.lipsync.fft_size * 2);
        Ok(StageSimulator {
            stage,
            puppet,
            feed,
            script: None,
            rng: StdRng::seed_from_u64(config.seed),
            config,
            elapsed: Duration::ZERO,
            levels: Vec::new(),
        })
    }

    /// Attach the simulated microphone and start `script` now
    pub fn play_script(&mut self, script: AudioScript) -> MarionetteResult<()> {
        self.feed.clear();
        self.stage.lipsync_mut().from_stream(&self.feed)?;
        self.script = Some((script, self.elapsed));
        Ok(())
    }

    /// Run one frame
    pub fn step(&mut self) -> Frame {
        let delta = self.config.jitter.apply(self.config.frame_interval, &mut self.rng);
        self.feed_audio(delta);
        let frame = self.stage.advance(delta);
        self.elapsed += delta;
        if self.stage.lipsync().is_running() {
            self.levels.push(self.stage.lipsync().level());
        }
        frame
    }

    fn feed_audio(&mut self, delta: Duration) {
        let Some((script, started)) = &self.script else {
            return;
        };
        let amplitude = script.amplitude_at(self.elapsed.saturating_sub(*started));
        let sample_rate = self.config.stage.lipsync.sample_rate as f64;
        let count = (delta.as_secs_f64() * sample_rate).round() as usize;
        self.feed.push_level(amplitude, count);
    }

    /// Run frames until `duration` of simulated time has passed
    pub fn run_for(&mut self, duration: Duration) -> u64 {
        let until = self.elapsed + duration;
        let mut frames = 0;
        while self.elapsed < until {
            self.step();
            frames += 1;
        }
        frames
    }

    pub fn run_frames(&mut self, frames: u64) {
        for _ in 0..frames {
            self.step();
        }
    }

    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    pub fn stage_mut(&mut self) -> &mut Stage {
        &mut self.stage
    }

    pub fn puppet(&self) -> &RecordingPuppet {
        &self.puppet
    }

    pub fn feed(&self) -> &SampleFeed {
        &self.feed
    }

    /// Lip-sync level after every frame it was running
    pub fn levels(&self) -> &[f32] {
        &self.levels
    }

    pub fn clear_levels(&mut self) {
        self.levels.clear();
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }
}
