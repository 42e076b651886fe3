//! Lip-Sync Engine - drives the mouth parameter from the attached source

use marionette_core::MarionetteResult;
use marionette_puppet::PuppetHandle;
use marionette_time::Frame;
use tracing::{debug, info, trace};

use crate::{
    breathing_floor, rms, target_level, AnalysisGraph, AttachmentId, AudioLevelState, GraphState,
    LipSyncConfig, LipSyncMode, MediaElement, MediaStream, SampleSource, TestTone,
    DEFAULT_TONE_FREQUENCY, DEFAULT_TONE_VOLUME, MEDIA_ELEMENT_MIN_VOLUME,
};

/// Lip-sync engine for one puppet
pub struct LipSyncEngine {
    puppet: PuppetHandle,
    config: LipSyncConfig,
    graph: AnalysisGraph,
    level: AudioLevelState,
    mouth_parameter: String,
    running: bool,
    frames: u64,
}

impl LipSyncEngine {
    /// Build the engine and lock onto the first mouth parameter the puppet
    /// can read
    pub fn new(puppet: PuppetHandle, config: LipSyncConfig) -> MarionetteResult<Self> {
        config.validate()?;
        let graph = AnalysisGraph::new(config.fft_size, config.sample_rate)?;
        let mouth_parameter = resolve_mouth_parameter(&puppet, &config.mouth_parameters);
        Ok(LipSyncEngine {
            puppet,
            config,
            graph,
            level: AudioLevelState::new(),
            mouth_parameter,
            running: false,
            frames: 0,
        })
    }

    // ---- Sources ----

    /// Tap a media element, raising its volume to a usable floor
    pub fn from_media_element(&mut self, element: &mut dyn MediaElement) -> MarionetteResult<AttachmentId> {
        let source = element.create_source()?;
        if element.volume() < MEDIA_ELEMENT_MIN_VOLUME {
            element.set_volume(MEDIA_ELEMENT_MIN_VOLUME);
            debug!(volume = MEDIA_ELEMENT_MIN_VOLUME, "media element volume raised");
        }
        Ok(self.attach(source))
    }

    /// Tap a live stream
    pub fn from_stream(&mut self, stream: &dyn MediaStream) -> MarionetteResult<AttachmentId> {
        let source = stream.create_source()?;
        Ok(self.attach(source))
    }

    /// Synthesize a sine tone, for self-test without a microphone
    pub fn from_test_tone(&mut self, frequency: Option<f32>, volume: Option<f32>) -> MarionetteResult<AttachmentId> {
        let tone = TestTone::new(
            frequency.unwrap_or(DEFAULT_TONE_FREQUENCY),
            volume.unwrap_or(DEFAULT_TONE_VOLUME),
        )?;
        Ok(self.attach(Box::new(tone)))
    }

    /// Attach any source; the previous one is disconnected
    pub fn attach(&mut self, source: Box<dyn SampleSource>) -> AttachmentId {
        let id = self.graph.attach(source);
        if !self.running {
            self.running = true;
            info!(param = %self.mouth_parameter, "lip-sync started");
        }
        id
    }

    /// Disconnect an attachment. Detaching the current source stops the
    /// analysis clock; stale ids are ignored.
    pub fn detach(&mut self, id: AttachmentId) -> bool {
        let detached = self.graph.detach(id);
        if detached && self.graph.current().is_none() {
            self.running = false;
            debug!(id = %id, "lip-sync paused, no source attached");
        }
        detached
    }

    // ---- Frame ----

    /// Run the pipeline once; returns the written level, or `None` when
    /// not running
    pub fn tick(&mut self, frame: &Frame) -> Option<f32> {
        if !self.running {
            return None;
        }
        let window_rms = self.graph.read(frame.delta).map_or(0.0, rms);
        let floor = breathing_floor(
            frame.now.as_secs_f64(),
            self.config.breathing_rate,
            self.config.breathing_amplitude,
        );
        let target = target_level(window_rms, self.config.gain, self.config.threshold, floor);
        let level = self.level.step(
            target,
            frame.delta_ms() as f32,
            self.config.attack_ms,
            self.config.release_ms,
        );
        self.write(level);
        self.frames += 1;
        if self.frames % 600 == 0 {
            trace!(rms = window_rms, target, level, param = %self.mouth_parameter, "lip-sync level");
        }
        Some(level)
    }

    fn write(&self, level: f32) {
        let mut adapter = self.puppet.lock();
        let result = match self.config.mode {
            LipSyncMode::Override => adapter.set_parameter(&self.mouth_parameter, level),
            LipSyncMode::Additive => {
                let mut contribution = level.min(1.0);
                if self.config.clamp_additive {
                    if let Ok(current) = adapter.get_parameter(&self.mouth_parameter) {
                        contribution = contribution.min((1.0 - current).max(0.0));
                    }
                }
                adapter.add_parameter(&self.mouth_parameter, contribution, 1.0)
            }
        };
        if let Err(e) = result {
            trace!(param = %self.mouth_parameter, error = %e, "mouth write dropped");
        }
    }

    /// Stop analysis and release the graph. Safe to call any number of
    /// times, including before anything was attached.
    pub fn stop(&mut self) {
        if self.running {
            info!(frames = self.frames, "lip-sync stopped");
        }
        self.running = false;
        self.graph.close();
    }

    // ---- Accessors ----

    pub fn level(&self) -> f32 {
        self.level.current()
    }

    pub fn target(&self) -> f32 {
        self.level.target()
    }

    pub fn level_state(&self) -> AudioLevelState {
        self.level
    }

    pub fn mouth_parameter(&self) -> &str {
        &self.mouth_parameter
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn current_attachment(&self) -> Option<AttachmentId> {
        self.graph.current()
    }

    pub fn graph_state(&self) -> GraphState {
        self.graph.state()
    }

    pub fn config(&self) -> &LipSyncConfig {
        &self.config
    }
}

impl std::fmt::Debug for LipSyncEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LipSyncEngine")
            .field("mouth_parameter", &self.mouth_parameter)
            .field("running", &self.running)
            .field("level", &self.level)
            .field("graph", &self.graph)
            .finish_non_exhaustive()
    }
}

/// First candidate the puppet can read, or the first candidate
fn resolve_mouth_parameter(puppet: &PuppetHandle, candidates: &[String]) -> String {
    let mut adapter = puppet.lock();
    match candidates.iter().find(|id| adapter.is_gettable(id)) {
        Some(id) => {
            debug!(param = %id, "mouth parameter resolved");
            id.clone()
        }
        None => {
            let fallback = candidates.first().cloned().unwrap_or_default();
            debug!(param = %fallback, "no readable mouth parameter, using default");
            fallback
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ClipPlayer, SampleFeed, SampleSource};
    use marionette_core::MarionetteError;
    use marionette_puppet::testing::RecordingPuppet;
    use marionette_time::FrameClock;
    use std::time::Duration;

    const MOUTH: &str = "ParamMouthOpenY";

    fn engine(puppet: &RecordingPuppet, config: LipSyncConfig) -> LipSyncEngine {
        LipSyncEngine::new(PuppetHandle::new(Box::new(puppet.clone())), config).unwrap()
    }

    fn frames(engine: &mut LipSyncEngine, clock: &mut FrameClock, n: usize) -> Vec<f32> {
        (0..n)
            .filter_map(|_| engine.tick(&clock.advance_by(Duration::from_millis(16))))
            .collect()
    }

    struct BrokenStream;

    impl MediaStream for BrokenStream {
        fn create_source(&self) -> MarionetteResult<Box<dyn SampleSource>> {
            Err(MarionetteError::AudioGraph("capture device unavailable".into()))
        }
    }

    #[test]
    fn test_mouth_parameter_resolution() {
        let puppet = RecordingPuppet::new().with_parameter("PARAM_MOUTH_OPEN_Y", 0.0);
        assert_eq!(engine(&puppet, LipSyncConfig::default()).mouth_parameter(), "PARAM_MOUTH_OPEN_Y");

        let puppet = RecordingPuppet::new();
        assert_eq!(engine(&puppet, LipSyncConfig::default()).mouth_parameter(), MOUTH);
    }

    #[test]
    fn test_not_running_until_attached() {
        let puppet = RecordingPuppet::new().with_parameter(MOUTH, 0.0);
        let mut engine = engine(&puppet, LipSyncConfig::default());
        let mut clock = FrameClock::new();
        assert!(frames(&mut engine, &mut clock, 10).is_empty());
        assert!(puppet.writes_to(MOUTH).is_empty());
    }

    #[test]
    fn test_test_tone_opens_mouth() {
        let puppet = RecordingPuppet::new().with_parameter(MOUTH, 0.0);
        let mut engine = engine(&puppet, LipSyncConfig::default());
        let mut clock = FrameClock::new();

        engine.from_test_tone(None, None).unwrap();
        assert!(engine.is_running());
        let levels = frames(&mut engine, &mut clock, 60);
        assert!(*levels.last().unwrap() > 0.9);
        assert_eq!(puppet.parameter(MOUTH), levels.last().copied());
    }

    #[test]
    fn test_stop_is_idempotent_and_freezes_level() {
        let puppet = RecordingPuppet::new().with_parameter(MOUTH, 0.0);
        let mut engine = engine(&puppet, LipSyncConfig::default());
        let mut clock = FrameClock::new();

        engine.stop();
        engine.from_test_tone(Some(330.0), Some(0.2)).unwrap();
        frames(&mut engine, &mut clock, 30);
        let frozen = engine.level();
        let writes = puppet.writes_to(MOUTH).len();

        engine.stop();
        engine.stop();
        assert!(!engine.is_running());
        assert_eq!(engine.graph_state(), GraphState::Closed);
        assert!(frames(&mut engine, &mut clock, 30).is_empty());
        assert_eq!(engine.level(), frozen);
        assert_eq!(puppet.writes_to(MOUTH).len(), writes);

        // A later attach reopens the graph
        engine.from_test_tone(None, None).unwrap();
        assert_eq!(engine.graph_state(), GraphState::Open);
    }

    #[test]
    fn test_noise_gate_holds_breathing_band() {
        let puppet = RecordingPuppet::new().with_parameter(MOUTH, 0.0);
        let mut engine = engine(&puppet, LipSyncConfig::default());
        let mut clock = FrameClock::new();

        let feed = SampleFeed::new(2048);
        // 0.0002 * gain 20 = 0.004, under the 0.005 gate
        feed.push_level(0.0002, 1024);
        engine.from_stream(&feed).unwrap();

        let levels = frames(&mut engine, &mut clock, 600);
        for level in &levels[60..] {
            assert!((0.0..=0.1 + 1e-4).contains(level), "level {level}");
        }
    }

    #[test]
    fn test_attack_faster_than_release() {
        let puppet = RecordingPuppet::new().with_parameter(MOUTH, 0.0);
        let mut engine = engine(&puppet, LipSyncConfig::default());
        let mut clock = FrameClock::new();
        let feed = SampleFeed::new(1024);
        engine.from_stream(&feed).unwrap();

        feed.push_level(0.5, 1024);
        let mut rise = 0;
        while engine.level() < 0.9 {
            engine.tick(&clock.advance_by(Duration::from_millis(16)));
            rise += 1;
        }

        feed.push(&[0.0; 1024]);
        let mut fall = 0;
        // Breathing band peaks at 0.1
        while engine.level() > 0.2 {
            engine.tick(&clock.advance_by(Duration::from_millis(16)));
            fall += 1;
        }
        assert!(rise < fall, "rise {rise} fall {fall}");
    }

    #[test]
    fn test_additive_respects_headroom() {
        let puppet = RecordingPuppet::new().with_parameter(MOUTH, 0.8);
        let mut engine = engine(&puppet, LipSyncConfig::additive());
        let mut clock = FrameClock::new();
        engine.from_test_tone(None, Some(1.0)).unwrap();

        frames(&mut engine, &mut clock, 5);
        let added = puppet.writes_to(MOUTH);
        assert!(!added.is_empty());
        for value in added {
            assert!(value <= 1.0);
        }
        assert!(puppet.parameter(MOUTH).unwrap() <= 1.0 + 1e-6);
    }

    #[test]
    fn test_media_element_volume_floor() {
        let puppet = RecordingPuppet::new();
        let mut engine = engine(&puppet, LipSyncConfig::default());

        let mut quiet = ClipPlayer::new(vec![0.1; 480]);
        quiet.set_volume(0.2);
        engine.from_media_element(&mut quiet).unwrap();
        assert_eq!(quiet.volume(), 0.5);

        let mut loud = ClipPlayer::new(vec![0.1; 480]);
        loud.set_volume(0.8);
        engine.from_media_element(&mut loud).unwrap();
        assert_eq!(loud.volume(), 0.8);
    }

    #[test]
    fn test_audio_graph_error_leaves_engine_stopped() {
        let puppet = RecordingPuppet::new();
        let mut engine = engine(&puppet, LipSyncConfig::default());

        let err = engine.from_stream(&BrokenStream).unwrap_err();
        assert!(matches!(err, MarionetteError::AudioGraph(_)));
        assert!(!engine.is_running());
        assert!(engine.from_test_tone(Some(-1.0), None).is_err());
        assert!(!engine.is_running());

        // Safe to retry
        assert!(engine.from_test_tone(None, None).is_ok());
        assert!(engine.is_running());
    }

    #[test]
    fn test_attach_replaces_and_detach_ignores_stale() {
        let puppet = RecordingPuppet::new();
        let mut engine = engine(&puppet, LipSyncConfig::default());
        let mic = SampleFeed::new(1024);

        let tone = engine.from_test_tone(None, None).unwrap();
        let stream = engine.from_stream(&mic).unwrap();
        assert_eq!(engine.current_attachment(), Some(stream));

        assert!(!engine.detach(tone));
        assert!(engine.is_running());
        assert!(engine.detach(stream));
        assert!(!engine.is_running());
        assert!(!mic.is_connected());
    }
}
