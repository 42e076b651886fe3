//! Stage - binds the puppet, director and lip-sync engine to one clock
//!
//! Per frame, in order:
//! 1. advance the frame clock
//! 2. apply the latest pending resize (at most one per frame)
//! 3. update the puppet
//! 4. director tick (expression fades, talk loop)
//! 5. lip-sync tick (mouth level write)
//! 6. anchor recompute on its own cadence

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use marionette_core::{AssetSource, DirAssetSource, MarionetteError, MarionetteResult, ModelManifest};
use marionette_director::Director;
use marionette_lipsync::LipSyncEngine;
use marionette_puppet::{Point, Puppet, PuppetHandle, Size, Viewport};
use marionette_time::{Frame, FrameClock, FrameDebounce};
use tracing::{debug, info};

use crate::{fit_transform, viewport_for, AnchorTracker, StageConfig};

/// Hooks for the hosting UI
pub trait StageObserver: Send {
    /// Fired once, after wiring and before the first frame
    fn on_ready(&mut self, _puppet: &PuppetHandle) {}

    /// Fired when the speech-bubble anchor moved
    fn on_anchor_update(&mut self, _point: Point) {}
}

/// A queued container resize
#[derive(Debug, Clone, Copy, PartialEq)]
struct ResizeRequest {
    container: Size,
    device_pixel_ratio: f32,
}

/// Render-loop integration for one puppet
pub struct Stage {
    config: StageConfig,
    puppet: PuppetHandle,
    director: Director,
    lipsync: LipSyncEngine,
    clock: FrameClock,
    anchor: AnchorTracker,
    resize: FrameDebounce<ResizeRequest>,
    container: Size,
    viewport: Viewport,
    observers: Vec<Box<dyn StageObserver>>,
    ready: bool,
    disposed: bool,
}

impl Stage {
    /// Wire a loaded puppet into a stage of the given container size
    pub fn new(
        puppet: Box<dyn Puppet>,
        assets: Arc<dyn AssetSource>,
        manifest: Option<&ModelManifest>,
        container: Size,
        device_pixel_ratio: f32,
        config: StageConfig,
    ) -> MarionetteResult<Self> {
        config.validate()?;
        let puppet = PuppetHandle::new(puppet);
        let viewport = viewport_for(container, device_pixel_ratio, &config.layout);
        puppet.lock().resize_viewport(viewport);

        let director = Director::new(puppet.clone(), assets, manifest, config.director.clone())?;
        let lipsync = LipSyncEngine::new(puppet.clone(), config.lipsync.clone())?;

        let mut stage = Stage {
            clock: FrameClock::with_config(config.clock),
            anchor: AnchorTracker::new(&config.anchor),
            resize: FrameDebounce::new(),
            container,
            viewport,
            observers: Vec::new(),
            ready: false,
            disposed: false,
            puppet,
            director,
            lipsync,
            config,
        };
        stage.relayout();
        info!(
            width = container.width,
            height = container.height,
            resolution = viewport.resolution,
            "stage created"
        );
        Ok(stage)
    }

    /// Load the model manifest from disk and resolve assets next to it
    pub fn load(
        puppet: Box<dyn Puppet>,
        manifest_path: impl AsRef<Path>,
        container: Size,
        device_pixel_ratio: f32,
        config: StageConfig,
    ) -> MarionetteResult<Self> {
        let path = manifest_path.as_ref();
        let source_ref = path.display().to_string();
        let bytes = std::fs::read(path).map_err(|e| MarionetteError::asset_fetch(&source_ref, e))?;
        let manifest = ModelManifest::from_slice(&bytes, &source_ref)?;
        let assets: Arc<dyn AssetSource> = Arc::new(DirAssetSource::for_manifest(path));
        Self::new(puppet, assets, Some(&manifest), container, device_pixel_ratio, config)
    }

    pub fn add_observer(&mut self, observer: Box<dyn StageObserver>) {
        self.observers.push(observer);
    }

    /// Announce readiness. Runs once; the first frame calls it implicitly.
    pub fn ready(&mut self) {
        if self.ready || self.disposed {
            return;
        }
        self.ready = true;
        for observer in &mut self.observers {
            observer.on_ready(&self.puppet);
        }
        self.send_anchor();
        info!("stage ready");
    }

    // ---- Frame ----

    /// Run one frame from a host timestamp in milliseconds
    pub fn tick(&mut self, host_ms: f64) -> Frame {
        let frame = self.clock.advance_to(host_ms);
        self.run_frame(&frame);
        frame
    }

    /// Run one frame from a delta the host already computed
    pub fn advance(&mut self, delta: Duration) -> Frame {
        let frame = self.clock.advance_by(delta);
        self.run_frame(&frame);
        frame
    }

    fn run_frame(&mut self, frame: &Frame) {
        if self.disposed {
            return;
        }
        self.ready();

        if let Some(request) = self.resize.take() {
            self.apply_resize(request);
        }

        self.puppet.lock().update(frame.delta);
        self.director.tick(frame);
        self.lipsync.tick(frame);

        let bounds = self.puppet.lock().bounds();
        if let Some(point) = self.anchor.tick(frame.delta, bounds) {
            self.notify_anchor(point);
        }
    }

    // ---- Resize ----

    /// Queue a container resize; bursts collapse into one per frame
    pub fn request_resize(&mut self, container: Size, device_pixel_ratio: f32) {
        if self.disposed {
            return;
        }
        self.resize.request(ResizeRequest {
            container,
            device_pixel_ratio,
        });
    }

    fn apply_resize(&mut self, request: ResizeRequest) {
        let viewport = viewport_for(request.container, request.device_pixel_ratio, &self.config.layout);
        if viewport.backing_size() != self.viewport.backing_size() {
            debug!(
                width = request.container.width,
                height = request.container.height,
                resolution = viewport.resolution,
                "viewport resized"
            );
            self.puppet.lock().resize_viewport(viewport);
        }
        self.viewport = viewport;
        self.container = request.container;
        self.relayout();
        self.send_anchor();
    }

    fn relayout(&mut self) {
        let mut adapter = self.puppet.lock();
        let logical = adapter.logical_size().unwrap_or(Size::new(1.0, 1.0));
        adapter.set_transform(fit_transform(logical, self.container, &self.config.layout));
    }

    // ---- Anchor ----

    fn send_anchor(&mut self) {
        let bounds = self.puppet.lock().bounds();
        if let Some(point) = bounds.and_then(|b| self.anchor.update(&b)) {
            self.notify_anchor(point);
        }
    }

    fn notify_anchor(&mut self, point: Point) {
        for observer in &mut self.observers {
            observer.on_anchor_update(point);
        }
    }

    // ---- Teardown ----

    /// Cancel the talk loop, stop lip-sync and release the puppet.
    /// Further frames do nothing.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        self.director.dispose();
        self.lipsync.stop();
        self.puppet.lock().dispose();
        self.observers.clear();
        info!(frames = self.clock.frames(), "stage disposed");
    }

    // ---- Accessors ----

    pub fn director(&self) -> &Director {
        &self.director
    }

    pub fn director_mut(&mut self) -> &mut Director {
        &mut self.director
    }

    pub fn lipsync(&self) -> &LipSyncEngine {
        &self.lipsync
    }

    pub fn lipsync_mut(&mut self) -> &mut LipSyncEngine {
        &mut self.lipsync
    }

    pub fn puppet(&self) -> &PuppetHandle {
        &self.puppet
    }

    pub fn config(&self) -> &StageConfig {
        &self.config
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn container(&self) -> Size {
        self.container
    }

    pub fn last_anchor(&self) -> Option<Point> {
        self.anchor.last()
    }

    pub fn frames(&self) -> u64 {
        self.clock.frames()
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}

impl std::fmt::Debug for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stage")
            .field("container", &self.container)
            .field("viewport", &self.viewport)
            .field("frames", &self.clock.frames())
            .field("ready", &self.ready)
            .field("disposed", &self.disposed)
            .field("lipsync", &self.lipsync)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marionette_core::{MemoryAssetSource, MotionGroupTable, MotionPriority};
    use marionette_puppet::testing::{PuppetCall, RecordingPuppet};
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Events {
        ready: usize,
        ready_before_update: bool,
        anchors: Vec<Point>,
    }

    struct Recorder {
        events: Arc<Mutex<Events>>,
        puppet: RecordingPuppet,
    }

    impl StageObserver for Recorder {
        fn on_ready(&mut self, _puppet: &PuppetHandle) {
            let mut events = self.events.lock();
            events.ready += 1;
            events.ready_before_update = self.puppet.update_count() == 0;
        }

        fn on_anchor_update(&mut self, point: Point) {
            self.events.lock().anchors.push(point);
        }
    }

    fn puppet() -> RecordingPuppet {
        RecordingPuppet::new()
            .with_parameter("ParamMouthOpenY", 0.0)
            .with_logical_size(Size::new(600.0, 1200.0))
            .with_motions(
                MotionGroupTable::new()
                    .with_group("Idle", ["idle_0.motion3.json"])
                    .with_group("TapBody", ["tap_0.motion3.json", "tap_1.motion3.json"]),
            )
    }

    fn stage(puppet: &RecordingPuppet) -> (Stage, Arc<Mutex<Events>>) {
        let mut config = StageConfig::default();
        config.director = marionette_director::DirectorConfig::seeded(7);
        let mut stage = Stage::new(
            Box::new(puppet.clone()),
            Arc::new(MemoryAssetSource::new()),
            None,
            Size::new(800.0, 600.0),
            1.0,
            config,
        )
        .unwrap();
        let events = Arc::new(Mutex::new(Events::default()));
        stage.add_observer(Box::new(Recorder {
            events: Arc::clone(&events),
            puppet: puppet.clone(),
        }));
        (stage, events)
    }

    #[test]
    fn test_ready_fires_once_before_first_update() {
        let puppet = puppet();
        let (mut stage, events) = stage(&puppet);
        assert!(!stage.is_ready());

        stage.tick(0.0);
        stage.tick(16.0);
        stage.ready();

        let events = events.lock();
        assert_eq!(events.ready, 1);
        assert!(events.ready_before_update);
        assert_eq!(events.anchors.len(), 1);
        assert_eq!(puppet.update_count(), 2);
    }

    #[test]
    fn test_initial_layout_and_viewport() {
        let puppet = puppet();
        let (stage, _) = stage(&puppet);
        let transform = puppet.transform();
        // min(800 * 0.82 / 600, 600 * 0.92 / 1200)
        assert!((transform.scale - 0.46).abs() < 1e-5);
        assert_eq!(transform.position, Point::new(400.0, 600.0));
        assert_eq!(puppet.viewport(), Some(stage.viewport()));
    }

    #[test]
    fn test_resize_debounced_and_only_on_change() {
        let puppet = puppet();
        let (mut stage, _) = stage(&puppet);
        stage.tick(0.0);
        puppet.clear_calls();

        stage.request_resize(Size::new(1000.0, 700.0), 1.0);
        stage.request_resize(Size::new(1024.0, 768.0), 3.0);
        stage.tick(16.0);
        let resizes: Vec<_> = puppet
            .calls()
            .into_iter()
            .filter(|c| matches!(c, PuppetCall::ResizeViewport(_)))
            .collect();
        assert_eq!(resizes, vec![PuppetCall::ResizeViewport(Viewport::new(1024.0, 768.0, 2.0))]);

        // Same backing size: relayout only
        puppet.clear_calls();
        stage.request_resize(Size::new(1024.0, 768.0), 2.5);
        stage.tick(32.0);
        assert!(!puppet.calls().iter().any(|c| matches!(c, PuppetCall::ResizeViewport(_))));
        assert!(puppet.calls().iter().any(|c| matches!(c, PuppetCall::SetTransform(_))));
    }

    #[test]
    fn test_frame_order() {
        let puppet = puppet();
        let (mut stage, _) = stage(&puppet);
        stage.lipsync_mut().from_test_tone(None, None).unwrap();
        stage.tick(0.0);
        puppet.clear_calls();

        stage.director_mut().play_motion("TapBody", 1, Some(MotionPriority::Normal)).unwrap();
        puppet.clear_calls();
        stage.tick(16.0);

        let calls = puppet.calls();
        let update = calls.iter().position(|c| matches!(c, PuppetCall::Update(_)));
        let mouth = calls
            .iter()
            .position(|c| matches!(c, PuppetCall::SetParameter { id, .. } if id == "ParamMouthOpenY"));
        assert!(update.is_some() && mouth.is_some());
        assert!(update < mouth);
    }

    #[test]
    fn test_dispose_tears_down() {
        let puppet = puppet();
        let (mut stage, _) = stage(&puppet);
        stage.lipsync_mut().from_test_tone(None, None).unwrap();
        stage.director_mut().speak_start(None);
        stage.tick(0.0);

        stage.dispose();
        stage.dispose();
        assert!(puppet.is_disposed());
        assert!(stage.director().is_disposed());
        assert!(!stage.lipsync().is_running());

        let before = puppet.calls().len();
        stage.tick(5000.0);
        stage.request_resize(Size::new(10.0, 10.0), 1.0);
        stage.tick(5016.0);
        assert_eq!(puppet.calls().len(), before);
    }

    #[test]
    fn test_load_from_manifest_file() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = r#"{
            "Version": 3,
            "FileReferences": {
                "Moc": "model.moc3",
                "Textures": ["tex.png"],
                "Expressions": [{ "Name": "smile", "File": "exp/smile.exp3.json" }],
                "Motions": { "Idle": [{ "File": "motion/idle.motion3.json" }] }
            }
        }"#;
        let path = dir.path().join("model.model3.json");
        std::fs::write(&path, manifest).unwrap();

        let stage = Stage::load(
            Box::new(RecordingPuppet::new()),
            &path,
            Size::new(400.0, 400.0),
            1.0,
            StageConfig::default(),
        )
        .unwrap();
        let catalog = stage.director().catalog();
        assert_eq!(catalog.motions.group_names().collect::<Vec<_>>(), vec!["Idle"]);
        assert!(catalog.expressions.find("smile").is_some());

        let missing = Stage::load(
            Box::new(RecordingPuppet::new()),
            dir.path().join("absent.model3.json"),
            Size::new(400.0, 400.0),
            1.0,
            StageConfig::default(),
        );
        assert!(matches!(missing, Err(MarionetteError::AssetFetch { .. })));
    }
}
