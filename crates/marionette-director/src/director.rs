//! Director - mood, expressions, motions and the talk loop
//!
//! State machine: idle <-> speaking, with `dispose` terminal from both.
//! Every call that should invalidate a running talk loop bumps the
//! generation; the loop notices at its next due time.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use marionette_core::{
    AssetSource, ExpressionDef, MarionetteError, MarionetteResult, ModelManifest, Mood,
    MotionPriority, ParameterAssignment, ParameterSetDocument, StageTime,
};
use marionette_puppet::{AccessPath, PuppetHandle};
use marionette_time::Frame;
use tracing::{debug, info, warn};

use crate::{Catalog, DirectorConfig, DwellSampler, ExpressionFade, ExpressionLibrary, FadeQueue, TalkLoop};

/// How an expression was applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpressionOutcome {
    /// The puppet applied it natively through this path
    Native(AccessPath),
    /// A manual fade was registered
    Manual { fade_in: Duration },
}

/// Director state as seen from outside
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectorState {
    pub mood: Mood,
    pub speaking: bool,
    pub generation: u64,
}

/// Expression/motion director for one puppet
pub struct Director {
    puppet: PuppetHandle,
    config: DirectorConfig,
    catalog: Catalog,
    library: ExpressionLibrary,
    mood: Mood,
    speaking: bool,
    generation: u64,
    disposed: bool,
    now: StageTime,
    fades: FadeQueue,
    /// Every parameter an expression has set since the last reset
    touched: BTreeSet<String>,
    current_expression: Option<String>,
    talk: Option<TalkLoop>,
    dwell: DwellSampler,
}

impl Director {
    /// Create a director, discovering the catalog from the puppet, then the
    /// manifest, then the configured fallback
    pub fn new(
        puppet: PuppetHandle,
        assets: Arc<dyn AssetSource>,
        manifest: Option<&ModelManifest>,
        config: DirectorConfig,
    ) -> MarionetteResult<Self> {
        let catalog = Catalog::discover(&puppet.lock(), manifest, &config);
        Self::with_catalog(puppet, assets, catalog, config)
    }

    /// Create a director over an explicit catalog
    pub fn with_catalog(
        puppet: PuppetHandle,
        assets: Arc<dyn AssetSource>,
        catalog: Catalog,
        config: DirectorConfig,
    ) -> MarionetteResult<Self> {
        config.validate()?;
        let (min, max) = config.dwell_range();
        let dwell = DwellSampler::new(min, max, config.rng_seed);
        info!(
            groups = catalog.motions.len(),
            expressions = catalog.expressions.len(),
            "director created"
        );
        Ok(Director {
            puppet,
            library: ExpressionLibrary::new(assets),
            catalog,
            config,
            mood: Mood::default(),
            speaking: false,
            generation: 0,
            disposed: false,
            now: StageTime::ZERO,
            fades: FadeQueue::new(),
            touched: BTreeSet::new(),
            current_expression: None,
            talk: None,
            dwell,
        })
    }

    // ---- Mood and expressions ----

    /// Store the mood and apply its best-matching expression, if any.
    /// Returns the chosen expression; failures are logged, not returned.
    pub fn set_mood(&mut self, mood: Mood) -> Option<String> {
        if self.disposed {
            return None;
        }
        self.mood = mood;
        let name = self
            .config
            .mood_hints
            .expression_for(mood, self.catalog.expressions.names())
            .map(str::to_string);

        match &name {
            Some(name) => {
                debug!(mood = %mood, expression = %name, "mood mapped to expression");
                if let Err(e) = self.set_expression(name) {
                    warn!(mood = %mood, expression = %name, error = %e, "mood expression not applied");
                }
            }
            None => debug!(mood = %mood, "no expression matches mood"),
        }
        name
    }

    /// Make `id` the only visible expression
    pub fn set_expression(&mut self, id: &str) -> MarionetteResult<ExpressionOutcome> {
        if self.disposed {
            return Err(MarionetteError::Disposed);
        }
        let (index, def) = self.catalog.expressions.require(id)?;
        let def: ExpressionDef = def.clone();
        let document = self.library.document(&def);

        let native = self.puppet.lock().set_expression(index, &def.name);
        match native {
            Ok(path) => {
                self.release_other_parameters(document.as_deref().ok());
                self.current_expression = Some(def.name.clone());
                debug!(expression = %def.name, path = %path, "expression applied natively");
                Ok(ExpressionOutcome::Native(path))
            }
            Err(_) => {
                // Prior state stays intact when the document is unusable
                let document = document.map_err(|e| {
                    warn!(expression = %def.name, error = %e, "expression document unavailable");
                    e
                })?;
                self.release_other_parameters(Some(&*document));
                let fade_in = self.fade_in_for(&document);
                self.start_fade(&def.name, &document, fade_in);
                self.current_expression = Some(def.name.clone());
                Ok(ExpressionOutcome::Manual { fade_in })
            }
        }
    }

    /// Return every expression parameter to neutral and drop the native
    /// expression
    pub fn clear_expression(&mut self) -> MarionetteResult<()> {
        if self.disposed {
            return Err(MarionetteError::Disposed);
        }
        self.release_other_parameters(None);
        if let Err(e) = self.puppet.lock().clear_expression() {
            debug!(error = %e, "native expression clear unavailable");
        }
        self.current_expression = None;
        Ok(())
    }

    /// Cancel fades and zero every touched parameter the next document
    /// does not reference (all of them when there is no document)
    fn release_other_parameters(&mut self, next: Option<&ParameterSetDocument>) {
        self.fades.cancel_all();
        let released: Vec<String> = self
            .touched
            .iter()
            .filter(|id| next.map_or(true, |doc| !doc.references(id)))
            .cloned()
            .collect();
        if released.is_empty() {
            return;
        }

        let mut adapter = self.puppet.lock();
        for id in &released {
            if let Err(e) = adapter.set_parameter(id, 0.0) {
                debug!(param = %id, error = %e, "parameter reset dropped");
            }
            self.touched.remove(id);
        }
        debug!(released = released.len(), "expression parameters reset");
    }

    fn fade_in_for(&self, document: &ParameterSetDocument) -> Duration {
        match document.fade_in_time {
            Some(_) => document.fade_in(),
            None => self.config.default_fade_in(),
        }
    }

    fn start_fade(&mut self, name: &str, document: &ParameterSetDocument, fade_in: Duration) {
        let assignments: Vec<ParameterAssignment> = {
            let mut adapter = self.puppet.lock();
            document
                .parameters
                .iter()
                .map(|entry| {
                    let start = adapter.get_parameter(&entry.id).unwrap_or(0.0);
                    ParameterAssignment::new(entry, start)
                })
                .collect()
        };
        self.touched
            .extend(document.parameter_ids().map(str::to_string));
        self.fades.push(ExpressionFade::new(name, assignments, fade_in));
    }

    // ---- Motions ----

    /// Play one motion. Group and index are validated against the catalog
    /// before the puppet is touched.
    pub fn play_motion(
        &mut self,
        group: &str,
        index: usize,
        priority: Option<MotionPriority>,
    ) -> MarionetteResult<AccessPath> {
        if self.disposed {
            return Err(MarionetteError::Disposed);
        }
        self.catalog.motions.validate(group, index)?;
        let priority = priority.unwrap_or(self.config.default_priority);
        let path = self.puppet.lock().start_motion(group, index, priority)?;
        debug!(group, index, priority = priority.level(), path = %path, "motion started");
        Ok(path)
    }

    /// Group the talk loop plays: talk hint, then idle fallback
    pub fn talk_group(&self) -> Option<&str> {
        self.config
            .talk_hints
            .first_match(self.catalog.motions.group_names())
            .or_else(|| self.idle_group())
    }

    /// Group played when speaking stops: idle hint, then the first group
    pub fn idle_group(&self) -> Option<&str> {
        self.config
            .idle_hints
            .first_match(self.catalog.motions.group_names())
            .or_else(|| self.catalog.motions.first_group())
    }

    // ---- Speaking ----

    /// Enter the speaking state and start the talk loop
    pub fn speak_start(&mut self, mood: Option<Mood>) {
        if self.disposed {
            return;
        }
        if let Some(mood) = mood {
            self.set_mood(mood);
        }
        self.speaking = true;
        self.generation += 1;
        self.talk = None;

        let Some(group) = self.talk_group().map(str::to_string) else {
            debug!("no motion groups, talk loop not started");
            return;
        };
        let len = self.catalog.motions.group(&group).map_or(0, <[_]>::len);
        if len == 0 {
            debug!(group = %group, "talk group is empty");
            return;
        }

        self.play_best_effort(&group, 0, self.config.talk_priority);
        let dwell = self.dwell.sample();
        self.talk = TalkLoop::start(self.generation, group, len, self.now, dwell);
        info!(generation = self.generation, "speaking started");
    }

    /// Leave the speaking state and settle back on the idle group
    pub fn speak_stop(&mut self) {
        if self.disposed {
            return;
        }
        self.speaking = false;
        self.generation += 1;
        info!(generation = self.generation, "speaking stopped");

        if let Some(group) = self.idle_group().map(str::to_string) {
            self.play_best_effort(&group, 0, self.config.idle_priority);
        }
    }

    fn play_best_effort(&mut self, group: &str, index: usize, priority: MotionPriority) {
        if let Err(e) = self.play_motion(group, index, Some(priority)) {
            debug!(group, index, error = %e, "motion not played");
        }
    }

    // ---- Frame ----

    /// Advance fades, then the talk loop
    pub fn tick(&mut self, frame: &Frame) {
        if self.disposed {
            return;
        }
        self.now = frame.now;

        if !self.fades.is_empty() {
            let mut adapter = self.puppet.lock();
            self.fades.tick(frame.delta, &mut adapter);
        }

        let Some(talk) = self.talk.as_ref() else {
            return;
        };
        if !talk.is_due(self.now) {
            return;
        }
        if !talk.is_current(self.generation, self.speaking) {
            debug!(
                loop_generation = talk.generation,
                generation = self.generation,
                "talk loop cancelled"
            );
            self.talk = None;
            return;
        }

        let dwell = self.dwell.sample();
        let now = self.now;
        let (group, index) = match self.talk.as_mut() {
            Some(talk) => (talk.group.clone(), talk.advance(now, dwell)),
            None => return,
        };
        self.play_best_effort(&group, index, self.config.talk_priority);
    }

    /// Terminal: cancel the loop and fades and ignore all further calls
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.generation += 1;
        self.speaking = false;
        self.disposed = true;
        self.fades.cancel_all();
        self.talk = None;
        info!(generation = self.generation, "director disposed");
    }

    // ---- Accessors ----

    pub fn state(&self) -> DirectorState {
        DirectorState {
            mood: self.mood,
            speaking: self.speaking,
            generation: self.generation,
        }
    }

    pub fn mood(&self) -> Mood {
        self.mood
    }

    pub fn is_speaking(&self) -> bool {
        self.speaking
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn current_expression(&self) -> Option<&str> {
        self.current_expression.as_deref()
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn config(&self) -> &DirectorConfig {
        &self.config
    }

    pub fn active_fades(&self) -> usize {
        self.fades.len()
    }

    pub fn talk_loop(&self) -> Option<&TalkLoop> {
        self.talk.as_ref()
    }

    pub fn puppet(&self) -> &PuppetHandle {
        &self.puppet
    }
}

impl std::fmt::Debug for Director {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Director")
            .field("mood", &self.mood)
            .field("speaking", &self.speaking)
            .field("generation", &self.generation)
            .field("disposed", &self.disposed)
            .field("current_expression", &self.current_expression)
            .field("fades", &self.fades.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marionette_core::{
        Capability, ErrorKind, ExpressionDef, ExpressionList, MemoryAssetSource, MotionGroupTable,
    };
    use marionette_puppet::testing::{PathBehavior, PuppetCall, RecordingPuppet};
    use marionette_time::FrameClock;

    const SMILE: &str = r#"{"FadeInTime": 0.2, "Parameters": [
        {"Id": "ParamMouthForm", "Value": 1.0},
        {"Id": "ParamEyeSmile", "Value": 1.0}
    ]}"#;
    const ANGRY: &str = r#"{"Parameters": [
        {"Id": "ParamMouthForm", "Value": -1.0},
        {"Id": "ParamBrowAngry", "Value": 1.0}
    ]}"#;

    fn motions() -> MotionGroupTable {
        MotionGroupTable::new()
            .with_group("Idle", ["a.motion3.json", "b.motion3.json"])
            .with_group("TapBody", ["c.motion3.json", "d.motion3.json", "e.motion3.json"])
    }

    fn expressions() -> ExpressionList {
        vec![
            ExpressionDef::new("smile", "smile.exp3.json"),
            ExpressionDef::new("angry", "angry.exp3.json"),
        ]
        .into_iter()
        .collect()
    }

    fn assets() -> Arc<dyn AssetSource> {
        Arc::new(
            MemoryAssetSource::new()
                .with_asset("smile.exp3.json", SMILE)
                .with_asset("angry.exp3.json", ANGRY),
        )
    }

    fn manual_puppet() -> RecordingPuppet {
        RecordingPuppet::new()
            .with_motions(motions())
            .with_expressions(expressions())
            .with_paths(
                &[
                    AccessPath::ExpressionManager,
                    AccessPath::ModelExpressionIndex,
                    AccessPath::ModelExpressionName,
                ],
                PathBehavior::Missing,
            )
    }

    fn director(puppet: &RecordingPuppet) -> Director {
        Director::new(
            PuppetHandle::new(Box::new(puppet.clone())),
            assets(),
            None,
            DirectorConfig::seeded(7),
        )
        .unwrap()
    }

    fn run(director: &mut Director, clock: &mut FrameClock, ms: u64) {
        for _ in 0..(ms / 10) {
            let frame = clock.advance_by(Duration::from_millis(10));
            director.tick(&frame);
        }
    }

    #[test]
    fn test_play_motion_primary_path_only() {
        let puppet = RecordingPuppet::new().with_motions(motions());
        let mut director = director(&puppet);

        let path = director.play_motion("TapBody", 1, None).unwrap();
        assert_eq!(path, AccessPath::MotionManager);
        assert_eq!(
            puppet.motion_calls(),
            vec![(AccessPath::MotionManager, "TapBody".to_string(), Some(1), MotionPriority::Force)]
        );
    }

    #[test]
    fn test_validation_before_puppet() {
        let puppet = RecordingPuppet::new().with_motions(motions());
        let mut director = director(&puppet);

        let err = director.play_motion("NoSuchGroup", 0, None).unwrap_err();
        assert_eq!(err, MarionetteError::UnknownMotionGroup("NoSuchGroup".into()));
        let err = director.play_motion("Idle", 2, None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValidationFailed);
        assert_eq!(puppet.call_count(), 0);
    }

    #[test]
    fn test_play_motion_unavailable() {
        let puppet = RecordingPuppet::new().with_motions(motions()).with_paths(
            &[AccessPath::MotionManager, AccessPath::ModelMotion, AccessPath::MotionQueue],
            PathBehavior::Missing,
        );
        let mut director = director(&puppet);
        assert_eq!(
            director.play_motion("Idle", 0, None),
            Err(MarionetteError::CapabilityUnavailable(Capability::StartMotion))
        );
    }

    #[test]
    fn test_mood_picks_matching_expression() {
        let puppet = RecordingPuppet::new()
            .with_motions(motions())
            .with_expressions(expressions());
        let mut director = director(&puppet);

        assert_eq!(director.set_mood(Mood::Happy).as_deref(), Some("smile"));
        assert_eq!(director.mood(), Mood::Happy);
        assert_eq!(
            puppet.expression_calls(),
            vec![(AccessPath::ExpressionManager, Some(0), None)]
        );
        assert_eq!(puppet.native_expression().as_deref(), Some("smile"));

        // No match is a no-op, not an error
        puppet.clear_calls();
        assert_eq!(director.set_mood(Mood::Sad), None);
        assert_eq!(puppet.call_count(), 0);
        assert_eq!(director.mood(), Mood::Sad);
    }

    #[test]
    fn test_unknown_expression() {
        let puppet = manual_puppet();
        let mut director = director(&puppet);
        assert_eq!(
            director.set_expression("frown"),
            Err(MarionetteError::UnknownExpressionId("frown".into()))
        );
        assert_eq!(puppet.call_count(), 0);
    }

    #[test]
    fn test_manual_fade_interpolates() {
        let puppet = manual_puppet().with_parameter("ParamMouthForm", 0.0);
        let mut director = director(&puppet);
        let mut clock = FrameClock::new();

        let outcome = director.set_expression("smile").unwrap();
        assert_eq!(
            outcome,
            ExpressionOutcome::Manual {
                fade_in: Duration::from_millis(200)
            }
        );
        assert_eq!(director.active_fades(), 1);

        run(&mut director, &mut clock, 100);
        let mid = puppet.parameter("ParamMouthForm").unwrap();
        assert!(mid > 0.3 && mid < 0.7, "mid-fade value {mid}");

        run(&mut director, &mut clock, 200);
        assert_eq!(director.active_fades(), 0);
        assert_eq!(puppet.parameter("ParamMouthForm"), Some(1.0));
        assert_eq!(puppet.parameter("ParamEyeSmile"), Some(1.0));
    }

    #[test]
    fn test_expression_exclusivity() {
        let puppet = manual_puppet();
        let mut director = director(&puppet);
        let mut clock = FrameClock::new();

        director.set_expression("smile").unwrap();
        run(&mut director, &mut clock, 300);
        assert_eq!(puppet.parameter("ParamEyeSmile"), Some(1.0));

        director.set_expression("angry").unwrap();
        // Owned only by smile: back to neutral right away
        assert_eq!(puppet.parameter("ParamEyeSmile"), Some(0.0));
        run(&mut director, &mut clock, 300);
        assert_eq!(puppet.parameter("ParamEyeSmile"), Some(0.0));
        assert_eq!(puppet.parameter("ParamMouthForm"), Some(-1.0));
        assert_eq!(puppet.parameter("ParamBrowAngry"), Some(1.0));
        assert_eq!(director.current_expression(), Some("angry"));
    }

    #[test]
    fn test_superseded_fade_is_cancelled() {
        let puppet = manual_puppet();
        let mut director = director(&puppet);
        let mut clock = FrameClock::new();

        director.set_expression("smile").unwrap();
        run(&mut director, &mut clock, 50);
        director.set_expression("angry").unwrap();
        assert_eq!(director.active_fades(), 1);
        run(&mut director, &mut clock, 300);
        assert_eq!(director.active_fades(), 0);
        assert_eq!(puppet.parameter("ParamEyeSmile"), Some(0.0));
    }

    #[test]
    fn test_missing_document_keeps_prior_state() {
        let puppet = manual_puppet().with_expressions(
            vec![
                ExpressionDef::new("smile", "smile.exp3.json"),
                ExpressionDef::new("ghost", "ghost.exp3.json"),
            ]
            .into_iter()
            .collect(),
        );
        let mut director = director(&puppet);
        let mut clock = FrameClock::new();

        director.set_expression("smile").unwrap();
        run(&mut director, &mut clock, 300);

        let err = director.set_expression("ghost").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Asset);
        assert_eq!(director.current_expression(), Some("smile"));
        assert_eq!(puppet.parameter("ParamEyeSmile"), Some(1.0));
    }

    #[test]
    fn test_clear_expression() {
        let puppet = manual_puppet();
        let mut director = director(&puppet);
        let mut clock = FrameClock::new();

        director.set_expression("angry").unwrap();
        run(&mut director, &mut clock, 300);
        director.clear_expression().unwrap();
        assert_eq!(puppet.parameter("ParamMouthForm"), Some(0.0));
        assert_eq!(puppet.parameter("ParamBrowAngry"), Some(0.0));
        assert_eq!(director.current_expression(), None);
    }

    #[test]
    fn test_talk_loop_round_robin() {
        let puppet = RecordingPuppet::new().with_motions(motions());
        let mut director = director(&puppet);
        let mut clock = FrameClock::new();

        director.speak_start(None);
        assert!(director.is_speaking());
        assert_eq!(director.talk_loop().map(|t| t.group.as_str()), Some("TapBody"));

        run(&mut director, &mut clock, 10_000);
        let calls = puppet.motion_calls();
        assert!(calls.len() >= 4, "only {} plays", calls.len());
        for (i, (_, group, index, priority)) in calls.iter().enumerate() {
            assert_eq!(group, "TapBody");
            assert_eq!(*index, Some(i % 3));
            assert_eq!(*priority, MotionPriority::Normal);
        }
    }

    #[test]
    fn test_speak_stop_cancels_loop() {
        let puppet = RecordingPuppet::new().with_motions(motions());
        let mut director = director(&puppet);
        let mut clock = FrameClock::new();

        director.speak_start(None);
        run(&mut director, &mut clock, 2500);
        let generation = director.generation();
        director.speak_stop();
        assert!(director.generation() > generation);

        // One idle play right away
        let calls = puppet.motion_calls();
        let (_, group, index, priority) = calls.last().unwrap().clone();
        assert_eq!((group.as_str(), index, priority), ("Idle", Some(0), MotionPriority::Idle));

        let count = calls.len();
        run(&mut director, &mut clock, 10_000);
        assert_eq!(puppet.motion_calls().len(), count);
        assert!(director.talk_loop().is_none());
    }

    #[test]
    fn test_speak_start_with_mood() {
        let puppet = RecordingPuppet::new()
            .with_motions(motions())
            .with_expressions(expressions());
        let mut director = director(&puppet);

        director.speak_start(Some(Mood::Angry));
        assert_eq!(director.mood(), Mood::Angry);
        assert_eq!(puppet.native_expression().as_deref(), Some("angry"));
        assert!(director.state().speaking);
    }

    #[test]
    fn test_talk_group_falls_back_to_idle() {
        let puppet = RecordingPuppet::new().with_motions(
            MotionGroupTable::new()
                .with_group("Special", ["s.motion3.json"])
                .with_group("StandLoop", ["l.motion3.json"]),
        );
        let director = director(&puppet);
        assert_eq!(director.talk_group(), Some("StandLoop"));
        assert_eq!(director.idle_group(), Some("StandLoop"));

        let puppet = RecordingPuppet::new()
            .with_motions(MotionGroupTable::new().with_group("Special", ["s.motion3.json"]));
        let director = Director::new(
            PuppetHandle::new(Box::new(puppet)),
            assets(),
            None,
            DirectorConfig::seeded(1),
        )
        .unwrap();
        assert_eq!(director.talk_group(), Some("Special"));
    }

    #[test]
    fn test_dispose_is_terminal() {
        let puppet = manual_puppet();
        let mut director = director(&puppet);
        let mut clock = FrameClock::new();

        director.speak_start(None);
        director.set_expression("smile").unwrap();
        let generation = director.generation();
        director.dispose();
        director.dispose();
        assert!(director.is_disposed());
        assert_eq!(director.generation(), generation + 1);

        puppet.clear_calls();
        assert_eq!(director.play_motion("Idle", 0, None), Err(MarionetteError::Disposed));
        assert_eq!(director.set_expression("angry"), Err(MarionetteError::Disposed));
        director.speak_start(None);
        director.speak_stop();
        assert_eq!(director.set_mood(Mood::Happy), None);
        run(&mut director, &mut clock, 5000);
        assert!(puppet
            .calls()
            .iter()
            .all(|c| !matches!(c, PuppetCall::StartMotion { .. } | PuppetCall::SetParameter { .. })));
        assert!(!director.is_speaking());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = DirectorConfig {
            dwell_min_ms: 5000,
            dwell_max_ms: 1000,
            ..Default::default()
        };
        let err = Director::new(
            PuppetHandle::new(Box::new(RecordingPuppet::new())),
            assets(),
            None,
            config,
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
    }
}
