//! Recording puppet - an in-memory, instrumented puppet for tests
//!
//! Every access path can be made to work, go missing, reject or refuse.
//! Clones share state, so a test keeps one clone as a probe after handing
//! another to an adapter.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use marionette_core::{ExpressionList, MotionGroupTable, MotionPriority};
use parking_lot::Mutex;

use crate::{AccessPath, PathError, PathResult, Puppet, Rect, Size, Transform, Viewport};

/// How a single access path behaves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathBehavior {
    /// Succeeds
    Works,
    /// Not present on this runtime
    Missing,
    /// Present but fails
    Rejects,
    /// Present, accepts the call and declines to act
    Refuses,
}

/// A recorded puppet call
#[derive(Debug, Clone, PartialEq)]
pub enum PuppetCall {
    GetParameter {
        path: AccessPath,
        id: String,
    },
    SetParameter {
        path: AccessPath,
        id: String,
        value: f32,
    },
    AddParameter {
        path: AccessPath,
        id: String,
        value: f32,
    },
    StartMotion {
        path: AccessPath,
        group: String,
        index: Option<usize>,
        priority: MotionPriority,
    },
    SetExpression {
        path: AccessPath,
        index: Option<usize>,
        name: Option<String>,
    },
    ClearExpression {
        path: AccessPath,
    },
    Update(Duration),
    SetTransform(Transform),
    ResizeViewport(Viewport),
    Dispose,
}

impl PuppetCall {
    /// Frame-level housekeeping rather than a capability call
    pub fn is_scene(&self) -> bool {
        matches!(
            self,
            PuppetCall::Update(_)
                | PuppetCall::SetTransform(_)
                | PuppetCall::ResizeViewport(_)
                | PuppetCall::Dispose
        )
    }
}

#[derive(Debug, Default)]
struct RecorderState {
    behaviors: HashMap<AccessPath, PathBehavior>,
    add_supported: bool,
    parameters: HashMap<String, f32>,
    motions: Option<MotionGroupTable>,
    expressions: Option<ExpressionList>,
    native_expression: Option<String>,
    logical_size: Option<Size>,
    transform: Transform,
    viewport: Option<Viewport>,
    disposed: bool,
    calls: Vec<PuppetCall>,
}

impl RecorderState {
    fn behavior(&self, path: AccessPath) -> PathBehavior {
        self.behaviors
            .get(&path)
            .copied()
            .unwrap_or(PathBehavior::Works)
    }

    /// Gate a bool-returning call and record it unless the path is missing
    fn gate(&mut self, path: AccessPath, call: PuppetCall) -> PathResult<bool> {
        match self.behavior(path) {
            PathBehavior::Missing => Err(PathError::Missing),
            PathBehavior::Rejects => {
                self.calls.push(call);
                Err(PathError::Rejected(format!("{path} failed")))
            }
            PathBehavior::Refuses => {
                self.calls.push(call);
                Ok(false)
            }
            PathBehavior::Works => {
                self.calls.push(call);
                Ok(true)
            }
        }
    }

    /// Gate a parameter call; refusal reads as a rejection
    fn gate_parameter(&mut self, path: AccessPath, call: PuppetCall) -> PathResult<()> {
        match self.gate(path, call)? {
            true => Ok(()),
            false => Err(PathError::Rejected(format!("{path} declined"))),
        }
    }

    fn read(&mut self, path: AccessPath, id: &str) -> PathResult<f32> {
        self.gate_parameter(
            path,
            PuppetCall::GetParameter {
                path,
                id: id.to_string(),
            },
        )?;
        self.parameters
            .get(id)
            .copied()
            .ok_or_else(|| PathError::Rejected(format!("unknown parameter {id}")))
    }

    fn write(&mut self, path: AccessPath, id: &str, value: f32) -> PathResult<()> {
        self.gate_parameter(
            path,
            PuppetCall::SetParameter {
                path,
                id: id.to_string(),
                value,
            },
        )?;
        self.parameters.insert(id.to_string(), value);
        Ok(())
    }

    fn add(&mut self, path: AccessPath, id: &str, value: f32, weight: f32) -> PathResult<()> {
        if !self.add_supported {
            return Err(PathError::Missing);
        }
        self.gate_parameter(
            path,
            PuppetCall::AddParameter {
                path,
                id: id.to_string(),
                value,
            },
        )?;
        *self.parameters.entry(id.to_string()).or_insert(0.0) += value * weight;
        Ok(())
    }

    fn motion(
        &mut self,
        path: AccessPath,
        group: &str,
        index: Option<usize>,
        priority: MotionPriority,
    ) -> PathResult<bool> {
        self.gate(
            path,
            PuppetCall::StartMotion {
                path,
                group: group.to_string(),
                index,
                priority,
            },
        )
    }

    fn expression(
        &mut self,
        path: AccessPath,
        index: Option<usize>,
        name: Option<&str>,
    ) -> PathResult<bool> {
        let applied = self.gate(
            path,
            PuppetCall::SetExpression {
                path,
                index,
                name: name.map(str::to_string),
            },
        )?;
        if applied {
            self.native_expression = match (index, name) {
                (_, Some(name)) => Some(name.to_string()),
                (Some(index), None) => self
                    .expressions
                    .as_ref()
                    .and_then(|list| list.iter().nth(index))
                    .map(|def| def.name.clone()),
                (None, None) => None,
            };
        }
        Ok(applied)
    }

    fn clear(&mut self, path: AccessPath) -> PathResult<bool> {
        let cleared = self.gate(path, PuppetCall::ClearExpression { path })?;
        if cleared {
            self.native_expression = None;
        }
        Ok(cleared)
    }
}

/// In-memory puppet that records every call
#[derive(Debug, Clone)]
pub struct RecordingPuppet {
    state: Arc<Mutex<RecorderState>>,
}

impl Default for RecordingPuppet {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingPuppet {
    /// Every path works, additive writes supported, no catalog
    pub fn new() -> Self {
        let state = RecorderState {
            add_supported: true,
            ..Default::default()
        };
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    pub fn with_path(self, path: AccessPath, behavior: PathBehavior) -> Self {
        self.set_path(path, behavior);
        self
    }

    /// Make every path in `paths` behave the same way
    pub fn with_paths(self, paths: &[AccessPath], behavior: PathBehavior) -> Self {
        for path in paths {
            self.set_path(*path, behavior);
        }
        self
    }

    /// Whether the runtime has native additive writes
    pub fn with_add_support(self, supported: bool) -> Self {
        self.state.lock().add_supported = supported;
        self
    }

    pub fn with_parameter(self, id: &str, value: f32) -> Self {
        self.state.lock().parameters.insert(id.to_string(), value);
        self
    }

    pub fn with_motions(self, motions: MotionGroupTable) -> Self {
        self.state.lock().motions = Some(motions);
        self
    }

    pub fn with_expressions(self, expressions: ExpressionList) -> Self {
        self.state.lock().expressions = Some(expressions);
        self
    }

    pub fn with_logical_size(self, size: Size) -> Self {
        self.state.lock().logical_size = Some(size);
        self
    }

    /// Change a path's behavior after the puppet was handed out
    pub fn set_path(&self, path: AccessPath, behavior: PathBehavior) {
        self.state.lock().behaviors.insert(path, behavior);
    }

    pub fn parameter(&self, id: &str) -> Option<f32> {
        self.state.lock().parameters.get(id).copied()
    }

    pub fn native_expression(&self) -> Option<String> {
        self.state.lock().native_expression.clone()
    }

    pub fn transform(&self) -> Transform {
        self.state.lock().transform
    }

    pub fn viewport(&self) -> Option<Viewport> {
        self.state.lock().viewport
    }

    pub fn is_disposed(&self) -> bool {
        self.state.lock().disposed
    }

    pub fn calls(&self) -> Vec<PuppetCall> {
        self.state.lock().calls.clone()
    }

    /// Capability calls only, scene housekeeping excluded
    pub fn capability_calls(&self) -> Vec<PuppetCall> {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|c| !c.is_scene())
            .cloned()
            .collect()
    }

    /// Number of capability calls recorded
    pub fn call_count(&self) -> usize {
        self.state.lock().calls.iter().filter(|c| !c.is_scene()).count()
    }

    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    /// Recorded motion starts as (path, group, index, priority)
    pub fn motion_calls(&self) -> Vec<(AccessPath, String, Option<usize>, MotionPriority)> {
        self.state
            .lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                PuppetCall::StartMotion {
                    path,
                    group,
                    index,
                    priority,
                } => Some((*path, group.clone(), *index, *priority)),
                _ => None,
            })
            .collect()
    }

    /// Recorded native expression requests as (path, index, name)
    pub fn expression_calls(&self) -> Vec<(AccessPath, Option<usize>, Option<String>)> {
        self.state
            .lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                PuppetCall::SetExpression { path, index, name } => {
                    Some((*path, *index, name.clone()))
                }
                _ => None,
            })
            .collect()
    }

    /// Every value written to one parameter, in order
    pub fn writes_to(&self, id: &str) -> Vec<f32> {
        self.state
            .lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                PuppetCall::SetParameter { id: p, value, .. }
                | PuppetCall::AddParameter { id: p, value, .. }
                    if p == id =>
                {
                    Some(*value)
                }
                _ => None,
            })
            .collect()
    }

    /// Number of `update` calls
    pub fn update_count(&self) -> usize {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|c| matches!(c, PuppetCall::Update(_)))
            .count()
    }
}

impl Puppet for RecordingPuppet {
    fn core_parameter(&self, id: &str) -> PathResult<f32> {
        self.state.lock().read(AccessPath::CoreParameters, id)
    }

    fn set_core_parameter(&mut self, id: &str, value: f32) -> PathResult<()> {
        self.state.lock().write(AccessPath::CoreParameters, id, value)
    }

    fn add_core_parameter(&mut self, id: &str, value: f32, weight: f32) -> PathResult<()> {
        self.state
            .lock()
            .add(AccessPath::CoreParameters, id, value, weight)
    }

    fn model_parameter(&self, id: &str) -> PathResult<f32> {
        self.state.lock().read(AccessPath::ModelParameters, id)
    }

    fn set_model_parameter(&mut self, id: &str, value: f32) -> PathResult<()> {
        self.state.lock().write(AccessPath::ModelParameters, id, value)
    }

    fn add_model_parameter(&mut self, id: &str, value: f32, weight: f32) -> PathResult<()> {
        self.state
            .lock()
            .add(AccessPath::ModelParameters, id, value, weight)
    }

    fn manager_start_motion(
        &mut self,
        group: &str,
        index: usize,
        priority: MotionPriority,
    ) -> PathResult<bool> {
        self.state
            .lock()
            .motion(AccessPath::MotionManager, group, Some(index), priority)
    }

    fn model_motion(
        &mut self,
        group: &str,
        index: Option<usize>,
        priority: MotionPriority,
    ) -> PathResult<bool> {
        self.state
            .lock()
            .motion(AccessPath::ModelMotion, group, index, priority)
    }

    fn queue_motion(
        &mut self,
        group: &str,
        index: usize,
        priority: MotionPriority,
    ) -> PathResult<bool> {
        self.state
            .lock()
            .motion(AccessPath::MotionQueue, group, Some(index), priority)
    }

    fn manager_set_expression(&mut self, index: usize) -> PathResult<bool> {
        self.state
            .lock()
            .expression(AccessPath::ExpressionManager, Some(index), None)
    }

    fn model_expression_by_index(&mut self, index: usize) -> PathResult<bool> {
        self.state
            .lock()
            .expression(AccessPath::ModelExpressionIndex, Some(index), None)
    }

    fn model_expression_by_name(&mut self, name: &str) -> PathResult<bool> {
        self.state
            .lock()
            .expression(AccessPath::ModelExpressionName, None, Some(name))
    }

    fn manager_clear_expression(&mut self) -> PathResult<bool> {
        self.state.lock().clear(AccessPath::ExpressionManager)
    }

    fn model_clear_expression(&mut self) -> PathResult<bool> {
        self.state.lock().clear(AccessPath::ModelExpressionName)
    }

    fn list_motion_groups(&self) -> Option<MotionGroupTable> {
        self.state.lock().motions.clone()
    }

    fn list_expressions(&self) -> Option<ExpressionList> {
        self.state.lock().expressions.clone()
    }

    fn update(&mut self, delta: Duration) {
        self.state.lock().calls.push(PuppetCall::Update(delta));
    }

    fn logical_size(&self) -> Option<Size> {
        self.state.lock().logical_size
    }

    fn bounds(&self) -> Option<Rect> {
        let state = self.state.lock();
        state
            .logical_size
            .map(|size| state.transform.bounds_of(size))
    }

    fn set_transform(&mut self, transform: Transform) {
        let mut state = self.state.lock();
        state.transform = transform;
        state.calls.push(PuppetCall::SetTransform(transform));
    }

    fn resize_viewport(&mut self, viewport: Viewport) {
        let mut state = self.state.lock();
        state.viewport = Some(viewport);
        state.calls.push(PuppetCall::ResizeViewport(viewport));
    }

    fn dispose(&mut self) {
        let mut state = self.state.lock();
        state.disposed = true;
        state.calls.push(PuppetCall::Dispose);
    }
}
