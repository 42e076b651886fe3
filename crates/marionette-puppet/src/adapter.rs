//! Capability Adapter - cached resolution of capabilities to access paths
//!
//! A call walks the resolution table for its capability in priority order.
//! A path that reports `Missing` is remembered and never probed again for
//! this puppet; a path that rejects or declines is only skipped for this
//! call, so it still comes first next time. The last path that succeeded is
//! kept for inspection but never reorders the walk.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use marionette_core::{
    Capability, ExpressionList, MarionetteError, MarionetteResult, MotionGroupTable,
    MotionPriority,
};
use tracing::{debug, warn};

use crate::{AccessPath, PathError, PathResult, Puppet, Rect, ResolutionTable, Size, Transform, Viewport};

/// What the adapter has learned about one capability
#[derive(Debug, Clone, Default)]
struct Resolution {
    last: Option<AccessPath>,
    missing: HashSet<AccessPath>,
    warned: bool,
}

/// Capability adapter over one live puppet
pub struct CapabilityAdapter {
    puppet: Box<dyn Puppet>,
    table: ResolutionTable,
    cache: HashMap<Capability, Resolution>,
}

impl CapabilityAdapter {
    /// Adapter with the default resolution table
    pub fn new(puppet: Box<dyn Puppet>) -> Self {
        Self::with_table(puppet, ResolutionTable::default())
    }

    pub fn with_table(puppet: Box<dyn Puppet>, table: ResolutionTable) -> Self {
        CapabilityAdapter {
            puppet,
            table,
            cache: HashMap::new(),
        }
    }

    pub fn table(&self) -> &ResolutionTable {
        &self.table
    }

    /// Path that last served a capability
    pub fn resolved(&self, capability: Capability) -> Option<AccessPath> {
        self.cache.get(&capability).and_then(|r| r.last)
    }

    /// Paths known to be missing for a capability
    pub fn known_missing(&self, capability: Capability) -> Vec<AccessPath> {
        let mut missing: Vec<AccessPath> = self
            .cache
            .get(&capability)
            .map(|r| r.missing.iter().copied().collect())
            .unwrap_or_default();
        missing.sort();
        missing
    }

    /// Forget everything learned so far
    pub fn reset_cache(&mut self) {
        self.cache.clear();
    }

    /// Candidate paths for this call: table order minus known-missing paths
    fn candidates(&self, capability: Capability) -> Vec<AccessPath> {
        let resolution = self.cache.get(&capability);
        self.table
            .order(capability)
            .iter()
            .copied()
            .filter(|p| resolution.map_or(true, |r| !r.missing.contains(p)))
            .collect()
    }

    /// Walk the candidate paths until one succeeds.
    /// `attempt` returns `Ok(None)` when the path accepted the call but
    /// declined to act.
    fn resolve<T, F>(&mut self, capability: Capability, mut attempt: F) -> MarionetteResult<(AccessPath, T)>
    where
        F: FnMut(&mut dyn Puppet, AccessPath) -> PathResult<Option<T>>,
    {
        for path in self.candidates(capability) {
            match attempt(&mut *self.puppet, path) {
                Ok(Some(value)) => {
                    let resolution = self.cache.entry(capability).or_default();
                    if resolution.last != Some(path) {
                        debug!(capability = %capability, path = %path, "capability resolved");
                        resolution.last = Some(path);
                    }
                    return Ok((path, value));
                }
                Ok(None) => {
                    debug!(capability = %capability, path = %path, "path declined");
                }
                Err(PathError::Missing) => {
                    debug!(capability = %capability, path = %path, "path missing");
                    let resolution = self.cache.entry(capability).or_default();
                    resolution.missing.insert(path);
                    if resolution.last == Some(path) {
                        resolution.last = None;
                    }
                }
                Err(PathError::Rejected(reason)) => {
                    debug!(capability = %capability, path = %path, reason = %reason, "path rejected");
                }
            }
        }

        let resolution = self.cache.entry(capability).or_default();
        let all_missing = self
            .table
            .order(capability)
            .iter()
            .all(|p| resolution.missing.contains(p));
        if all_missing && !resolution.warned {
            resolution.warned = true;
            warn!(capability = %capability, "puppet has no access path for capability");
        }
        Err(MarionetteError::CapabilityUnavailable(capability))
    }

    /// Read a parameter
    pub fn get_parameter(&mut self, id: &str) -> MarionetteResult<f32> {
        self.resolve(Capability::GetParameter, |puppet, path| match path {
            AccessPath::CoreParameters => puppet.core_parameter(id).map(Some),
            AccessPath::ModelParameters => puppet.model_parameter(id).map(Some),
            _ => Err(PathError::Missing),
        })
        .map(|(_, value)| value)
    }

    /// True if some path can read this parameter
    pub fn is_gettable(&mut self, id: &str) -> bool {
        self.get_parameter(id).is_ok()
    }

    /// Overwrite a parameter
    pub fn set_parameter(&mut self, id: &str, value: f32) -> MarionetteResult<AccessPath> {
        self.resolve(Capability::SetParameter, |puppet, path| match path {
            AccessPath::CoreParameters => puppet.set_core_parameter(id, value).map(Some),
            AccessPath::ModelParameters => puppet.set_model_parameter(id, value).map(Some),
            _ => Err(PathError::Missing),
        })
        .map(|(path, _)| path)
    }

    /// Add `value * weight` on top of the parameter's current value
    pub fn add_parameter(&mut self, id: &str, value: f32, weight: f32) -> MarionetteResult<AccessPath> {
        self.resolve(Capability::AddParameter, |puppet, path| match path {
            AccessPath::CoreParameters => puppet.add_core_parameter(id, value, weight).map(Some),
            AccessPath::ModelParameters => puppet.add_model_parameter(id, value, weight).map(Some),
            AccessPath::ReadModifyWrite => read_modify_write(puppet, id, value * weight).map(Some),
            _ => Err(PathError::Missing),
        })
        .map(|(path, _)| path)
    }

    /// Start a motion. The caller validates group and index first.
    pub fn start_motion(
        &mut self,
        group: &str,
        index: usize,
        priority: MotionPriority,
    ) -> MarionetteResult<AccessPath> {
        self.resolve(Capability::StartMotion, |puppet, path| {
            let started = match path {
                AccessPath::MotionManager => puppet.manager_start_motion(group, index, priority),
                AccessPath::ModelMotion => puppet.model_motion(group, Some(index), priority),
                AccessPath::MotionQueue => puppet.queue_motion(group, index, priority),
                _ => Err(PathError::Missing),
            }?;
            Ok(started.then_some(()))
        })
        .map(|(path, _)| path)
    }

    /// Apply a native expression, by puppet-side index or by name
    pub fn set_expression(&mut self, index: usize, name: &str) -> MarionetteResult<AccessPath> {
        self.resolve(Capability::SetExpression, |puppet, path| {
            let applied = match path {
                AccessPath::ExpressionManager => puppet.manager_set_expression(index),
                AccessPath::ModelExpressionIndex => puppet.model_expression_by_index(index),
                AccessPath::ModelExpressionName => puppet.model_expression_by_name(name),
                _ => Err(PathError::Missing),
            }?;
            Ok(applied.then_some(()))
        })
        .map(|(path, _)| path)
    }

    /// Drop the puppet's native expression
    pub fn clear_expression(&mut self) -> MarionetteResult<AccessPath> {
        self.resolve(Capability::ClearExpression, |puppet, path| {
            let cleared = match path {
                AccessPath::ExpressionManager => puppet.manager_clear_expression(),
                AccessPath::ModelExpressionName => puppet.model_clear_expression(),
                _ => Err(PathError::Missing),
            }?;
            Ok(cleared.then_some(()))
        })
        .map(|(path, _)| path)
    }

    pub fn list_motion_groups(&self) -> Option<MotionGroupTable> {
        self.puppet.list_motion_groups()
    }

    pub fn list_expressions(&self) -> Option<ExpressionList> {
        self.puppet.list_expressions()
    }

    pub fn update(&mut self, delta: Duration) {
        self.puppet.update(delta);
    }

    pub fn logical_size(&self) -> Option<Size> {
        self.puppet.logical_size()
    }

    pub fn bounds(&self) -> Option<Rect> {
        self.puppet.bounds()
    }

    pub fn set_transform(&mut self, transform: Transform) {
        self.puppet.set_transform(transform);
    }

    pub fn resize_viewport(&mut self, viewport: Viewport) {
        self.puppet.resize_viewport(viewport);
    }

    pub fn dispose(&mut self) {
        self.puppet.dispose();
    }

    /// The raw puppet, bypassing resolution
    pub fn puppet(&self) -> &dyn Puppet {
        &*self.puppet
    }

    pub fn puppet_mut(&mut self) -> &mut dyn Puppet {
        &mut *self.puppet
    }
}

impl std::fmt::Debug for CapabilityAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut resolved: Vec<_> = self
            .cache
            .iter()
            .filter_map(|(cap, r)| r.last.map(|p| (*cap, p)))
            .collect();
        resolved.sort();
        f.debug_struct("CapabilityAdapter")
            .field("resolved", &resolved)
            .finish_non_exhaustive()
    }
}

/// Additive write for runtimes that only offer get and set
fn read_modify_write(puppet: &mut dyn Puppet, id: &str, delta: f32) -> PathResult<()> {
    let current = puppet
        .core_parameter(id)
        .or_else(|_| puppet.model_parameter(id))?;
    let next = current + delta;
    puppet
        .set_core_parameter(id, next)
        .or_else(|_| puppet.set_model_parameter(id, next))
}
