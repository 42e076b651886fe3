//! Puppet - the raw capability surface of a loaded rigged puppet
//!
//! Every method corresponds to one concrete access path of the underlying
//! runtime. Implementations override the paths their runtime actually has
//! and leave the rest at the default, which reports [`PathError::Missing`].
//! Nothing here is expected to panic; a path that throws reports
//! [`PathError::Rejected`].

use std::fmt;
use std::time::Duration;

use marionette_core::{ExpressionList, MotionGroupTable, MotionPriority};

use crate::{Rect, Size, Transform, Viewport};

/// Failure of a single access path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    /// The runtime does not have this path at all
    Missing,
    /// The path exists but the call failed
    Rejected(String),
}

impl fmt::Display for PathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathError::Missing => f.write_str("missing"),
            PathError::Rejected(reason) => write!(f, "rejected: {reason}"),
        }
    }
}

/// Result of a single access-path call
pub type PathResult<T> = Result<T, PathError>;

/// Raw puppet surface.
///
/// Motion and expression paths return `Ok(false)` when the runtime accepted
/// the call but declined to act (e.g. a busy motion slot); resolution treats
/// that the same as a failure and moves on to the next path.
pub trait Puppet: Send {
    // ---- Parameters: core parameter table ----

    fn core_parameter(&self, _id: &str) -> PathResult<f32> {
        Err(PathError::Missing)
    }

    fn set_core_parameter(&mut self, _id: &str, _value: f32) -> PathResult<()> {
        Err(PathError::Missing)
    }

    fn add_core_parameter(&mut self, _id: &str, _value: f32, _weight: f32) -> PathResult<()> {
        Err(PathError::Missing)
    }

    // ---- Parameters: model-level convenience ----

    fn model_parameter(&self, _id: &str) -> PathResult<f32> {
        Err(PathError::Missing)
    }

    fn set_model_parameter(&mut self, _id: &str, _value: f32) -> PathResult<()> {
        Err(PathError::Missing)
    }

    fn add_model_parameter(&mut self, _id: &str, _value: f32, _weight: f32) -> PathResult<()> {
        Err(PathError::Missing)
    }

    // ---- Motions ----

    /// Motion manager: start by group, index and priority
    fn manager_start_motion(
        &mut self,
        _group: &str,
        _index: usize,
        _priority: MotionPriority,
    ) -> PathResult<bool> {
        Err(PathError::Missing)
    }

    /// Model-level convenience: motion by group and optional index
    fn model_motion(
        &mut self,
        _group: &str,
        _index: Option<usize>,
        _priority: MotionPriority,
    ) -> PathResult<bool> {
        Err(PathError::Missing)
    }

    /// Low-level motion queue
    fn queue_motion(
        &mut self,
        _group: &str,
        _index: usize,
        _priority: MotionPriority,
    ) -> PathResult<bool> {
        Err(PathError::Missing)
    }

    // ---- Expressions ----

    fn manager_set_expression(&mut self, _index: usize) -> PathResult<bool> {
        Err(PathError::Missing)
    }

    fn model_expression_by_index(&mut self, _index: usize) -> PathResult<bool> {
        Err(PathError::Missing)
    }

    fn model_expression_by_name(&mut self, _name: &str) -> PathResult<bool> {
        Err(PathError::Missing)
    }

    fn manager_clear_expression(&mut self) -> PathResult<bool> {
        Err(PathError::Missing)
    }

    fn model_clear_expression(&mut self) -> PathResult<bool> {
        Err(PathError::Missing)
    }

    // ---- Catalog ----

    /// Motion groups the runtime reports, if it exposes its settings
    fn list_motion_groups(&self) -> Option<MotionGroupTable> {
        None
    }

    /// Expressions the runtime reports, if it exposes its settings
    fn list_expressions(&self) -> Option<ExpressionList> {
        None
    }

    // ---- Scene ----

    /// Advance the puppet's own animation (motions, physics, native expressions)
    fn update(&mut self, _delta: Duration) {}

    /// Untransformed size of the puppet's content
    fn logical_size(&self) -> Option<Size> {
        None
    }

    /// Current screen-space bounds
    fn bounds(&self) -> Option<Rect> {
        None
    }

    fn set_transform(&mut self, _transform: Transform) {}

    fn resize_viewport(&mut self, _viewport: Viewport) {}

    /// Release runtime resources; the puppet is not used afterwards
    fn dispose(&mut self) {}
}
