//! Access paths and the capability-resolution table
//!
//! The table is the reviewable contract for fallback order: for each
//! capability it lists the access paths to try, most preferred first.

use std::collections::HashMap;
use std::fmt;

use marionette_core::Capability;

/// A concrete way of reaching a capability on the raw puppet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AccessPath {
    /// The core parameter table
    CoreParameters,
    /// Model-level parameter convenience calls
    ModelParameters,
    /// Get followed by set, for runtimes without an additive write
    ReadModifyWrite,
    /// Motion manager start-by-group-index-priority
    MotionManager,
    /// Model-level motion convenience call
    ModelMotion,
    /// Low-level motion queue
    MotionQueue,
    /// Expression manager (by index, and its own clear)
    ExpressionManager,
    /// Model-level expression by index
    ModelExpressionIndex,
    /// Model-level expression by name (and model-level clear)
    ModelExpressionName,
}

impl AccessPath {
    /// Capabilities this path can serve
    pub fn serves(self, capability: Capability) -> bool {
        use AccessPath::*;
        use Capability::*;
        match capability {
            GetParameter | SetParameter => matches!(self, CoreParameters | ModelParameters),
            AddParameter => matches!(self, CoreParameters | ModelParameters | ReadModifyWrite),
            StartMotion => matches!(self, MotionManager | ModelMotion | MotionQueue),
            SetExpression => matches!(
                self,
                ExpressionManager | ModelExpressionIndex | ModelExpressionName
            ),
            ClearExpression => matches!(self, ExpressionManager | ModelExpressionName),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AccessPath::CoreParameters => "core_parameters",
            AccessPath::ModelParameters => "model_parameters",
            AccessPath::ReadModifyWrite => "read_modify_write",
            AccessPath::MotionManager => "motion_manager",
            AccessPath::ModelMotion => "model_motion",
            AccessPath::MotionQueue => "motion_queue",
            AccessPath::ExpressionManager => "expression_manager",
            AccessPath::ModelExpressionIndex => "model_expression_index",
            AccessPath::ModelExpressionName => "model_expression_name",
        }
    }
}

impl fmt::Display for AccessPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Priority order of access paths per capability
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionTable {
    orders: HashMap<Capability, Vec<AccessPath>>,
}

impl Default for ResolutionTable {
    fn default() -> Self {
        use AccessPath::*;
        let mut orders = HashMap::new();
        orders.insert(Capability::GetParameter, vec![CoreParameters, ModelParameters]);
        orders.insert(Capability::SetParameter, vec![CoreParameters, ModelParameters]);
        orders.insert(
            Capability::AddParameter,
            vec![CoreParameters, ModelParameters, ReadModifyWrite],
        );
        orders.insert(
            Capability::StartMotion,
            vec![MotionManager, ModelMotion, MotionQueue],
        );
        orders.insert(
            Capability::SetExpression,
            vec![ExpressionManager, ModelExpressionIndex, ModelExpressionName],
        );
        orders.insert(
            Capability::ClearExpression,
            vec![ExpressionManager, ModelExpressionName],
        );
        Self { orders }
    }
}

impl ResolutionTable {
    /// Access paths for a capability, most preferred first
    pub fn order(&self, capability: Capability) -> &[AccessPath] {
        self.orders
            .get(&capability)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Replace the order for one capability.
    /// Paths that cannot serve the capability are dropped, duplicates keep
    /// their first position.
    pub fn with_order(mut self, capability: Capability, order: &[AccessPath]) -> Self {
        let mut filtered: Vec<AccessPath> = Vec::with_capacity(order.len());
        for path in order {
            if path.serves(capability) && !filtered.contains(path) {
                filtered.push(*path);
            }
        }
        self.orders.insert(capability, filtered);
        self
    }
}
