//! Capability kinds - the operations Marionette needs from a puppet

use std::fmt;

/// A puppet operation the core needs.
///
/// Each capability is resolved independently against the live puppet and
/// cached per puppet instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Capability {
    /// Read a named parameter
    GetParameter,
    /// Overwrite a named parameter
    SetParameter,
    /// Add to a named parameter on top of the current animation
    AddParameter,
    /// Start a motion by group and index
    StartMotion,
    /// Apply an expression by index or name
    SetExpression,
    /// Drop the puppet's native expression
    ClearExpression,
}

impl Capability {
    /// All capability kinds, in resolution-table order
    pub const ALL: [Capability; 6] = [
        Capability::GetParameter,
        Capability::SetParameter,
        Capability::AddParameter,
        Capability::StartMotion,
        Capability::SetExpression,
        Capability::ClearExpression,
    ];

    /// Stable snake_case name for logs
    pub fn as_str(self) -> &'static str {
        match self {
            Capability::GetParameter => "get_parameter",
            Capability::SetParameter => "set_parameter",
            Capability::AddParameter => "add_parameter",
            Capability::StartMotion => "start_motion",
            Capability::SetExpression => "set_expression",
            Capability::ClearExpression => "clear_expression",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
