//! Expression and motion catalogs
//!
//! A catalog describes what a loaded puppet offers. It is read once when
//! the puppet's assets finish loading and is immutable afterwards.

use serde::{Deserialize, Serialize};

use crate::{MarionetteError, MarionetteResult};

/// Motion priority, as understood by the puppet's motion manager
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MotionPriority {
    /// Background motion, replaced by anything else
    Idle = 1,
    /// Regular motion
    Normal = 2,
    /// Interrupts whatever is playing
    #[default]
    Force = 3,
}

impl MotionPriority {
    /// Numeric level passed through to the puppet
    pub fn level(self) -> u8 {
        self as u8
    }
}

/// An expression the puppet offers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpressionDef {
    /// Unique id (the asset's `Name`)
    pub name: String,
    /// Location of the parameter-set document
    pub source_ref: String,
    /// Human readable label, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl ExpressionDef {
    pub fn new(name: impl Into<String>, source_ref: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source_ref: source_ref.into(),
            display_name: None,
        }
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }
}

/// Ordered list of expressions. Position is the puppet-side index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExpressionList(Vec<ExpressionDef>);

impl ExpressionList {
    pub fn new(defs: Vec<ExpressionDef>) -> Self {
        Self(defs)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ExpressionDef> {
        self.0.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|e| e.name.as_str())
    }

    /// Find an expression and its puppet-side index
    pub fn find(&self, name: &str) -> Option<(usize, &ExpressionDef)> {
        self.0.iter().enumerate().find(|(_, e)| e.name == name)
    }

    /// Find an expression or fail with `UnknownExpressionId`
    pub fn require(&self, name: &str) -> MarionetteResult<(usize, &ExpressionDef)> {
        self.find(name)
            .ok_or_else(|| MarionetteError::UnknownExpressionId(name.to_string()))
    }
}

impl FromIterator<ExpressionDef> for ExpressionList {
    fn from_iter<I: IntoIterator<Item = ExpressionDef>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// A motion the puppet offers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MotionDef {
    pub group: String,
    /// Position within the group
    pub index: usize,
    pub source_ref: String,
}

/// A named, ordered group of motions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MotionGroup {
    pub name: String,
    pub motions: Vec<MotionDef>,
}

/// Motion groups in declaration order.
///
/// Order matters twice: group order decides which group a keyword hint
/// picks first, and motion order inside a group defines the index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MotionGroupTable {
    groups: Vec<MotionGroup>,
}

impl MotionGroupTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a group built from motion file references.
    /// A group that already exists is replaced in place.
    pub fn insert_group<I, S>(&mut self, name: impl Into<String>, refs: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let name = name.into();
        let motions = refs
            .into_iter()
            .enumerate()
            .map(|(index, r)| MotionDef {
                group: name.clone(),
                index,
                source_ref: r.into(),
            })
            .collect();
        let group = MotionGroup { name, motions };

        match self.groups.iter_mut().find(|g| g.name == group.name) {
            Some(existing) => *existing = group,
            None => self.groups.push(group),
        }
    }

    /// Builder form of [`insert_group`](Self::insert_group)
    pub fn with_group<I, S>(mut self, name: impl Into<String>, refs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.insert_group(name, refs);
        self
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn groups(&self) -> impl Iterator<Item = &MotionGroup> {
        self.groups.iter()
    }

    pub fn group_names(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|g| g.name.as_str())
    }

    pub fn group(&self, name: &str) -> Option<&[MotionDef]> {
        self.groups
            .iter()
            .find(|g| g.name == name)
            .map(|g| g.motions.as_slice())
    }

    pub fn first_group(&self) -> Option<&str> {
        self.groups.first().map(|g| g.name.as_str())
    }

    /// Check a (group, index) request against the table.
    /// Runs before any puppet call so invalid requests never reach the puppet.
    pub fn validate(&self, group: &str, index: usize) -> MarionetteResult<&MotionDef> {
        let motions = self
            .group(group)
            .ok_or_else(|| MarionetteError::UnknownMotionGroup(group.to_string()))?;

        motions
            .get(index)
            .ok_or_else(|| MarionetteError::MotionIndexOutOfRange {
                group: group.to_string(),
                index,
                len: motions.len(),
            })
    }
}
