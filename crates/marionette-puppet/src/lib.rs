//! Marionette Puppet - Capability resolution against an unreliable puppet
//!
//! Rigged-puppet runtimes disagree on where their operations live: one
//! exposes a motion manager, another a model-level convenience call, a
//! third only a low-level queue. This crate turns that uncertainty into a
//! declared contract:
//! - `Puppet`: the raw surface, one method per access path, each allowed
//!   to be missing
//! - `ResolutionTable`: the priority order of access paths per capability
//! - `CapabilityAdapter`: walks the table once, caches what works and
//!   remembers what is missing
//! - `PuppetHandle`: the shared, lockable adapter handed to the director,
//!   the lip-sync engine and the stage

pub mod adapter;
pub mod capability;
pub mod geometry;
pub mod handle;
pub mod puppet;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use adapter::*;
pub use capability::*;
pub use geometry::*;
pub use handle::*;
pub use puppet::*;
