//! Marionette Core - Shared vocabulary for puppet direction
//!
//! This crate defines the types every other Marionette crate speaks:
//! - Moods and the keyword policies that map them onto asset names
//! - Expression and motion catalogs (what a loaded puppet offers)
//! - Parameter-set documents used by the manual expression fade
//! - Model manifests (`model3.json` file references)
//! - Asset sources, stage time and the error taxonomy

pub mod asset;
pub mod capability;
pub mod catalog;
pub mod error;
pub mod expression;
pub mod manifest;
pub mod mood;
pub mod policy;
pub mod time;

pub use asset::*;
pub use capability::*;
pub use catalog::*;
pub use error::*;
pub use expression::*;
pub use manifest::*;
pub use mood::*;
pub use policy::*;
pub use time::*;
