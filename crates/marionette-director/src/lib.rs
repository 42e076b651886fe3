//! Marionette Director - Expression and motion direction
//!
//! The director owns mood and the speaking flag and turns high-level
//! intents into puppet operations:
//! - `set_mood`: mood to best-matching expression
//! - `set_expression`: native expression, or a manual fade driven by the
//!   expression's parameter-set document
//! - `play_motion`: validated against the motion table before any puppet call
//! - `speak_start` / `speak_stop`: the round-robin talk loop, cancelled by
//!   generation token
//!
//! All time-dependent work happens in `Director::tick`, once per frame.

pub mod catalog;
pub mod config;
pub mod director;
pub mod fade;
pub mod library;
pub mod talk;

pub use catalog::*;
pub use config::*;
pub use director::*;
pub use fade::*;
pub use library::*;
pub use talk::*;
