//! Marionette Stage - Render-loop integration
//!
//! The stage owns the wiring between one live puppet and the components
//! that animate it. A single external clock drives everything:
//! - `Stage`: frame ordering, resize handling, lifecycle hooks
//! - `AnchorTracker`: low-frequency speech-bubble anchor updates
//! - `layout`: safe-area fitting and device pixel ratio clamping
//! - `driver`: a tokio interval for hosts without a display callback
//! - `telemetry`: tracing subscriber setup

pub mod anchor;
pub mod config;
pub mod driver;
pub mod layout;
pub mod stage;
pub mod telemetry;

pub use anchor::*;
pub use config::*;
pub use driver::*;
pub use layout::*;
pub use stage::*;
pub use telemetry::*;
