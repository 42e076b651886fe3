//! Marionette Lip-Sync - Mouth movement from a live audio signal
//!
//! Per frame, while a source is attached:
//! 1. RMS of the latest time-domain window
//! 2. Gain and noise gate, renormalized to [0, 1]
//! 3. A small breathing floor so the mouth never freezes
//! 4. Asymmetric attack/release smoothing
//! 5. Override or additive write into the mouth-open parameter
//!
//! Sources are mutually exclusive: attaching one disconnects the previous.

pub mod analysis;
pub mod config;
pub mod engine;
pub mod graph;
pub mod source;

pub use analysis::*;
pub use config::*;
pub use engine::*;
pub use graph::*;
pub use source::*;
