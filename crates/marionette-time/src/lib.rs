//! Marionette Time - the single render clock
//!
//! Everything animated in Marionette advances from one external clock:
//! the host's per-frame callback. This crate turns host timestamps into
//! well-behaved frame deltas and provides the small timing helpers the
//! render loop needs:
//! - `FrameClock`: monotonic stage time with clamped deltas
//! - `Cadence`: fire at most once per period (anchor updates)
//! - `FrameDebounce`: coalesce bursts into one action per frame (resize)

pub mod cadence;
pub mod clock;

pub use cadence::*;
pub use clock::*;
