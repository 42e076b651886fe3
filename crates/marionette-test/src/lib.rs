//! Marionette Test Harness - Deterministic stage simulation
//!
//! This crate provides:
//! - Stock fixtures (motion table, expressions, parameter-set documents)
//! - A stage simulator with seeded frame jitter and scripted audio
//!
//! The scenario suite under `tests/` runs the end-to-end behavior of the
//! director, the lip-sync engine and the stage against these.

pub mod fixtures;
pub mod simulator;

pub use fixtures::*;
pub use simulator::*;
