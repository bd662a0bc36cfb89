//! Correlation Vector Test Harness
//!
//! This crate provides:
//! - Test logging setup
//! - Concurrent increment stress runs
//! - Spin ordering sampling (manual or system clock)

pub mod logging;
pub mod spin_sampler;
pub mod stress;

pub use logging::*;
pub use spin_sampler::*;
pub use stress::*;
