//! Correlation Vector Time - Tick source and spin values
//!
//! This crate implements the time-and-entropy half of the spin operator:
//! - Ticks: 100ns units since the Unix epoch
//! - Tick sources (system clock, manually driven clock)
//! - Spin parameters and spin value computation

pub mod clock;
pub mod spin;

pub use clock::*;
pub use spin::*;
