//! Correlation Vector Core - Format engine primitives
//!
//! This crate defines the building blocks shared by every correlation vector:
//! - Textual codec (format, decode, validate, oversize checks)
//! - Version policy (V1/V2 limits and version inference)
//! - Vector base generation and UUID round-trips
//! - Process-wide validation configuration
//! - Error types

pub mod base;
pub mod codec;
pub mod config;
pub mod error;
pub mod version;

pub use base::*;
pub use codec::*;
pub use config::*;
pub use error::*;
pub use version::*;
