//! Correlation Vectors
//!
//! A correlation vector (CV) is a `.`-delimited identifier that is extended
//! as a request fans out across services:
//!
//! ```text
//! tul4NUsfs9Cl7mOf.0        received (extend)
//! tul4NUsfs9Cl7mOf.1        first outbound call (increment)
//! tul4NUsfs9Cl7mOf.1.0      extended by the callee
//! ```
//!
//! Version is inferred from the string, so V1 and V2 peers interoperate.
//! A vector that can no longer grow is terminated with `!` and never
//! changes again.

pub mod counter;
pub mod vector;

pub use counter::*;
pub use vector::*;

pub use corvec_core::codec;
pub use corvec_core::{
    set_validate_during_creation, validate_during_creation, CvError, CvResult, Version,
};
pub use corvec_time::{
    ManualClock, SpinCounterInterval, SpinCounterPeriodicity, SpinEntropy, SpinParameters,
    SpinValue, SystemClock, TickSource, Ticks,
};

/// Header carrying the correlation vector between services
pub const HEADER_NAME: &str = "MS-CV";
