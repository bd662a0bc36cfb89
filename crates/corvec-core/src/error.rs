//! Error types for correlation vector operations

use thiserror::Error;

/// Correlation vector errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CvError {
    /// Malformed or oversized input rejected by strict validation
    #[error("{0}")]
    InvalidArgument(String),

    /// Action the vector's version or current state cannot perform
    #[error("{0}")]
    InvalidOperation(String),
}

impl CvError {
    /// Message carried by the error, without the variant name
    pub fn message(&self) -> &str {
        match self {
            CvError::InvalidArgument(msg) | CvError::InvalidOperation(msg) => msg,
        }
    }
}

/// Result type for correlation vector operations
pub type CvResult<T> = Result<T, CvError>;
