//! Error types for commitment handling.

use thiserror::Error;

/// Errors that can occur when decoding commitments and secrets.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommitmentError {
    #[error("Invalid hex encoding: {0}")]
    InvalidHex(String),

    #[error("Invalid length: expected {expected} bytes, got {got}")]
    InvalidLength { expected: usize, got: usize },
}
