//! Error types for gridsnap domain types.

use thiserror::Error;

/// Result type alias for domain type operations.
pub type StateResult<T> = Result<T, StateError>;

/// Errors that can occur while building or parsing domain types.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StateError {
    #[error("invalid label selector {selector:?}: {reason}")]
    InvalidSelector { selector: String, reason: String },
}
