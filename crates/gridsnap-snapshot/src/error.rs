//! Snapshot error types.

use thiserror::Error;

/// Errors that can occur when querying a snapshot.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SnapshotError {
    #[error("nodeinfo not found for node name {0:?}")]
    NotFound(String),
}

pub type SnapshotResult<T> = Result<T, SnapshotError>;
