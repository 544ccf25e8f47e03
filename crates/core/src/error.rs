//! Storage error model.

use thiserror::Error;

/// Result type returned by store capabilities.
pub type StoreResult<T> = Result<T, StoreError>;

/// Error surfaced by a store implementation (relational or in-memory).
///
/// Adapters map their client library errors into this enum so that domain
/// crates never see driver types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The addressed row does not exist.
    #[error("not found")]
    NotFound,

    /// A uniqueness constraint was violated (e.g. duplicate session id).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Connection failure, aborted transaction, or any other backend fault.
    #[error("store failure: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }
}
