use thiserror::Error;

use crate::Version;

/// Errors that can occur when interacting with an event log backend.
#[derive(Debug, Error)]
pub enum EventStoreError {
    /// Another writer already occupies a version slot this append tried to
    /// claim. The whole batch was rejected; nothing was committed.
    #[error("concurrency conflict for aggregate {aggregate_id}: version {version} already exists")]
    ConcurrencyConflict {
        aggregate_id: String,
        version: Version,
    },

    /// The batch handed to `append` was malformed (empty, mixed identities,
    /// or non-contiguous versions).
    #[error("invalid append batch: {0}")]
    InvalidBatch(String),

    /// A database error occurred.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A payload serialization/deserialization error occurred.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl EventStoreError {
    /// Returns true if this error is a version-slot conflict that a caller
    /// may resolve by reloading and retrying.
    pub fn is_concurrency_conflict(&self) -> bool {
        matches!(self, EventStoreError::ConcurrencyConflict { .. })
    }
}

/// Result type for event store operations.
pub type Result<T> = std::result::Result<T, EventStoreError>;
