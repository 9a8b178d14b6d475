use thiserror::Error;

use crate::{TripId, Version};

/// Errors that can occur when interacting with the event store.
#[derive(Debug, Error)]
pub enum EventStoreError {
    /// A concurrency conflict occurred when appending events.
    /// The expected version did not match the actual version.
    #[error("concurrency conflict for trip {trip_id}: expected version {expected}, found {actual}")]
    ConcurrencyConflict {
        trip_id: TripId,
        expected: Version,
        actual: Version,
    },

    /// The events handed to `append` were malformed (empty batch, mixed
    /// trip ids, non-sequential versions).
    #[error("invalid append: {0}")]
    InvalidAppend(String),

    /// A database error occurred.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A serialization/deserialization error occurred.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for event store operations.
pub type Result<T> = std::result::Result<T, EventStoreError>;
