use common::ObjectId;
use thiserror::Error;

use crate::Version;

/// Errors that can occur when interacting with the cart or history store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The cart was written by someone else since it was read.
    #[error(
        "Concurrency conflict for cart {cart_id}: expected version {expected}, found {actual}"
    )]
    ConcurrencyConflict {
        cart_id: ObjectId,
        expected: Version,
        actual: Version,
    },

    /// No cart document exists with this id.
    #[error("Cart not found: {0}")]
    CartNotFound(ObjectId),

    /// A stored value could not be mapped back into a document.
    #[error("Corrupt document: {0}")]
    Corrupt(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    /// Returns true if the write lost an optimistic concurrency race.
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::ConcurrencyConflict { .. })
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
