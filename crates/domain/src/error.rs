//! Domain error types.

use cart_store::StoreError;
use common::{IdError, ObjectId, StudentId, TeacherId};
use thiserror::Error;

/// Errors returned by a product catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The catalog has no product with this id.
    #[error("Product not found: {0}")]
    NotFound(ObjectId),

    /// The catalog could not be reached or answered with an unexpected shape.
    #[error("Catalog transport error: {0}")]
    Transport(String),
}

/// Errors that can occur during cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// Input was missing or malformed. Raised before any I/O.
    #[error("Validation error: {0}")]
    Validation(String),

    /// An identifier was not in the expected format.
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(#[from] IdError),

    /// The mutation targets a product that is not in the cart.
    #[error("Item not found in cart: {product_id}")]
    ItemNotFound { product_id: ObjectId },

    /// The catalog has no such product.
    #[error("Product not found: {0}")]
    ProductNotFound(ObjectId),

    /// Persistence failed.
    #[error("Store error during {operation}: {source}")]
    Store {
        operation: &'static str,
        teacher_id: Option<TeacherId>,
        student_id: Option<StudentId>,
        #[source]
        source: StoreError,
    },

    /// A remote capability could not be reached.
    #[error("Transport error: {0}")]
    Transport(String),
}

impl CartError {
    /// Returns true if the failure was an exhausted optimistic-concurrency retry.
    pub fn is_conflict(&self) -> bool {
        matches!(self, CartError::Store { source, .. } if source.is_conflict())
    }

    /// Returns true if the error is a missing item or product.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            CartError::ItemNotFound { .. } | CartError::ProductNotFound(_)
        )
    }
}

impl From<CatalogError> for CartError {
    fn from(e: CatalogError) -> Self {
        match e {
            CatalogError::NotFound(id) => CartError::ProductNotFound(id),
            CatalogError::Transport(msg) => CartError::Transport(msg),
        }
    }
}

/// Result type for cart operations.
pub type Result<T> = std::result::Result<T, CartError>;
