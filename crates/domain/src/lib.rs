//! Cart mutator for the cart service.
//!
//! This crate provides:
//! - Pure cart mutations that report the history they produce
//! - The product catalog capability
//! - `CartService`, which applies mutations with optimistic concurrency

pub mod catalog;
pub mod error;
pub mod mutation;
pub mod service;

pub use catalog::{InMemoryProductCatalog, ProductCatalog, ProductSnapshot};
pub use error::{CartError, CatalogError, Result};
pub use mutation::{MAX_QUANTITY, MutationOutcome, QuantityChange};
pub use service::{
    AddToCart, CartService, CartServiceConfig, ClearScope, ClearSummary,
    DEFAULT_MAX_CONFLICT_RETRIES,
};
