//! Cart and cart-history persistence.
//!
//! Each (teacher, student) pair owns exactly one cart document. Writers
//! replace the whole document with a compare-and-swap on its version.
//! History is a separate append-only ledger.

pub mod document;
pub mod error;
pub mod memory;
pub mod postgres;
pub mod query;
pub mod store;
pub mod views;

pub use common::{ObjectId, StudentId, TeacherId};
pub use document::{Cart, CartHistoryEntry, CartItem, HistoryEventType, Version, round2};
pub use error::{Result, StoreError};
pub use memory::{InMemoryCartStore, InMemoryHistoryStore};
pub use postgres::{PostgresCartStore, PostgresHistoryStore, run_migrations};
pub use query::HistoryQuery;
pub use store::{CartStore, CartStoreExt, HistoryStore, HistoryStoreExt};
pub use views::{
    HistoryEvent, StudentCartView, StudentHistory, TeacherCartGroup, TeacherHistory,
};
