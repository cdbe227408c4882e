//! Shared identifier types for the cart service.

mod types;

pub use types::{IdError, ObjectId, StudentId, TeacherId};
