use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use common::{ObjectId, StudentId, TeacherId};
use tokio::sync::RwLock;

use crate::{
    Cart, CartHistoryEntry, HistoryQuery, Result, StoreError, Version,
    store::{CartStore, HistoryStore},
};

#[derive(Default)]
struct CartState {
    carts: HashMap<ObjectId, Cart>,
    by_owner: HashMap<(TeacherId, StudentId), ObjectId>,
}

/// In-memory cart store.
///
/// Provides the same compare-and-swap semantics as the PostgreSQL
/// implementation. Cloning yields a handle onto the same data.
#[derive(Clone, Default)]
pub struct InMemoryCartStore {
    state: Arc<RwLock<CartState>>,
}

impl InMemoryCartStore {
    /// Creates a new empty in-memory cart store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of carts stored.
    pub async fn cart_count(&self) -> usize {
        self.state.read().await.carts.len()
    }
}

#[async_trait]
impl CartStore for InMemoryCartStore {
    async fn get_or_create(&self, teacher_id: &TeacherId, student_id: &StudentId) -> Result<Cart> {
        let key = (teacher_id.clone(), student_id.clone());

        let existing = {
            let state = self.state.read().await;
            state
                .by_owner
                .get(&key)
                .and_then(|id| state.carts.get(id))
                .cloned()
        };
        if let Some(cart) = existing {
            return Ok(cart);
        }

        // Re-check under the write lock; another task may have created it.
        let mut state = self.state.write().await;
        if let Some(id) = state.by_owner.get(&key)
            && let Some(cart) = state.carts.get(id)
        {
            return Ok(cart.clone());
        }

        let cart = Cart::new(teacher_id.clone(), student_id.clone());
        state.by_owner.insert(key, cart.id);
        state.carts.insert(cart.id, cart.clone());
        tracing::debug!(cart_id = %cart.id, %teacher_id, %student_id, "cart created");
        Ok(cart)
    }

    async fn find(&self, teacher_id: &TeacherId, student_id: &StudentId) -> Result<Option<Cart>> {
        let state = self.state.read().await;
        let key = (teacher_id.clone(), student_id.clone());
        Ok(state
            .by_owner
            .get(&key)
            .and_then(|id| state.carts.get(id))
            .cloned())
    }

    async fn replace(&self, cart: &Cart) -> Result<Version> {
        let mut state = self.state.write().await;
        let stored = state
            .carts
            .get_mut(&cart.id)
            .ok_or(StoreError::CartNotFound(cart.id))?;

        if stored.version != cart.version {
            return Err(StoreError::ConcurrencyConflict {
                cart_id: cart.id,
                expected: cart.version,
                actual: stored.version,
            });
        }

        stored.items = cart.items.clone();
        stored.total_price = cart.total_price;
        stored.updated_at = Utc::now();
        stored.version = cart.version.next();
        Ok(stored.version)
    }

    async fn carts_for_teacher(&self, teacher_id: &TeacherId) -> Result<Vec<Cart>> {
        let state = self.state.read().await;
        Ok(state
            .carts
            .values()
            .filter(|c| &c.teacher_id == teacher_id)
            .cloned()
            .collect())
    }

    async fn all_carts(&self) -> Result<Vec<Cart>> {
        let state = self.state.read().await;
        Ok(state.carts.values().cloned().collect())
    }
}

/// In-memory history ledger.
#[derive(Clone, Default)]
pub struct InMemoryHistoryStore {
    entries: Arc<RwLock<Vec<CartHistoryEntry>>>,
}

impl InMemoryHistoryStore {
    /// Creates a new empty in-memory history store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of entries stored.
    pub async fn entry_count(&self) -> usize {
        self.entries.read().await.len()
    }
}

#[async_trait]
impl HistoryStore for InMemoryHistoryStore {
    async fn append(&self, entries: Vec<CartHistoryEntry>) -> Result<()> {
        if entries.is_empty() {
            return Ok(());
        }
        self.entries.write().await.extend(entries);
        Ok(())
    }

    async fn query(&self, query: HistoryQuery) -> Result<Vec<CartHistoryEntry>> {
        let store = self.entries.read().await;
        let mut entries: Vec<_> = store.iter().filter(|e| query.matches(e)).cloned().collect();

        // Stable sort: ties keep insertion order
        entries.sort_by_key(|e| e.occurred_at);

        let offset = query.offset.unwrap_or(0);
        let limit = query.limit.unwrap_or(usize::MAX);
        Ok(entries.into_iter().skip(offset).take(limit).collect())
    }
}
