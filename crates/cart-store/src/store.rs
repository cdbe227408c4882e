use std::sync::Arc;

use async_trait::async_trait;
use common::{StudentId, TeacherId};

use crate::views::{self, StudentCartView, TeacherCartGroup, TeacherHistory};
use crate::{Cart, CartHistoryEntry, HistoryQuery, Result, Version};

/// Persistence for one cart document per (teacher, student) pair.
///
/// There are no cross-document transactions. Writers use [`CartStore::replace`],
/// which is a compare-and-swap on [`Cart::version`], and reload on conflict.
#[async_trait]
pub trait CartStore: Send + Sync {
    /// Returns the cart for the pair, creating an empty one if none exists.
    ///
    /// Creation is atomic: concurrent callers for the same pair all observe
    /// the same cart.
    async fn get_or_create(&self, teacher_id: &TeacherId, student_id: &StudentId) -> Result<Cart>;

    /// Returns the cart for the pair without creating it.
    async fn find(&self, teacher_id: &TeacherId, student_id: &StudentId) -> Result<Option<Cart>>;

    /// Overwrites items, total and `updated_at` of the cart with `cart.id`.
    ///
    /// Fails with `ConcurrencyConflict` if the stored version is not
    /// `cart.version`. Returns the new version on success.
    async fn replace(&self, cart: &Cart) -> Result<Version>;

    /// Returns every cart owned by a teacher.
    async fn carts_for_teacher(&self, teacher_id: &TeacherId) -> Result<Vec<Cart>>;

    /// Returns every cart in the store.
    async fn all_carts(&self) -> Result<Vec<Cart>>;
}

#[async_trait]
impl<T: CartStore + ?Sized> CartStore for Arc<T> {
    async fn get_or_create(&self, teacher_id: &TeacherId, student_id: &StudentId) -> Result<Cart> {
        (**self).get_or_create(teacher_id, student_id).await
    }

    async fn find(&self, teacher_id: &TeacherId, student_id: &StudentId) -> Result<Option<Cart>> {
        (**self).find(teacher_id, student_id).await
    }

    async fn replace(&self, cart: &Cart) -> Result<Version> {
        (**self).replace(cart).await
    }

    async fn carts_for_teacher(&self, teacher_id: &TeacherId) -> Result<Vec<Cart>> {
        (**self).carts_for_teacher(teacher_id).await
    }

    async fn all_carts(&self) -> Result<Vec<Cart>> {
        (**self).all_carts().await
    }
}

/// Extension trait providing read views over a cart store.
#[async_trait]
pub trait CartStoreExt: CartStore {
    /// Lists a teacher's carts, one view per student, newest first.
    async fn list_by_teacher(&self, teacher_id: &TeacherId) -> Result<Vec<StudentCartView>> {
        let carts = self.carts_for_teacher(teacher_id).await?;
        Ok(views::student_cart_views(carts))
    }

    /// Lists every cart grouped by owning teacher.
    async fn list_all_grouped_by_teacher(&self) -> Result<Vec<TeacherCartGroup>> {
        let carts = self.all_carts().await?;
        Ok(views::group_by_teacher(carts))
    }
}

impl<T: CartStore + ?Sized> CartStoreExt for T {}

/// Append-only ledger of cart events.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Appends entries atomically. Never overwrites or deletes.
    ///
    /// An empty vector is a no-op.
    async fn append(&self, entries: Vec<CartHistoryEntry>) -> Result<()>;

    /// Retrieves entries matching a query, oldest first.
    async fn query(&self, query: HistoryQuery) -> Result<Vec<CartHistoryEntry>>;
}

#[async_trait]
impl<T: HistoryStore + ?Sized> HistoryStore for Arc<T> {
    async fn append(&self, entries: Vec<CartHistoryEntry>) -> Result<()> {
        (**self).append(entries).await
    }

    async fn query(&self, query: HistoryQuery) -> Result<Vec<CartHistoryEntry>> {
        (**self).query(query).await
    }
}

/// Extension trait providing convenience methods for history stores.
#[async_trait]
pub trait HistoryStoreExt: HistoryStore {
    /// Appends a single entry.
    async fn append_entry(&self, entry: CartHistoryEntry) -> Result<()> {
        self.append(vec![entry]).await
    }

    /// Returns a teacher's history grouped by student, in occurrence order.
    async fn query_by_teacher(&self, teacher_id: &TeacherId) -> Result<TeacherHistory> {
        let entries = self
            .query(HistoryQuery::for_teacher(teacher_id.clone()))
            .await?;
        Ok(views::group_history(teacher_id.clone(), entries))
    }
}

impl<T: HistoryStore + ?Sized> HistoryStoreExt for T {}
