//! Cart service: turns one user intent into a consistent cart and history update.

use cart_store::{
    Cart, CartItem, CartStore, CartStoreExt, HistoryStore, HistoryStoreExt, StoreError,
    StudentCartView, TeacherCartGroup, TeacherHistory,
};
use common::{ObjectId, StudentId, TeacherId};
use serde::{Deserialize, Serialize};

use crate::catalog::ProductCatalog;
use crate::error::{CartError, Result};
use crate::mutation::{self, MutationOutcome, QuantityChange};

/// Default number of extra attempts after a concurrency conflict.
pub const DEFAULT_MAX_CONFLICT_RETRIES: u32 = 5;

/// Tuning for [`CartService`].
#[derive(Debug, Clone, Copy)]
pub struct CartServiceConfig {
    pub max_conflict_retries: u32,
}

impl Default for CartServiceConfig {
    fn default() -> Self {
        Self {
            max_conflict_retries: DEFAULT_MAX_CONFLICT_RETRIES,
        }
    }
}

/// Request to put a catalog product into a student's cart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddToCart {
    pub teacher_id: TeacherId,
    pub student_id: StudentId,
    pub product_id: String,
    pub quantity: u32,
}

/// Which carts a clear applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClearScope {
    /// Every cart the teacher owns.
    Teacher(TeacherId),
    /// One student's cart.
    Student(TeacherId, StudentId),
}

impl ClearScope {
    pub fn teacher_id(&self) -> &TeacherId {
        match self {
            ClearScope::Teacher(t) | ClearScope::Student(t, _) => t,
        }
    }
}

/// Result of a clear.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClearSummary {
    pub carts_cleared: usize,
    pub items_archived: usize,
}

enum Load {
    OrCreate,
    Existing,
}

/// Cart mutator.
///
/// Every mutation loads the cart, applies a pure edit, and writes it back
/// with a compare-and-swap on the loaded version. A conflict reloads and
/// re-applies the edit. History is appended only after the cart write
/// succeeds, so retries never duplicate entries.
pub struct CartService<C, H, P>
where
    C: CartStore,
    H: HistoryStore,
    P: ProductCatalog,
{
    carts: C,
    history: H,
    catalog: P,
    config: CartServiceConfig,
}

impl<C, H, P> CartService<C, H, P>
where
    C: CartStore,
    H: HistoryStore,
    P: ProductCatalog,
{
    /// Creates a new cart service with default tuning.
    pub fn new(carts: C, history: H, catalog: P) -> Self {
        Self::with_config(carts, history, catalog, CartServiceConfig::default())
    }

    /// Creates a new cart service with explicit tuning.
    pub fn with_config(carts: C, history: H, catalog: P, config: CartServiceConfig) -> Self {
        Self {
            carts,
            history,
            catalog,
            config,
        }
    }

    /// Returns a reference to the cart store.
    pub fn carts(&self) -> &C {
        &self.carts
    }

    /// Returns a reference to the history store.
    pub fn history(&self) -> &H {
        &self.history
    }

    /// Looks a product up in the catalog and adds it to the cart.
    #[tracing::instrument(skip(self), fields(teacher_id = %cmd.teacher_id, student_id = %cmd.student_id))]
    pub async fn add_to_cart(&self, cmd: AddToCart) -> Result<CartItem> {
        mutation::validate_quantity(cmd.quantity)?;
        let product_id = ObjectId::parse_str(&cmd.product_id)?;

        let snapshot = self.catalog.get_product(&product_id).await?;
        let item = snapshot.to_cart_item(product_id, cmd.quantity);

        self.add_item(&cmd.teacher_id, &cmd.student_id, item).await
    }

    /// Adds an item, merging with an existing line for the same product.
    ///
    /// Returns the line as stored, with its post-merge quantity.
    #[tracing::instrument(skip(self, item), fields(product_id = %item.product_id))]
    pub async fn add_item(
        &self,
        teacher_id: &TeacherId,
        student_id: &StudentId,
        item: CartItem,
    ) -> Result<CartItem> {
        mutation::validate_quantity(item.quantity)?;
        let product_id = item.product_id;

        let outcome = self
            .run("add_item", teacher_id, student_id, Load::OrCreate, |cart| {
                mutation::add_item(cart, item.clone())
            })
            .await?;

        outcome.item.ok_or(CartError::ItemNotFound { product_id })
    }

    /// Raises or lowers an item's quantity by one.
    ///
    /// Returns the item after the change, or `None` if a decrease removed it.
    #[tracing::instrument(skip(self))]
    pub async fn change_quantity(
        &self,
        teacher_id: &TeacherId,
        student_id: &StudentId,
        product_id: ObjectId,
        change: QuantityChange,
    ) -> Result<Option<CartItem>> {
        let outcome = self
            .run(
                "change_quantity",
                teacher_id,
                student_id,
                Load::Existing,
                |cart| mutation::change_quantity(cart, product_id, change),
            )
            .await?;

        Ok(outcome.item)
    }

    /// Removes an item and returns it.
    #[tracing::instrument(skip(self))]
    pub async fn remove_item(
        &self,
        teacher_id: &TeacherId,
        student_id: &StudentId,
        product_id: ObjectId,
    ) -> Result<CartItem> {
        let outcome = self
            .run("remove_item", teacher_id, student_id, Load::Existing, |cart| {
                mutation::remove_item(cart, product_id)
            })
            .await?;

        outcome.item.ok_or(CartError::ItemNotFound { product_id })
    }

    /// Archives every item in scope as `order` history, then empties the carts.
    ///
    /// Carts are cleared one at a time. On failure the carts already cleared
    /// stay cleared; running the clear again finishes the rest.
    #[tracing::instrument(skip(self))]
    pub async fn clear(&self, scope: ClearScope) -> Result<ClearSummary> {
        let owners: Vec<StudentId> = match &scope {
            ClearScope::Teacher(teacher_id) => self
                .carts
                .carts_for_teacher(teacher_id)
                .await
                .map_err(|source| CartError::Store {
                    operation: "clear",
                    teacher_id: Some(teacher_id.clone()),
                    student_id: None,
                    source,
                })?
                .into_iter()
                .filter(|cart| !cart.is_empty())
                .map(|cart| cart.student_id)
                .collect(),
            ClearScope::Student(_, student_id) => vec![student_id.clone()],
        };

        let teacher_id = scope.teacher_id();
        let mut summary = ClearSummary::default();

        for student_id in &owners {
            let outcome = self
                .run("clear", teacher_id, student_id, Load::Existing, |cart| {
                    Ok(mutation::archive_items(cart))
                })
                .await?;

            if outcome.is_change() {
                summary.carts_cleared += 1;
                summary.items_archived += outcome.history.len();
            }
        }

        tracing::info!(
            %teacher_id,
            carts_cleared = summary.carts_cleared,
            items_archived = summary.items_archived,
            "carts cleared"
        );
        Ok(summary)
    }

    /// Returns a student's cart, creating an empty one on first access.
    pub async fn get_cart(&self, teacher_id: &TeacherId, student_id: &StudentId) -> Result<Cart> {
        self.carts
            .get_or_create(teacher_id, student_id)
            .await
            .map_err(|source| CartError::Store {
                operation: "get_cart",
                teacher_id: Some(teacher_id.clone()),
                student_id: Some(student_id.clone()),
                source,
            })
    }

    /// Lists a teacher's carts, newest first.
    pub async fn carts_by_teacher(&self, teacher_id: &TeacherId) -> Result<Vec<StudentCartView>> {
        self.carts
            .list_by_teacher(teacher_id)
            .await
            .map_err(|source| CartError::Store {
                operation: "carts_by_teacher",
                teacher_id: Some(teacher_id.clone()),
                student_id: None,
                source,
            })
    }

    /// Lists every cart grouped by teacher.
    pub async fn carts_grouped_by_teacher(&self) -> Result<Vec<TeacherCartGroup>> {
        self.carts
            .list_all_grouped_by_teacher()
            .await
            .map_err(|source| CartError::Store {
                operation: "carts_grouped_by_teacher",
                teacher_id: None,
                student_id: None,
                source,
            })
    }

    /// Returns a teacher's cart history grouped by student.
    pub async fn history_by_teacher(&self, teacher_id: &TeacherId) -> Result<TeacherHistory> {
        self.history
            .query_by_teacher(teacher_id)
            .await
            .map_err(|source| CartError::Store {
                operation: "history_by_teacher",
                teacher_id: Some(teacher_id.clone()),
                student_id: None,
                source,
            })
    }

    async fn load(
        &self,
        load: &Load,
        teacher_id: &TeacherId,
        student_id: &StudentId,
    ) -> cart_store::Result<Cart> {
        match load {
            Load::OrCreate => self.carts.get_or_create(teacher_id, student_id).await,
            // A missing cart behaves like an empty one; item lookups fail before any write.
            Load::Existing => Ok(self
                .carts
                .find(teacher_id, student_id)
                .await?
                .unwrap_or_else(|| Cart::new(teacher_id.clone(), student_id.clone()))),
        }
    }

    /// Load, edit, compare-and-swap with retry, then append history.
    ///
    /// An edit that reports no history leaves the cart unwritten.
    async fn run<F>(
        &self,
        operation: &'static str,
        teacher_id: &TeacherId,
        student_id: &StudentId,
        load: Load,
        edit: F,
    ) -> Result<MutationOutcome>
    where
        F: Fn(&mut Cart) -> Result<MutationOutcome> + Send + Sync,
    {
        let store_error = |source: StoreError| CartError::Store {
            operation,
            teacher_id: Some(teacher_id.clone()),
            student_id: Some(student_id.clone()),
            source,
        };

        let mut attempt = 0;
        let outcome = loop {
            let mut cart = self
                .load(&load, teacher_id, student_id)
                .await
                .map_err(store_error)?;

            let outcome = edit(&mut cart)?;
            if !outcome.is_change() {
                return Ok(outcome);
            }

            match self.carts.replace(&cart).await {
                Ok(_) => break outcome,
                Err(e) if e.is_conflict() && attempt < self.config.max_conflict_retries => {
                    attempt += 1;
                    metrics::counter!("cart_conflict_retries_total", "operation" => operation)
                        .increment(1);
                    tracing::debug!(%teacher_id, %student_id, attempt, "cart write conflict, retrying");
                }
                Err(e) => {
                    if e.is_conflict() {
                        tracing::warn!(%teacher_id, %student_id, attempt, "cart write conflict retries exhausted");
                    }
                    return Err(store_error(e));
                }
            }
        };

        if let Err(e) = self.history.append(outcome.history.clone()).await {
            tracing::error!(%teacher_id, %student_id, operation, error = %e, "history append failed after cart write");
            return Err(store_error(e));
        }

        metrics::counter!("cart_mutations_total", "operation" => operation).increment(1);
        Ok(outcome)
    }
}
