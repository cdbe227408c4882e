//! Product catalog capability and in-memory implementation.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use cart_store::CartItem;
use common::ObjectId;
use serde::{Deserialize, Serialize};

use crate::error::CatalogError;

/// Catalog data copied into a cart item at mutation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductSnapshot {
    pub name: String,
    pub price_store: f64,
    pub price_service: f64,
    pub image_url: String,
    pub topic: Option<String>,
    pub category: Option<String>,
}

impl ProductSnapshot {
    /// Creates a snapshot with the same store and service price.
    pub fn new(name: impl Into<String>, price: f64, image_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            price_store: price,
            price_service: price,
            image_url: image_url.into(),
            topic: None,
            category: None,
        }
    }

    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Builds a cart line priced at the store price.
    pub fn to_cart_item(&self, product_id: ObjectId, quantity: u32) -> CartItem {
        let mut item = CartItem::new(
            product_id,
            self.name.clone(),
            self.price_store,
            quantity,
            self.image_url.clone(),
        );
        item.topic_name = self.topic.clone();
        item.category_name = self.category.clone();
        item
    }
}

/// Looks up products by id.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    /// Returns the current snapshot of a product.
    async fn get_product(&self, product_id: &ObjectId) -> Result<ProductSnapshot, CatalogError>;
}

#[async_trait]
impl<T: ProductCatalog + ?Sized> ProductCatalog for Arc<T> {
    async fn get_product(&self, product_id: &ObjectId) -> Result<ProductSnapshot, CatalogError> {
        (**self).get_product(product_id).await
    }
}

#[derive(Debug, Default)]
struct InMemoryCatalogState {
    products: HashMap<ObjectId, ProductSnapshot>,
    lookups: usize,
    fail_on_lookup: bool,
}

/// In-memory product catalog for testing and local runs.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProductCatalog {
    state: Arc<RwLock<InMemoryCatalogState>>,
}

impl InMemoryProductCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a product.
    pub fn insert(&self, product_id: ObjectId, snapshot: ProductSnapshot) {
        self.state
            .write()
            .unwrap()
            .products
            .insert(product_id, snapshot);
    }

    /// Configures every lookup to fail at the transport level.
    pub fn set_fail_on_lookup(&self, fail: bool) {
        self.state.write().unwrap().fail_on_lookup = fail;
    }

    /// Returns how many lookups have been served.
    pub fn lookup_count(&self) -> usize {
        self.state.read().unwrap().lookups
    }
}

#[async_trait]
impl ProductCatalog for InMemoryProductCatalog {
    async fn get_product(&self, product_id: &ObjectId) -> Result<ProductSnapshot, CatalogError> {
        let mut state = self.state.write().unwrap();
        state.lookups += 1;

        if state.fail_on_lookup {
            return Err(CatalogError::Transport("catalog unavailable".to_string()));
        }

        state
            .products
            .get(product_id)
            .cloned()
            .ok_or(CatalogError::NotFound(*product_id))
    }
}
