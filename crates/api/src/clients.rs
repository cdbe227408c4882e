//! HTTP clients for the product catalog and order service.

use std::time::Duration;

use async_trait::async_trait;
use axum::http::header::AUTHORIZATION;
use checkout::{OrderRequest, OrderResponse, OrderService, OrderServiceError};
use common::ObjectId;
use domain::{CatalogError, ProductCatalog, ProductSnapshot};
use reqwest::{Client, StatusCode};
use serde::Deserialize;

/// Builds the shared HTTP client with a request timeout.
pub fn http_client(timeout: Duration) -> reqwest::Result<Client> {
    Client::builder().timeout(timeout).build()
}

fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}{path}", base_url.trim_end_matches('/'))
}

#[derive(Debug, Deserialize)]
struct ProductEnvelope {
    data: Option<ProductData>,
}

#[derive(Debug, Deserialize)]
struct ProductData {
    product_name: String,
    original_price: f64,
    #[serde(default)]
    service_price: Option<f64>,
    #[serde(default)]
    cover_image: String,
    #[serde(default)]
    topic: Option<TopicRef>,
    #[serde(default)]
    category: Option<CategoryRef>,
}

#[derive(Debug, Deserialize)]
struct TopicRef {
    topic_name: String,
}

#[derive(Debug, Deserialize)]
struct CategoryRef {
    category_name: String,
}

impl From<ProductData> for ProductSnapshot {
    fn from(data: ProductData) -> Self {
        ProductSnapshot {
            name: data.product_name,
            price_store: data.original_price,
            price_service: data.service_price.unwrap_or(data.original_price),
            image_url: data.cover_image,
            topic: data.topic.map(|t| t.topic_name),
            category: data.category.map(|c| c.category_name),
        }
    }
}

/// Product catalog backed by the product service's REST API.
#[derive(Debug, Clone)]
pub struct HttpProductCatalog {
    client: Client,
    base_url: String,
}

impl HttpProductCatalog {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl ProductCatalog for HttpProductCatalog {
    #[tracing::instrument(skip(self))]
    async fn get_product(&self, product_id: &ObjectId) -> Result<ProductSnapshot, CatalogError> {
        let url = endpoint(&self.base_url, &format!("/api/v1/products/{product_id}"));

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| CatalogError::Transport(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(CatalogError::NotFound(*product_id));
        }
        if !status.is_success() {
            return Err(CatalogError::Transport(format!(
                "product service returned status {status}"
            )));
        }

        let envelope: ProductEnvelope = response
            .json()
            .await
            .map_err(|e| CatalogError::Transport(format!("undecodable product response: {e}")))?;

        envelope
            .data
            .map(ProductSnapshot::from)
            .ok_or(CatalogError::NotFound(*product_id))
    }
}

/// Order service backed by the order service's REST API.
#[derive(Debug, Clone)]
pub struct HttpOrderService {
    client: Client,
    base_url: String,
}

impl HttpOrderService {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl OrderService for HttpOrderService {
    #[tracing::instrument(skip(self, order, auth_token), fields(teacher_id = %order.teacher_id))]
    async fn create_order(
        &self,
        order: &OrderRequest,
        auth_token: Option<&str>,
    ) -> Result<OrderResponse, OrderServiceError> {
        let url = endpoint(&self.base_url, "/api/orders/items");

        let mut request = self.client.post(&url).json(order);
        if let Some(token) = auth_token {
            request = request.header(AUTHORIZATION, token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| OrderServiceError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| OrderServiceError::Transport(e.to_string()))?;

        match serde_json::from_slice::<OrderResponse>(&body) {
            Ok(mut decoded) => {
                // Failures may be reported in the HTTP status alone.
                if !status.is_success() && decoded.status_code.is_none() {
                    decoded.status_code = Some(status.as_u16());
                }
                Ok(decoded)
            }
            Err(_) if !status.is_success() => Err(OrderServiceError::Rejected {
                status_code: status.as_u16(),
                error_code: None,
                message: format!("order service returned status {status}"),
            }),
            Err(e) => Err(OrderServiceError::Transport(format!(
                "undecodable order response: {e}"
            ))),
        }
    }
}
