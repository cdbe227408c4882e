//! Order service trait and in-memory implementation.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use common::TeacherId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::shipping::{PaymentType, ShippingDetails};

/// Errors from the order capability.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OrderServiceError {
    /// The service answered with a structured failure.
    #[error("order rejected ({status_code}): {message}")]
    Rejected {
        status_code: u16,
        error_code: Option<String>,
        message: String,
    },

    /// The service could not be reached, timed out, or answered with an
    /// undecodable body.
    #[error("order service transport error: {0}")]
    Transport(String),
}

/// Body sent to the order service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub teacher_id: TeacherId,
    pub email: String,
    #[serde(rename = "types")]
    pub payment_type: PaymentType,
    pub street: String,
    pub city: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    pub country: String,
    pub phone: String,
}

impl OrderRequest {
    pub fn new(teacher_id: TeacherId, shipping: ShippingDetails) -> Self {
        Self {
            teacher_id,
            email: shipping.email,
            payment_type: shipping.payment_type,
            street: shipping.street,
            city: shipping.city,
            state: shipping.state,
            country: shipping.country,
            phone: shipping.phone,
        }
    }
}

/// Decoded response body of the order service.
///
/// Failures are reported in-band through `status_code`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderResponse {
    #[serde(default)]
    pub status_code: Option<u16>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub error_code: Option<String>,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

impl OrderResponse {
    /// A successful response carrying `data`.
    pub fn success(data: serde_json::Value) -> Self {
        Self {
            status_code: Some(200),
            data: Some(data),
            ..Default::default()
        }
    }

    /// A failure response.
    pub fn failure(status_code: u16, error_code: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            status_code: Some(status_code),
            error: Some(error.into()),
            error_code: Some(error_code.into()),
            data: None,
        }
    }

    /// Converts a `status_code >= 400` into a rejection; otherwise yields `data`.
    pub fn into_result(self) -> Result<Option<serde_json::Value>, OrderServiceError> {
        match self.status_code {
            Some(status_code) if status_code >= 400 => Err(OrderServiceError::Rejected {
                status_code,
                message: self
                    .error
                    .unwrap_or_else(|| format!("order service returned status {status_code}")),
                error_code: self.error_code,
            }),
            _ => Ok(self.data),
        }
    }
}

/// Trait for the remote order capability.
#[async_trait]
pub trait OrderService: Send + Sync {
    /// Creates an order, forwarding the caller's authorization credential.
    async fn create_order(
        &self,
        order: &OrderRequest,
        auth_token: Option<&str>,
    ) -> Result<OrderResponse, OrderServiceError>;
}

#[async_trait]
impl<T: OrderService + ?Sized> OrderService for Arc<T> {
    async fn create_order(
        &self,
        order: &OrderRequest,
        auth_token: Option<&str>,
    ) -> Result<OrderResponse, OrderServiceError> {
        (**self).create_order(order, auth_token).await
    }
}

/// An order accepted by [`InMemoryOrderService`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedOrder {
    pub order_id: String,
    pub request: OrderRequest,
    pub auth_token: Option<String>,
}

#[derive(Debug, Default)]
struct InMemoryOrderState {
    orders: Vec<PlacedOrder>,
    calls: usize,
    next_id: u32,
    reject_with: Option<(u16, String, String)>,
    fail_transport: bool,
    delay: Option<Duration>,
}

/// In-memory order service for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryOrderService {
    state: Arc<RwLock<InMemoryOrderState>>,
}

impl InMemoryOrderService {
    /// Creates a new in-memory order service.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes subsequent calls answer with `status_code` and the given error.
    pub fn set_reject(&self, status_code: u16, error_code: &str, error: &str) {
        self.state.write().unwrap().reject_with =
            Some((status_code, error_code.to_string(), error.to_string()));
    }

    /// Stops rejecting calls.
    pub fn clear_reject(&self) {
        self.state.write().unwrap().reject_with = None;
    }

    /// Configures calls to fail before reaching the service.
    pub fn set_fail_on_transport(&self, fail: bool) {
        self.state.write().unwrap().fail_transport = fail;
    }

    /// Delays every answer, for exercising timeouts.
    pub fn set_delay(&self, delay: Option<Duration>) {
        self.state.write().unwrap().delay = delay;
    }

    /// Returns the orders that were accepted.
    pub fn orders(&self) -> Vec<PlacedOrder> {
        self.state.read().unwrap().orders.clone()
    }

    /// Returns the number of accepted orders.
    pub fn order_count(&self) -> usize {
        self.state.read().unwrap().orders.len()
    }

    /// Returns how many times the service was called, including failures.
    pub fn call_count(&self) -> usize {
        self.state.read().unwrap().calls
    }
}

#[async_trait]
impl OrderService for InMemoryOrderService {
    async fn create_order(
        &self,
        order: &OrderRequest,
        auth_token: Option<&str>,
    ) -> Result<OrderResponse, OrderServiceError> {
        let delay = {
            let mut state = self.state.write().unwrap();
            state.calls += 1;
            state.delay
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state.write().unwrap();

        if state.fail_transport {
            return Err(OrderServiceError::Transport(
                "connection refused".to_string(),
            ));
        }

        if let Some((status_code, error_code, error)) = state.reject_with.clone() {
            return Ok(OrderResponse::failure(status_code, error_code, error));
        }

        state.next_id += 1;
        let order_id = format!("ORD-{:04}", state.next_id);
        state.orders.push(PlacedOrder {
            order_id: order_id.clone(),
            request: order.clone(),
            auth_token: auth_token.map(str::to_string),
        });

        Ok(OrderResponse::success(serde_json::json!({
            "order_id": order_id,
            "teacher_id": order.teacher_id,
        })))
    }
}
