//! Route handlers and the state they share.

pub mod admin;
pub mod carts;
pub mod health;
pub mod metrics;

use std::sync::Arc;

use axum::Json;
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use cart_store::{CartStore, HistoryStore};
use checkout::{CheckoutCoordinator, OrderService};
use common::TeacherId;
use domain::{CartService, ProductCatalog};
use serde::Serialize;

use crate::error::ApiError;

/// Header carrying the authenticated teacher id, set by the gateway.
pub const USER_ID_HEADER: &str = "x-user-id";

pub type SharedCartStore = Arc<dyn CartStore>;
pub type SharedHistoryStore = Arc<dyn HistoryStore>;
pub type SharedCatalog = Arc<dyn ProductCatalog>;
pub type SharedOrderService = Arc<dyn OrderService>;

pub type AppCartService = CartService<SharedCartStore, SharedHistoryStore, SharedCatalog>;
pub type AppCheckout =
    CheckoutCoordinator<SharedCartStore, SharedHistoryStore, SharedCatalog, SharedOrderService>;

/// Shared application state.
pub struct AppState {
    pub carts: Arc<AppCartService>,
    pub checkout: AppCheckout,
}

/// Success envelope: `{ "message": .., "data": .. }`.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub message: &'static str,
    pub data: T,
}

pub(crate) fn respond<T: Serialize>(message: &'static str, data: T) -> Json<Envelope<T>> {
    Json(Envelope { message, data })
}

pub(crate) fn teacher_id(headers: &HeaderMap) -> Result<TeacherId, ApiError> {
    let value = headers
        .get(USER_ID_HEADER)
        .ok_or_else(|| ApiError::BadRequest("user ID cannot be empty".to_string()))?
        .to_str()
        .map_err(|_| ApiError::BadRequest("user ID is not valid text".to_string()))?;
    Ok(TeacherId::parse(value)?)
}

pub(crate) fn auth_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}
