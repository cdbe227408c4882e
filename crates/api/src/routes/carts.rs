//! Cart endpoints for the authenticated teacher.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use checkout::{CheckoutRequest, ShippingForm};
use common::{ObjectId, StudentId};
use domain::{AddToCart, ClearScope, QuantityChange};
use serde::Deserialize;

use super::{AppState, auth_token, respond, teacher_id};
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct AddItemBody {
    #[serde(default)]
    pub student_id: String,
    #[serde(default)]
    pub product_id: String,
    #[serde(default)]
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
pub struct UpdateQuantityBody {
    #[serde(default)]
    pub student_id: String,
    #[serde(default)]
    pub types: String,
}

#[derive(Debug, Deserialize)]
pub struct StudentBody {
    #[serde(default)]
    pub student_id: String,
}

/// GET /api/v1/cart/items: lists the teacher's carts.
#[tracing::instrument(skip_all)]
pub async fn list(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let teacher_id = teacher_id(&headers)?;
    let carts = state.carts.carts_by_teacher(&teacher_id).await?;
    Ok(respond("Cart data of user retrieved successfully", carts))
}

/// POST /api/v1/cart/items: adds a catalog product to a student's cart.
#[tracing::instrument(skip_all)]
pub async fn add(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<Json<AddItemBody>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(body) = body?;
    let teacher_id = teacher_id(&headers)?;
    let student_id = StudentId::parse(&body.student_id)?;
    if body.product_id.trim().is_empty() {
        return Err(ApiError::BadRequest("product ID cannot be empty".to_string()));
    }
    let quantity = u32::try_from(body.quantity)
        .ok()
        .filter(|q| *q > 0)
        .ok_or_else(|| ApiError::BadRequest("quantity must be greater than 0".to_string()))?;

    let item = state
        .carts
        .add_to_cart(AddToCart {
            teacher_id,
            student_id,
            product_id: body.product_id.trim().to_string(),
            quantity,
        })
        .await?;

    Ok(respond("Product has been added to cart", item))
}

/// PUT /api/v1/cart/items/{product_id}: raises or lowers a quantity by one.
#[tracing::instrument(skip(state, headers, body))]
pub async fn update_quantity(
    State(state): State<Arc<AppState>>,
    Path(product_id): Path<String>,
    headers: HeaderMap,
    body: Result<Json<UpdateQuantityBody>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(body) = body?;
    let teacher_id = teacher_id(&headers)?;
    let student_id = StudentId::parse(&body.student_id)?;
    let product_id = ObjectId::parse_str(&product_id)?;
    let change = QuantityChange::parse(&body.types)?;

    let item = state
        .carts
        .change_quantity(&teacher_id, &student_id, product_id, change)
        .await?;

    Ok(respond("Update successfully", item))
}

/// DELETE /api/v1/cart/items/{product_id}: removes an item from a student's cart.
#[tracing::instrument(skip(state, headers, body))]
pub async fn remove(
    State(state): State<Arc<AppState>>,
    Path(product_id): Path<String>,
    headers: HeaderMap,
    body: Result<Json<StudentBody>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(body) = body?;
    let teacher_id = teacher_id(&headers)?;
    let student_id = StudentId::parse(&body.student_id)?;
    let product_id = ObjectId::parse_str(&product_id)?;

    let item = state
        .carts
        .remove_item(&teacher_id, &student_id, product_id)
        .await?;

    Ok(respond("Product deleted successfully", item))
}

/// DELETE /api/v1/cart/items: archives and empties every cart of the teacher.
#[tracing::instrument(skip_all)]
pub async fn clear(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let teacher_id = teacher_id(&headers)?;
    let summary = state.carts.clear(ClearScope::Teacher(teacher_id)).await?;
    Ok(respond("Cart deleted successfully", summary))
}

/// POST /api/v1/cart/items/checkout: places the order and clears the carts.
#[tracing::instrument(skip_all)]
pub async fn checkout(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    shipping: Result<Json<ShippingForm>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(shipping) = shipping?;
    let teacher_id = teacher_id(&headers)?;

    let receipt = state
        .checkout
        .checkout(CheckoutRequest {
            teacher_id,
            shipping,
            auth_token: auth_token(&headers),
        })
        .await?;

    Ok(respond("Checkout successfully", receipt))
}
