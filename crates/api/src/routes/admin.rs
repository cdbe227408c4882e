//! Administrative read endpoints.

use std::sync::Arc;

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use common::TeacherId;
use serde::Deserialize;

use super::{AppState, respond};
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    #[serde(default)]
    pub teacher_id: String,
}

/// GET /api/v1/admin/cart: every cart grouped by teacher.
pub async fn carts(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let groups = state.carts.carts_grouped_by_teacher().await?;
    Ok(respond("Cart data retrieved successfully", groups))
}

/// GET /api/v1/admin/cart/history?teacher_id=: a teacher's history grouped by student.
#[tracing::instrument(skip(state))]
pub async fn history(
    State(state): State<Arc<AppState>>,
    params: Result<Query<HistoryParams>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(params) = params?;
    let teacher_id = TeacherId::parse(&params.teacher_id)?;
    let history = state.carts.history_by_teacher(&teacher_id).await?;
    Ok(respond(
        "Cart history data of teacher retrieved successfully",
        history,
    ))
}
