//! API error types with HTTP response mapping.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use checkout::CheckoutError;
use common::IdError;
use domain::CartError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Bad request from the client.
    BadRequest(String),
    /// Cart operation error.
    Cart(CartError),
    /// Checkout error.
    Checkout(CheckoutError),
}

impl ApiError {
    /// Returns the status code, machine-readable code and message for this error.
    pub fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST", msg.clone()),
            ApiError::Cart(err) => cart_error_parts(err),
            ApiError::Checkout(err) => checkout_error_parts(err),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();
        metrics::counter!("http_errors_total", "error_code" => code).increment(1);
        if status.is_server_error() {
            tracing::error!(error = %message, error_code = code, "request failed");
        }

        let body = serde_json::json!({ "error": message, "error_code": code });
        (status, axum::Json(body)).into_response()
    }
}

fn cart_error_parts(err: &CartError) -> (StatusCode, &'static str, String) {
    let (status, code) = match err {
        CartError::Validation(_) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST"),
        CartError::InvalidIdentifier(_) => (StatusCode::BAD_REQUEST, "INVALID_IDENTIFIER"),
        CartError::ItemNotFound { .. } => (StatusCode::NOT_FOUND, "ITEM_NOT_FOUND"),
        CartError::ProductNotFound(_) => (StatusCode::NOT_FOUND, "PRODUCT_NOT_FOUND"),
        CartError::Transport(_) => (StatusCode::BAD_GATEWAY, "UPSTREAM_UNAVAILABLE"),
        _ if err.is_conflict() => (StatusCode::CONFLICT, "CONCURRENCY_CONFLICT"),
        CartError::Store { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "STORE_ERROR"),
    };
    (status, code, err.to_string())
}

fn checkout_error_parts(err: &CheckoutError) -> (StatusCode, &'static str, String) {
    let (status, code) = match err {
        CheckoutError::Validation(_) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST"),
        CheckoutError::OrderRejected { .. } => (StatusCode::BAD_GATEWAY, "ORDER_REJECTED"),
        CheckoutError::Transport(_) => (StatusCode::BAD_GATEWAY, "UPSTREAM_UNAVAILABLE"),
        CheckoutError::OrderCreatedCartClearFailed { .. } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "ORDER_CREATED_CART_NOT_CLEARED",
        ),
    };
    (status, code, err.to_string())
}

impl From<CartError> for ApiError {
    fn from(err: CartError) -> Self {
        ApiError::Cart(err)
    }
}

impl From<CheckoutError> for ApiError {
    fn from(err: CheckoutError) -> Self {
        ApiError::Checkout(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<IdError> for ApiError {
    fn from(err: IdError) -> Self {
        ApiError::Cart(CartError::InvalidIdentifier(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cart_store::StoreError;
    use common::{ObjectId, TeacherId};

    fn status(err: impl Into<ApiError>) -> (StatusCode, &'static str) {
        let (status, code, _) = err.into().parts();
        (status, code)
    }

    fn store_error(source: StoreError) -> CartError {
        CartError::Store {
            operation: "add_item",
            teacher_id: None,
            student_id: None,
            source,
        }
    }

    #[test]
    fn cart_errors_map_to_status() {
        assert_eq!(
            status(CartError::Validation("x".into())).0,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status(IdError::Empty { field: "student_id" }).0,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status(CartError::ItemNotFound {
                product_id: ObjectId::new()
            })
            .0,
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status(CartError::ProductNotFound(ObjectId::new())).0,
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status(store_error(StoreError::ConcurrencyConflict {
                cart_id: ObjectId::new(),
                expected: cart_store::Version::first(),
                actual: cart_store::Version::first().next(),
            })),
            (StatusCode::CONFLICT, "CONCURRENCY_CONFLICT")
        );
        assert_eq!(
            status(store_error(StoreError::Corrupt("bad row".into()))).0,
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn checkout_errors_map_to_status() {
        assert_eq!(
            status(CheckoutError::OrderRejected {
                status_code: 500,
                error_code: None,
                message: "no".into(),
            })
            .0,
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status(CheckoutError::Transport("down".into())).0,
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status(CheckoutError::OrderCreatedCartClearFailed {
                teacher_id: TeacherId::parse("t-1").unwrap(),
                source: CartError::Transport("x".into()),
            }),
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "ORDER_CREATED_CART_NOT_CLEARED"
            )
        );
    }
}
