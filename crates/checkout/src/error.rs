//! Checkout error types.

use common::TeacherId;
use domain::CartError;
use thiserror::Error;

use crate::services::OrderServiceError;

/// Errors that can occur during checkout.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// A shipping or contact field was missing or malformed. No remote call was made.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The order service answered with a structured failure. The cart is untouched.
    #[error("Order rejected ({status_code}): {message}")]
    OrderRejected {
        status_code: u16,
        error_code: Option<String>,
        message: String,
    },

    /// The order service could not be reached or timed out. The cart is untouched.
    #[error("Order service transport error: {0}")]
    Transport(String),

    /// The order exists remotely but the cart was not cleared.
    ///
    /// Retry only the clear step; placing the order again would duplicate it.
    #[error("Order created for teacher {teacher_id} but cart was not cleared: {source}")]
    OrderCreatedCartClearFailed {
        teacher_id: TeacherId,
        #[source]
        source: CartError,
    },
}

impl CheckoutError {
    /// Returns true if the remote order was created.
    pub fn order_created(&self) -> bool {
        matches!(self, CheckoutError::OrderCreatedCartClearFailed { .. })
    }

    /// Short label used for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            CheckoutError::Validation(_) => "validation",
            CheckoutError::OrderRejected { .. } => "order_rejected",
            CheckoutError::Transport(_) => "transport",
            CheckoutError::OrderCreatedCartClearFailed { .. } => "cart_clear_failed",
        }
    }
}

impl From<OrderServiceError> for CheckoutError {
    fn from(e: OrderServiceError) -> Self {
        match e {
            OrderServiceError::Rejected {
                status_code,
                error_code,
                message,
            } => CheckoutError::OrderRejected {
                status_code,
                error_code,
                message,
            },
            OrderServiceError::Transport(msg) => CheckoutError::Transport(msg),
        }
    }
}

/// Convenience type alias for checkout results.
pub type Result<T> = std::result::Result<T, CheckoutError>;
