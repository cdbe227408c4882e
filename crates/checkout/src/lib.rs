//! Checkout for the cart service.
//!
//! Checkout is a two-step saga:
//! 1. Place the order with the remote order service
//! 2. Archive and clear the teacher's carts
//!
//! The steps are not transactional. A failure in step 2 after step 1 succeeded
//! is reported separately so the caller can retry the clear on its own.

pub mod coordinator;
pub mod error;
pub mod services;
pub mod shipping;
pub mod state;

pub use coordinator::{
    CheckoutConfig, CheckoutCoordinator, CheckoutReceipt, CheckoutRequest, DEFAULT_ORDER_TIMEOUT,
};
pub use error::{CheckoutError, Result};
pub use services::{
    InMemoryOrderService, OrderRequest, OrderResponse, OrderService, OrderServiceError,
    PlacedOrder,
};
pub use shipping::{PaymentType, ShippingDetails, ShippingForm};
pub use state::CheckoutState;
