//! Remote capabilities used by checkout.

pub mod order;

pub use order::{
    InMemoryOrderService, OrderRequest, OrderResponse, OrderService, OrderServiceError,
    PlacedOrder,
};
