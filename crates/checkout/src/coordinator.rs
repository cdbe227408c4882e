//! Checkout coordinator: places the remote order, then clears the carts.

use std::sync::Arc;
use std::time::{Duration, Instant};

use cart_store::{CartStore, HistoryStore};
use common::TeacherId;
use domain::{CartService, ClearScope, ClearSummary, ProductCatalog};
use serde::{Deserialize, Serialize};

use crate::error::{CheckoutError, Result};
use crate::services::{OrderRequest, OrderService, OrderServiceError};
use crate::shipping::ShippingForm;
use crate::state::CheckoutState;

/// Default bound on the remote order call.
pub const DEFAULT_ORDER_TIMEOUT: Duration = Duration::from_secs(10);

/// Tuning for [`CheckoutCoordinator`].
#[derive(Debug, Clone, Copy)]
pub struct CheckoutConfig {
    pub order_timeout: Duration,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            order_timeout: DEFAULT_ORDER_TIMEOUT,
        }
    }
}

/// A checkout request from an authenticated teacher.
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub teacher_id: TeacherId,
    pub shipping: ShippingForm,
    /// Authorization credential forwarded to the order service.
    pub auth_token: Option<String>,
}

/// Outcome of a successful checkout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckoutReceipt {
    pub teacher_id: TeacherId,
    pub state: CheckoutState,
    /// The order service's `data` payload, if any.
    pub order: Option<serde_json::Value>,
    pub cleared: ClearSummary,
}

/// Orchestrates checkout.
///
/// The remote order and the local cart clear are not transactional. Once
/// the order service accepts, the order is never retracted: a failed clear
/// is reported as [`CheckoutError::OrderCreatedCartClearFailed`] and can be
/// finished with [`CheckoutCoordinator::retry_clear`].
pub struct CheckoutCoordinator<C, H, P, O>
where
    C: CartStore,
    H: HistoryStore,
    P: ProductCatalog,
    O: OrderService,
{
    carts: Arc<CartService<C, H, P>>,
    orders: O,
    config: CheckoutConfig,
}

impl<C, H, P, O> CheckoutCoordinator<C, H, P, O>
where
    C: CartStore,
    H: HistoryStore,
    P: ProductCatalog,
    O: OrderService,
{
    /// Creates a new checkout coordinator.
    pub fn new(carts: Arc<CartService<C, H, P>>, orders: O) -> Self {
        Self::with_config(carts, orders, CheckoutConfig::default())
    }

    /// Creates a new checkout coordinator with explicit tuning.
    pub fn with_config(carts: Arc<CartService<C, H, P>>, orders: O, config: CheckoutConfig) -> Self {
        Self {
            carts,
            orders,
            config,
        }
    }

    /// Returns the cart service this coordinator clears through.
    pub fn cart_service(&self) -> &Arc<CartService<C, H, P>> {
        &self.carts
    }

    /// Validates the shipping form, places the order, then clears the teacher's carts.
    #[tracing::instrument(skip(self, request), fields(teacher_id = %request.teacher_id))]
    pub async fn checkout(&self, request: CheckoutRequest) -> Result<CheckoutReceipt> {
        metrics::counter!("checkout_total").increment(1);
        let started = Instant::now();

        let result = self.run(request).await;

        let duration = started.elapsed().as_secs_f64();
        metrics::histogram!("checkout_duration_seconds").record(duration);
        if let Err(e) = &result {
            metrics::counter!("checkout_failed_total", "reason" => e.kind()).increment(1);
        }
        result
    }

    async fn run(&self, request: CheckoutRequest) -> Result<CheckoutReceipt> {
        let CheckoutRequest {
            teacher_id,
            shipping,
            auth_token,
        } = request;

        // 1. Validate before any remote call
        let shipping = shipping.validate()?;
        let mut state = CheckoutState::Pending;

        // 2. Place the order
        let order = OrderRequest::new(teacher_id.clone(), shipping);
        let placed = match self.place_order(&order, auth_token.as_deref()).await {
            Ok(data) => data,
            Err(e) => {
                state = advance(state, CheckoutState::Rejected);
                tracing::warn!(%teacher_id, %state, error = %e, "order not created");
                return Err(e.into());
            }
        };
        state = advance(state, CheckoutState::OrderPlaced);
        tracing::info!(%teacher_id, payment_type = %order.payment_type, "order placed");

        // 3. Clear the carts. The order exists from here on.
        match self.carts.clear(ClearScope::Teacher(teacher_id.clone())).await {
            Ok(cleared) => {
                state = advance(state, CheckoutState::Completed);
                tracing::info!(
                    %teacher_id,
                    items_archived = cleared.items_archived,
                    "checkout completed"
                );
                Ok(CheckoutReceipt {
                    teacher_id,
                    state,
                    order: placed,
                    cleared,
                })
            }
            Err(source) => {
                state = advance(state, CheckoutState::ClearFailed);
                tracing::error!(%teacher_id, %state, error = %source, "order created but cart clear failed");
                Err(CheckoutError::OrderCreatedCartClearFailed { teacher_id, source })
            }
        }
    }

    async fn place_order(
        &self,
        order: &OrderRequest,
        auth_token: Option<&str>,
    ) -> std::result::Result<Option<serde_json::Value>, OrderServiceError> {
        let response = tokio::time::timeout(
            self.config.order_timeout,
            self.orders.create_order(order, auth_token),
        )
        .await
        .map_err(|_| {
            OrderServiceError::Transport(format!(
                "order service did not answer within {:?}",
                self.config.order_timeout
            ))
        })??;

        response.into_result()
    }

    /// Re-runs only the cart clear after an `OrderCreatedCartClearFailed`.
    ///
    /// Never contacts the order service.
    #[tracing::instrument(skip(self))]
    pub async fn retry_clear(&self, teacher_id: &TeacherId) -> Result<CheckoutReceipt> {
        match self.carts.clear(ClearScope::Teacher(teacher_id.clone())).await {
            Ok(cleared) => {
                tracing::info!(%teacher_id, items_archived = cleared.items_archived, "cart clear retried");
                Ok(CheckoutReceipt {
                    teacher_id: teacher_id.clone(),
                    state: advance(CheckoutState::ClearFailed, CheckoutState::Completed),
                    order: None,
                    cleared,
                })
            }
            Err(source) => Err(CheckoutError::OrderCreatedCartClearFailed {
                teacher_id: teacher_id.clone(),
                source,
            }),
        }
    }
}

fn advance(from: CheckoutState, to: CheckoutState) -> CheckoutState {
    debug_assert!(from.can_transition_to(to), "illegal checkout transition {from} -> {to}");
    to
}
