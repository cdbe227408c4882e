//! HTTP API server with observability for the classroom cart service.
//!
//! Exposes the cart mutator, read views and checkout over REST, with
//! structured logging (tracing) and Prometheus metrics.

pub mod clients;
pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post, put};
use cart_store::{InMemoryCartStore, InMemoryHistoryStore};
use checkout::CheckoutCoordinator;
use domain::CartService;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;
use routes::{AppState, SharedCartStore, SharedCatalog, SharedHistoryStore, SharedOrderService};

/// Creates the Axum application router with all routes and shared state.
pub fn create_app(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::render))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route(
            "/api/v1/cart/items",
            get(routes::carts::list)
                .post(routes::carts::add)
                .delete(routes::carts::clear),
        )
        .route("/api/v1/cart/items/checkout", post(routes::carts::checkout))
        .route(
            "/api/v1/cart/items/{product_id}",
            put(routes::carts::update_quantity).delete(routes::carts::remove),
        )
        .route("/api/v1/admin/cart", get(routes::admin::carts))
        .route("/api/v1/admin/cart/history", get(routes::admin::history))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Wires the cart service and checkout coordinator over the given backends.
pub fn create_state(
    carts: SharedCartStore,
    history: SharedHistoryStore,
    catalog: SharedCatalog,
    orders: SharedOrderService,
    config: &Config,
) -> Arc<AppState> {
    let cart_service = Arc::new(CartService::with_config(
        carts,
        history,
        catalog,
        config.cart_service_config(),
    ));
    let checkout =
        CheckoutCoordinator::with_config(cart_service.clone(), orders, config.checkout_config());

    Arc::new(AppState {
        carts: cart_service,
        checkout,
    })
}

/// Creates application state with in-memory cart and history stores.
pub fn create_in_memory_state(
    catalog: SharedCatalog,
    orders: SharedOrderService,
    config: &Config,
) -> Arc<AppState> {
    create_state(
        Arc::new(InMemoryCartStore::new()),
        Arc::new(InMemoryHistoryStore::new()),
        catalog,
        orders,
        config,
    )
}
