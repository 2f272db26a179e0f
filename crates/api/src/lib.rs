//! Reference storefront server.
//!
//! Serves the server cart, shipping quote, payment intent, verification and
//! order endpoints from memory, with structured logging (tracing) and
//! Prometheus metrics. A sandbox endpoint pays intents with a valid
//! signature so the whole checkout runs without a real gateway.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, patch, post};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;
use state::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::ops::metrics))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::ops::health))
        .route(
            "/api/cart",
            get(routes::cart::get).delete(routes::cart::clear),
        )
        .route(
            "/api/cart/items",
            post(routes::cart::add_item).patch(routes::cart::update_quantity),
        )
        .route("/api/cart/items/remove", post(routes::cart::remove_item))
        .route(
            "/api/checkout/shipping-quote",
            get(routes::checkout::shipping_quote),
        )
        .route("/api/payments/intents", post(routes::checkout::create_intent))
        .route("/api/payments/verify", post(routes::checkout::verify))
        .route("/api/orders/{id}", get(routes::checkout::get_order))
        .route(
            "/sandbox/pay/{gateway_order_id}",
            post(routes::checkout::sandbox_pay),
        )
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

/// Creates the default application state for a configuration.
pub fn create_default_state(config: &Config) -> Arc<AppState> {
    AppState::new(config)
}
