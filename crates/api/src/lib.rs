//! HTTP surface for the order fulfillment core.
//!
//! REST endpoints for carts, checkout, the order lifecycle, logistics, and
//! the admin order query, with structured logging (tracing) and Prometheus
//! metrics.

pub mod collab;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post, put};
use metrics_exporter_prometheus::PrometheusHandle;
use store::DocumentStore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use state::{AppState, create_default_state};

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: DocumentStore + Clone + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/cart/{owner}", get(routes::cart::get::<S>))
        .route("/cart/{owner}", post(routes::cart::adjust::<S>))
        .route("/cart/{owner}/merge", post(routes::cart::merge::<S>))
        .route("/checkout/{owner}", post(routes::checkout::place_order::<S>))
        .route("/orders/{id}", get(routes::orders::get::<S>))
        .route(
            "/orders/update-status/{id}",
            put(routes::orders::update_status::<S>),
        )
        .route(
            "/orders/update-logistics/{id}",
            put(routes::orders::update_logistics::<S>),
        )
        .route("/payment/confirm/{id}", post(routes::payment::confirm::<S>))
        .route("/admin/orders", get(routes::orders::admin_list::<S>))
        .route("/admin/logistics", post(routes::logistics::create::<S>))
        .route("/admin/logistics", get(routes::logistics::list::<S>))
        .route(
            "/admin/logistics/{id}/retire",
            put(routes::logistics::retire::<S>),
        )
        .route("/admin/stock", post(routes::stock::set::<S>))
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
