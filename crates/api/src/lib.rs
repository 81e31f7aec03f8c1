//! HTTP API server for the storefront backend.
//!
//! Exposes the catalog, cart, address, and order surfaces over REST with
//! structured logging (tracing) and Prometheus metrics.

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, patch, post, put};
use metrics_exporter_prometheus::PrometheusHandle;
use store::StorefrontStore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use state::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: StorefrontStore + Clone + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        // Catalog
        .route("/categories", post(routes::products::create_category::<S>))
        .route(
            "/categories/{id}/products",
            post(routes::products::create_product::<S>),
        )
        .route(
            "/categories/{id}/products",
            get(routes::products::list_by_category::<S>),
        )
        .route("/products", get(routes::products::list::<S>))
        .route("/products/search", get(routes::products::search::<S>))
        .route("/products/{id}", get(routes::products::get::<S>))
        .route("/products/{id}", put(routes::products::update::<S>))
        .route("/products/{id}", delete(routes::products::delete::<S>))
        .route(
            "/products/{id}/image",
            put(routes::products::update_image::<S>),
        )
        // Addresses
        .route("/addresses", post(routes::addresses::create::<S>))
        .route("/addresses/{id}", get(routes::addresses::get::<S>))
        // Cart
        .route("/cart", get(routes::carts::get::<S>))
        .route("/cart/items", post(routes::carts::add_item::<S>))
        .route(
            "/cart/items/{product_id}",
            patch(routes::carts::adjust_item::<S>),
        )
        .route(
            "/cart/items/{product_id}",
            delete(routes::carts::remove_item::<S>),
        )
        .route("/carts", get(routes::carts::list::<S>))
        // Orders
        .route("/orders", post(routes::orders::place::<S>))
        .route("/orders/{id}", get(routes::orders::get::<S>))
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

/// Creates the shared application state over a store.
pub fn create_state<S: StorefrontStore + Clone + 'static>(store: S) -> Arc<AppState<S>> {
    Arc::new(AppState::new(store))
}
