//! HTTP API server for the item backend.
//!
//! Exposes item CRUD over REST. Mutating routes require a bearer token
//! verified by the identity provider. Requests are traced and item
//! outcomes are exported as Prometheus metrics.

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use identity::IdentityProvider;
use item_service::ItemService;
use item_store::ItemStore;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared application state accessible from all handlers.
pub struct AppState<S: ItemStore, I: IdentityProvider> {
    pub service: ItemService<S, I>,
}

impl<S: ItemStore, I: IdentityProvider> AppState<S, I> {
    /// Wraps a store and identity provider into shareable state.
    pub fn new(store: S, identity: I) -> Arc<Self> {
        Arc::new(Self {
            service: ItemService::new(store, identity),
        })
    }
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S, I>(state: Arc<AppState<S, I>>, metrics_handle: PrometheusHandle) -> Router
where
    S: ItemStore + 'static,
    I: IdentityProvider + 'static,
{
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::render))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route(
            "/items",
            get(routes::items::list::<S, I>).post(routes::items::create::<S, I>),
        )
        .route(
            "/items/{id}",
            get(routes::items::get::<S, I>)
                .put(routes::items::update::<S, I>)
                .delete(routes::items::delete::<S, I>),
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
