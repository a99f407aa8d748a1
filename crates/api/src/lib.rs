//! HTTP API server for the banking-and-marketplace backend.
//!
//! Provides REST endpoints for account queries, peer transfers, cart
//! mutation, and checkout, with structured logging (tracing) and
//! Prometheus metrics.

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::routing::{get, post};
use checkout::{CartService, CheckoutOrchestrator, TransferService};
use doc_store::DocumentStore;
use ledger::LedgerStore;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use auth::AuthService;

/// Shared application state accessible from all handlers.
pub struct AppState<L, D>
where
    L: LedgerStore + Clone,
    D: DocumentStore + Clone,
{
    pub ledger: L,
    pub docs: D,
    pub auth: AuthService<L>,
    pub carts: CartService<D>,
    pub transfers: TransferService<L>,
    pub checkout: CheckoutOrchestrator<L, D>,
}

/// Creates the application state from the two backing stores.
pub fn create_state<L, D>(ledger: L, docs: D, session_ttl: Duration) -> Arc<AppState<L, D>>
where
    L: LedgerStore + Clone,
    D: DocumentStore + Clone,
{
    Arc::new(AppState {
        auth: AuthService::new(ledger.clone(), session_ttl),
        carts: CartService::new(docs.clone()),
        transfers: TransferService::new(ledger.clone()),
        checkout: CheckoutOrchestrator::new(ledger.clone(), docs.clone()),
        ledger,
        docs,
    })
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<L, D>(state: Arc<AppState<L, D>>, metrics_handle: PrometheusHandle) -> Router
where
    L: LedgerStore + Clone + 'static,
    D: DocumentStore + Clone + 'static,
{
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/api/auth/login", post(routes::auth::login::<L, D>))
        .route("/api/me/info", get(routes::account::info::<L, D>))
        .route("/api/me/movements", get(routes::account::movements::<L, D>))
        .route("/api/transfers", post(routes::transfers::create::<L, D>))
        .route("/api/products", get(routes::products::list::<L, D>))
        .route("/api/cart", get(routes::cart::get::<L, D>))
        .route("/api/cart/items", post(routes::cart::add_item::<L, D>))
        .route("/api/orders", post(routes::orders::create::<L, D>))
        .route("/api/reviews", post(routes::reviews::create::<L, D>))
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
