//! HTTP transport layer
//!
//! Parses requests, calls the ledger engine and formats responses. All
//! business invariants live below this layer.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    routing::{delete, get, post},
};
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::Depository;

pub mod handlers;
pub mod models;

/// Request timeout for all routes
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Build the application router
pub fn router(depository: Arc<Depository>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/tenants", post(handlers::provision_tenant))
        .route(
            "/api/companies",
            post(handlers::register_company).get(handlers::list_companies),
        )
        .route("/api/companies/:ticker", delete(handlers::delist_company))
        .route("/api/positions/credit", post(handlers::credit_position))
        .route("/api/positions/debit", post(handlers::debit_position))
        .route("/api/portfolio/:tenant_id", get(handlers::portfolio))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .layer(CorsLayer::permissive())
        .with_state(depository)
}
