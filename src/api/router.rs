use axum::{middleware, routing::get, Router};
use tower_http::trace::TraceLayer;

use super::health;
use super::internal;
use super::middleware::{logging_middleware, metrics_middleware, security_headers_middleware};
use super::portal;
use super::state::AppState;
use super::v1;

/// Full HTTP surface with request logging, metrics, and tracing layers
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/ready", get(health::ready_check))
        .route("/live", get(health::live_check))
        .nest("/v1", v1::create_v1_router(state.clone()))
        .nest("/portal", portal::create_portal_router())
        .nest("/internal", internal::create_internal_router())
        .with_state(state)
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(middleware::from_fn(logging_middleware))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
}
