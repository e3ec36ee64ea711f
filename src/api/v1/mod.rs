//! Developer API, authenticated by API key

pub mod me;
pub mod reviews;
pub mod usage;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use super::middleware::require_api_key;
use super::state::AppState;

/// Routes behind the API key access path
pub fn create_v1_router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/me", get(me::get_me))
        .route("/usage", get(usage::get_usage))
        .route("/reviews", post(reviews::create_review))
        .route_layer(middleware::from_fn_with_state(state, require_api_key))
}
