//! Operator endpoints guarded by static shared secrets

pub mod rollup;

use axum::{routing::post, Router};

use super::state::AppState;

pub fn create_internal_router() -> Router<AppState> {
    Router::new().route("/usage/rollup", post(rollup::trigger_rollup))
}
