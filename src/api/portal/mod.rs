//! Developer portal endpoints, authenticated by portal session JWT

pub mod api_keys;

use axum::{
    routing::{get, post},
    Router,
};

use super::state::AppState;

pub fn create_portal_router() -> Router<AppState> {
    Router::new()
        .route(
            "/api-keys",
            get(api_keys::list_api_keys).post(api_keys::create_api_key),
        )
        .route(
            "/api-keys/{key_id}",
            get(api_keys::get_api_key).patch(api_keys::rename_api_key),
        )
        .route("/api-keys/{key_id}/revoke", post(api_keys::revoke_api_key))
        .route("/api-keys/{key_id}/usage", get(api_keys::get_api_key_usage))
}
