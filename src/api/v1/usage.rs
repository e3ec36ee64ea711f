//! Self-service usage for the calling key

use axum::extract::State;
use tracing::debug;

use crate::api::middleware::ApiPrincipal;
use crate::api::state::AppState;
use crate::api::types::{ApiError, Json, Query, UsageQuery};
use crate::domain::UsageSummary;

/// GET /v1/usage?days=N
pub async fn get_usage(
    State(state): State<AppState>,
    ApiPrincipal(principal): ApiPrincipal,
    Query(query): Query<UsageQuery>,
) -> Result<Json<UsageSummary>, ApiError> {
    let days = query.days.unwrap_or(state.default_history_days);
    debug!(key_id = %principal.key_id, days, "Usage summary requested by key");

    let summary = state
        .usage_reporter
        .summary(&principal.key_id, days)
        .await?;

    Ok(Json(summary))
}
