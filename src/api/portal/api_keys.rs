//! Owner-scoped API key management

use axum::{
    extract::{Path, State},
    http::StatusCode,
};
use tracing::{debug, info};

use crate::api::middleware::PortalOwner;
use crate::api::state::AppState;
use crate::api::types::{
    ApiError, ApiKeyResponse, ApiKeysListResponse, CreateApiKeyRequest, CreateApiKeyResponse,
    Json, Query, RenameApiKeyRequest, UsageQuery,
};
use crate::domain::{ApiKeyId, UsageSummary};
use crate::infrastructure::api_key::CreateApiKeyParams;

fn parse_key_id(raw: &str) -> Result<ApiKeyId, ApiError> {
    ApiKeyId::parse(raw).map_err(|_| ApiError::not_found(format!("API key '{}' not found", raw)))
}

/// GET /portal/api-keys
pub async fn list_api_keys(
    State(state): State<AppState>,
    PortalOwner(owner): PortalOwner,
) -> Result<Json<ApiKeysListResponse>, ApiError> {
    let keys = state.api_key_service.list(&owner).await?;

    Ok(Json(ApiKeysListResponse {
        data: keys.iter().map(ApiKeyResponse::from).collect(),
    }))
}

/// POST /portal/api-keys
pub async fn create_api_key(
    State(state): State<AppState>,
    PortalOwner(owner): PortalOwner,
    Json(request): Json<CreateApiKeyRequest>,
) -> Result<(StatusCode, Json<CreateApiKeyResponse>), ApiError> {
    let mut params = CreateApiKeyParams::new(request.label);
    if let Some(expires_at) = request.expires_at {
        params = params.with_expiration(expires_at);
    }

    let created = state.api_key_service.create(&owner, params).await?;

    info!(
        owner_id = %owner.as_str(),
        key_id = %created.api_key.id(),
        "API key issued from portal"
    );

    Ok((
        StatusCode::CREATED,
        Json(CreateApiKeyResponse {
            api_key: ApiKeyResponse::from(&created.api_key),
            key: created.secret,
        }),
    ))
}

/// GET /portal/api-keys/{key_id}
pub async fn get_api_key(
    State(state): State<AppState>,
    PortalOwner(owner): PortalOwner,
    Path(key_id): Path<String>,
) -> Result<Json<ApiKeyResponse>, ApiError> {
    let id = parse_key_id(&key_id)?;
    let key = state.api_key_service.get(&owner, &id).await?;

    Ok(Json(ApiKeyResponse::from(&key)))
}

/// PATCH /portal/api-keys/{key_id}
pub async fn rename_api_key(
    State(state): State<AppState>,
    PortalOwner(owner): PortalOwner,
    Path(key_id): Path<String>,
    Json(request): Json<RenameApiKeyRequest>,
) -> Result<Json<ApiKeyResponse>, ApiError> {
    let id = parse_key_id(&key_id)?;
    debug!(key_id = %id, "Renaming API key");

    let key = state
        .api_key_service
        .rename(&owner, &id, &request.label)
        .await?;

    Ok(Json(ApiKeyResponse::from(&key)))
}

/// POST /portal/api-keys/{key_id}/revoke
pub async fn revoke_api_key(
    State(state): State<AppState>,
    PortalOwner(owner): PortalOwner,
    Path(key_id): Path<String>,
) -> Result<Json<ApiKeyResponse>, ApiError> {
    let id = parse_key_id(&key_id)?;
    let key = state.api_key_service.revoke(&owner, &id).await?;

    Ok(Json(ApiKeyResponse::from(&key)))
}

/// GET /portal/api-keys/{key_id}/usage?days=N
pub async fn get_api_key_usage(
    State(state): State<AppState>,
    PortalOwner(owner): PortalOwner,
    Path(key_id): Path<String>,
    Query(query): Query<UsageQuery>,
) -> Result<Json<UsageSummary>, ApiError> {
    let id = parse_key_id(&key_id)?;

    // ownership check before touching counters
    state.api_key_service.get(&owner, &id).await?;

    let days = query.days.unwrap_or(state.default_history_days);
    let summary = state.usage_reporter.summary(&id, days).await?;

    Ok(Json(summary))
}
