//! Portal session authentication

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use tracing::{debug, warn};

use crate::api::state::AppState;
use crate::api::types::ApiError;
use crate::domain::OwnerId;

const UNAUTHORIZED: &str = "invalid or missing portal session";

/// Extractor for the owner behind a portal session JWT
#[derive(Debug, Clone)]
pub struct PortalOwner(pub OwnerId);

impl FromRequestParts<AppState> for PortalOwner {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(tokens) = state.portal_tokens.as_ref() else {
            warn!("Portal request rejected: portal.jwt_secret is not configured");
            return Err(ApiError::unauthorized(UNAUTHORIZED));
        };

        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ApiError::unauthorized(UNAUTHORIZED))?;

        tokens.validate(token).map(PortalOwner).map_err(|e| {
            debug!(error = %e, "Portal token rejected");
            ApiError::unauthorized(UNAUTHORIZED)
        })
    }
}
