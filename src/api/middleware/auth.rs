//! API key access path
//!
//! Every `/v1` request runs: extract credential → validate → rate limit →
//! handler → rate-limit headers → usage dispatch. Rejections never reach the
//! handler and are not metered.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use tracing::debug;

use crate::api::state::AppState;
use crate::api::types::{ApiError, UNAUTHORIZED_MESSAGE};
use crate::domain::access::RateLimitDecision;
use crate::domain::{AccessError, AuthError, Principal};
use crate::infrastructure::observability::record_auth_failure;

pub const API_KEY_HEADER: &str = "x-api-key";

const RATE_LIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
const RATE_LIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");

/// Pull the presented credential out of the request headers.
///
/// `Authorization: Bearer` wins over `X-API-Key`. Nothing here touches
/// storage.
pub fn extract_credential(headers: &HeaderMap) -> Result<String, AuthError> {
    let mut presented = false;

    if let Some(value) = headers.get(header::AUTHORIZATION) {
        presented = true;
        let value = value.to_str().map_err(|_| AuthError::Malformed)?;

        if let Some(token) = value.strip_prefix("Bearer ") {
            return non_empty(token);
        }
    }

    if let Some(value) = headers.get(API_KEY_HEADER) {
        let value = value.to_str().map_err(|_| AuthError::Malformed)?;
        return non_empty(value);
    }

    if presented {
        Err(AuthError::Malformed)
    } else {
        Err(AuthError::Missing)
    }
}

fn non_empty(value: &str) -> Result<String, AuthError> {
    let value = value.trim();

    if value.is_empty() {
        return Err(AuthError::Malformed);
    }

    Ok(value.to_string())
}

async fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<Principal, AccessError> {
    let credential = extract_credential(headers).inspect_err(|e| {
        debug!(reason = e.reason(), "Rejected request credential");
        record_auth_failure(e.reason());
    })?;

    state.api_key_service.validate(&credential).await
}

/// Middleware guarding the developer API
pub async fn require_api_key(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let principal = authenticate(&state, request.headers()).await?;

    let decision = state
        .rate_limiter
        .check(&principal.key_id, principal.rate_limit_rpm)
        .await?;

    let key_id = principal.key_id;
    request.extensions_mut().insert(principal);

    let mut response = next.run(request).await;
    apply_rate_limit_headers(response.headers_mut(), decision);
    response.extensions_mut().insert(key_id);

    state
        .usage_counter
        .dispatch(key_id, response.status().as_u16());

    Ok(response)
}

fn apply_rate_limit_headers(headers: &mut HeaderMap, decision: RateLimitDecision) {
    headers.insert(
        RATE_LIMIT_LIMIT,
        HeaderValue::from(decision.limit),
    );
    headers.insert(
        RATE_LIMIT_REMAINING,
        HeaderValue::from(decision.remaining),
    );
}

/// Principal admitted by [`require_api_key`]
#[derive(Debug, Clone)]
pub struct ApiPrincipal(pub Principal);

impl<S> FromRequestParts<S> for ApiPrincipal
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .cloned()
            .map(ApiPrincipal)
            .ok_or_else(|| ApiError::unauthorized(UNAUTHORIZED_MESSAGE))
    }
}
