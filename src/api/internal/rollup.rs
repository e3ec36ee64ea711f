//! Rollup trigger for an external scheduler

use axum::{
    extract::State,
    http::{header, HeaderMap},
};
use tracing::{info, warn};

use crate::api::state::AppState;
use crate::api::types::{ApiError, Json};
use crate::infrastructure::crypto::constant_time_eq;
use crate::infrastructure::usage::RollupReport;

const UNAUTHORIZED: &str = "invalid or missing rollup secret";

/// POST /internal/usage/rollup
pub async fn trigger_rollup(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<RollupReport>, ApiError> {
    authorize(state.rollup_secret.as_deref(), &headers)?;

    let report = state.rollup_job.run().await?;
    info!(
        keys_scanned = report.keys_scanned,
        records_written = report.records_written,
        failures = report.failures,
        "Rollup triggered over HTTP"
    );

    Ok(Json(report))
}

fn authorize(secret: Option<&str>, headers: &HeaderMap) -> Result<(), ApiError> {
    let Some(secret) = secret else {
        warn!("Rollup trigger rejected: rollup.secret is not configured");
        return Err(ApiError::unauthorized(UNAUTHORIZED));
    };

    let presented = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| ApiError::unauthorized(UNAUTHORIZED))?;

    if !constant_time_eq(presented.as_bytes(), secret.as_bytes()) {
        warn!("Rollup trigger rejected: secret mismatch");
        return Err(ApiError::unauthorized(UNAUTHORIZED));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderValue, StatusCode};

    fn bearer(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", value)).unwrap(),
        );
        headers
    }

    #[test]
    fn test_matching_secret_is_accepted() {
        assert!(authorize(Some("rollup-s3cret"), &bearer("rollup-s3cret")).is_ok());
    }

    #[test]
    fn test_mismatch_and_prefix_are_rejected() {
        let err = authorize(Some("rollup-s3cret"), &bearer("rollup-s3cre")).unwrap_err();
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);

        let err = authorize(Some("rollup-s3cret"), &bearer("rollup-s3cret-and-more")).unwrap_err();
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_missing_header_or_secret_is_rejected() {
        assert!(authorize(Some("rollup-s3cret"), &HeaderMap::new()).is_err());
        assert!(authorize(None, &bearer("anything")).is_err());
    }
}
