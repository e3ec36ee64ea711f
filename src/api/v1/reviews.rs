//! Review submission on behalf of an integrator's end user

use axum::{extract::State, http::StatusCode};
use tracing::info;

use crate::api::middleware::ApiPrincipal;
use crate::api::state::AppState;
use crate::api::types::{ApiError, CreateReviewRequest, Json, ReviewResponse};
use crate::domain::Review;

/// POST /v1/reviews
///
/// The external user id is resolved to a stable anon id and never forwarded
/// or echoed. Fields are checked first so a rejected review leaves no mapping.
pub async fn create_review(
    State(state): State<AppState>,
    ApiPrincipal(principal): ApiPrincipal,
    Json(request): Json<CreateReviewRequest>,
) -> Result<(StatusCode, Json<ReviewResponse>), ApiError> {
    Review::validate_fields(
        &request.listing_id,
        request.rating,
        request.body.as_deref(),
    )?;

    let anon_id = state
        .identity_resolver
        .resolve(&principal.key_id, &request.external_user_id)
        .await?;

    let review = Review::new(
        principal.key_id,
        anon_id,
        request.listing_id,
        request.rating,
        request.body,
    )?;

    let response = ReviewResponse::new(review.id, &review.anon_id);
    state.review_sink.submit(review).await?;

    info!(
        key_id = %principal.key_id,
        review_id = %response.review_id,
        anon_id = %response.anon_id,
        "Review submitted"
    );

    Ok((StatusCode::CREATED, Json(response)))
}
