use crate::api::middleware::ApiPrincipal;
use crate::api::types::{Json, MeResponse};

/// GET /v1/me
pub async fn get_me(ApiPrincipal(principal): ApiPrincipal) -> Json<MeResponse> {
    Json(MeResponse::from(&principal))
}
