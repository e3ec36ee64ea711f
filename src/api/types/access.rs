//! Developer API request and response types

use serde::{Deserialize, Serialize};

use crate::domain::{AnonId, Principal};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeResponse {
    pub key_id: String,
    pub owner_id: String,
    pub rate_limit_rpm: u32,
}

impl From<&Principal> for MeResponse {
    fn from(principal: &Principal) -> Self {
        Self {
            key_id: principal.key_id.to_string(),
            owner_id: principal.owner_id.as_str().to_string(),
            rate_limit_rpm: principal.rate_limit_rpm,
        }
    }
}

/// `?days=N` on usage endpoints
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UsageQuery {
    pub days: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateReviewRequest {
    /// The integrator's own user id; resolved to an anon id and dropped
    pub external_user_id: String,
    pub listing_id: String,
    pub rating: u8,
    #[serde(default)]
    pub body: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewResponse {
    pub review_id: String,
    pub anon_id: String,
}

impl ReviewResponse {
    pub fn new(review_id: uuid::Uuid, anon_id: &AnonId) -> Self {
        Self {
            review_id: review_id.to_string(),
            anon_id: anon_id.as_str().to_string(),
        }
    }
}
