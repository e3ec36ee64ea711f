use serde::Serialize;

use crate::domain::api_key::{ApiKey, ApiKeyId, OwnerId};

/// Authenticated caller of the developer API
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub key_id: ApiKeyId,
    pub owner_id: OwnerId,
    /// Effective (clamped) requests-per-minute budget
    pub rate_limit_rpm: u32,
}

impl From<&ApiKey> for Principal {
    fn from(key: &ApiKey) -> Self {
        Self {
            key_id: *key.id(),
            owner_id: key.owner_id().clone(),
            rate_limit_rpm: key.effective_rate_limit_rpm(),
        }
    }
}

/// Outcome of an admitted rate-limit check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub limit: u32,
    pub remaining: u32,
}
