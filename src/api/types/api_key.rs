//! Portal API key request and response types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{ApiKey, ApiKeyStatus};

/// Public view of a key. Never carries the secret or its fingerprint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiKeyResponse {
    pub id: String,
    pub label: String,
    pub display_prefix: String,
    pub status: ApiKeyStatus,
    pub rate_limit_rpm: u32,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_used_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl From<&ApiKey> for ApiKeyResponse {
    fn from(key: &ApiKey) -> Self {
        Self {
            id: key.id().to_string(),
            label: key.label().to_string(),
            display_prefix: key.display_prefix().to_string(),
            status: key.status(),
            rate_limit_rpm: key.effective_rate_limit_rpm(),
            created_at: key.created_at(),
            last_used_at: key.last_used_at(),
            expires_at: key.expires_at(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateApiKeyRequest {
    pub label: String,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

/// Issuance response; the only place the raw key ever appears
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateApiKeyResponse {
    #[serde(flatten)]
    pub api_key: ApiKeyResponse,
    pub key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RenameApiKeyRequest {
    pub label: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiKeysListResponse {
    pub data: Vec<ApiKeyResponse>,
}
