//! API Key entity and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::validation::{validate_label, validate_owner_id, ApiKeyValidationError};

/// Lowest requests-per-minute budget a key can effectively have
pub const MIN_RATE_LIMIT_RPM: u32 = 1;

/// Highest requests-per-minute budget a key can effectively have
pub const MAX_RATE_LIMIT_RPM: u32 = 1000;

/// Default requests-per-minute budget for newly issued keys
pub const DEFAULT_RATE_LIMIT_RPM: u32 = 60;

/// Clamp a configured requests-per-minute value into the enforceable range
pub fn clamp_rate_limit_rpm(rpm: u32) -> u32 {
    rpm.clamp(MIN_RATE_LIMIT_RPM, MAX_RATE_LIMIT_RPM)
}

/// API Key identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApiKeyId(Uuid);

impl ApiKeyId {
    /// Generate a fresh identifier
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse an identifier from its string form
    pub fn parse(value: &str) -> Result<Self, ApiKeyValidationError> {
        Uuid::parse_str(value.trim())
            .map(Self)
            .map_err(|_| ApiKeyValidationError::InvalidId(value.to_string()))
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl From<Uuid> for ApiKeyId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for ApiKeyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of the application user that owns a key
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OwnerId(String);

impl OwnerId {
    pub fn new(id: impl Into<String>) -> Result<Self, ApiKeyValidationError> {
        let id = id.into();
        validate_owner_id(&id)?;
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for OwnerId {
    type Error = ApiKeyValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<OwnerId> for String {
    fn from(id: OwnerId) -> Self {
        id.0
    }
}

impl std::fmt::Display for OwnerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stored lifecycle state of a key. Expiry is not a state; it is evaluated
/// from `expires_at` at validation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiKeyStatus {
    Active,
    Revoked,
}

/// API Key entity
///
/// Only the fingerprint of the secret is ever held here. The raw value exists
/// solely in the response of the issuing call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiKey {
    id: ApiKeyId,
    owner_id: OwnerId,
    label: String,
    /// Fingerprint produced by the secret hasher (e.g. "sha256$...")
    key_hash: String,
    /// Non-secret slice shown to humans, never used for authentication
    display_prefix: String,
    is_active: bool,
    rate_limit_rpm: u32,
    created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_used_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    expires_at: Option<DateTime<Utc>>,
}

impl ApiKey {
    /// Create a new, active API key
    pub fn new(
        id: ApiKeyId,
        owner_id: OwnerId,
        label: impl Into<String>,
        key_hash: impl Into<String>,
        display_prefix: impl Into<String>,
    ) -> Self {
        Self {
            id,
            owner_id,
            label: label.into(),
            key_hash: key_hash.into(),
            display_prefix: display_prefix.into(),
            is_active: true,
            rate_limit_rpm: DEFAULT_RATE_LIMIT_RPM,
            created_at: Utc::now(),
            last_used_at: None,
            expires_at: None,
        }
    }

    /// Rebuild a key from its persisted columns
    #[allow(clippy::too_many_arguments)]
    pub fn restore(
        id: ApiKeyId,
        owner_id: OwnerId,
        label: String,
        key_hash: String,
        display_prefix: String,
        is_active: bool,
        rate_limit_rpm: u32,
        created_at: DateTime<Utc>,
        last_used_at: Option<DateTime<Utc>>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id,
            owner_id,
            label,
            key_hash,
            display_prefix,
            is_active,
            rate_limit_rpm,
            created_at,
            last_used_at,
            expires_at,
        }
    }

    /// Set the rate tier
    pub fn with_rate_limit_rpm(mut self, rpm: u32) -> Self {
        self.rate_limit_rpm = rpm;
        self
    }

    /// Set expiration
    pub fn with_expiration(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    // Getters

    pub fn id(&self) -> &ApiKeyId {
        &self.id
    }

    pub fn owner_id(&self) -> &OwnerId {
        &self.owner_id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn key_hash(&self) -> &str {
        &self.key_hash
    }

    pub fn display_prefix(&self) -> &str {
        &self.display_prefix
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn status(&self) -> ApiKeyStatus {
        if self.is_active {
            ApiKeyStatus::Active
        } else {
            ApiKeyStatus::Revoked
        }
    }

    /// Configured tier as stored
    pub fn rate_limit_rpm(&self) -> u32 {
        self.rate_limit_rpm
    }

    /// Tier actually enforced
    pub fn effective_rate_limit_rpm(&self) -> u32 {
        clamp_rate_limit_rpm(self.rate_limit_rpm)
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn last_used_at(&self) -> Option<DateTime<Utc>> {
        self.last_used_at
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    /// Check if the key has expired at the given instant
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| now >= expires_at)
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    // Mutators

    /// Change the human label
    pub fn rename(&mut self, label: impl Into<String>) -> Result<(), ApiKeyValidationError> {
        let label = label.into();
        validate_label(&label)?;
        self.label = label.trim().to_string();
        Ok(())
    }

    /// Revoke the key. There is no way back to active.
    pub fn revoke(&mut self) {
        self.is_active = false;
    }

    /// Record key usage
    pub fn record_usage(&mut self, at: DateTime<Utc>) {
        self.last_used_at = Some(at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn create_test_api_key(label: &str) -> ApiKey {
        let owner = OwnerId::new("user-1").unwrap();
        ApiKey::new(ApiKeyId::generate(), owner, label, "sha256$hash", "dk_live_abcdefgh")
    }

    #[test]
    fn test_api_key_id_parse() {
        let id = ApiKeyId::generate();
        let parsed = ApiKeyId::parse(&id.to_string()).unwrap();
        assert_eq!(id, parsed);
        assert!(ApiKeyId::parse("not-a-uuid").is_err());
    }

    #[test]
    fn test_owner_id_invalid() {
        assert!(OwnerId::new("").is_err());
        assert!(OwnerId::new("a".repeat(200)).is_err());
    }

    #[test]
    fn test_api_key_creation() {
        let key = create_test_api_key("Prod Integration");

        assert_eq!(key.label(), "Prod Integration");
        assert_eq!(key.status(), ApiKeyStatus::Active);
        assert_eq!(key.rate_limit_rpm(), DEFAULT_RATE_LIMIT_RPM);
        assert!(key.last_used_at().is_none());
        assert!(!key.is_expired());
    }

    #[test]
    fn test_rate_limit_clamped() {
        assert_eq!(clamp_rate_limit_rpm(0), 1);
        assert_eq!(clamp_rate_limit_rpm(60), 60);
        assert_eq!(clamp_rate_limit_rpm(50_000), 1000);

        let key = create_test_api_key("k").with_rate_limit_rpm(0);
        assert_eq!(key.rate_limit_rpm(), 0);
        assert_eq!(key.effective_rate_limit_rpm(), 1);
    }

    #[test]
    fn test_api_key_expiration() {
        let now = Utc::now();
        let key = create_test_api_key("k").with_expiration(now + Duration::hours(1));

        assert!(!key.is_expired_at(now));
        assert!(key.is_expired_at(now + Duration::hours(1)));
        assert!(key.is_expired_at(now + Duration::hours(2)));
    }

    #[test]
    fn test_revoke_is_one_way() {
        let mut key = create_test_api_key("k");
        key.revoke();
        assert_eq!(key.status(), ApiKeyStatus::Revoked);

        key.revoke();
        assert!(!key.is_active());
    }

    #[test]
    fn test_rename() {
        let mut key = create_test_api_key("old");
        key.rename("  New Label ").unwrap();
        assert_eq!(key.label(), "New Label");

        assert!(key.rename("   ").is_err());
        assert_eq!(key.label(), "New Label");
    }

    #[test]
    fn test_serialization_never_contains_raw_secret_field() {
        let key = create_test_api_key("k");
        let json = serde_json::to_value(&key).unwrap();
        assert!(json.get("secret").is_none());
        assert_eq!(json["key_hash"], "sha256$hash");
    }
}
