//! External identity mapping entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::api_key::ApiKeyId;

/// Maximum accepted length of a raw external user identifier
pub const MAX_EXTERNAL_USER_ID_LENGTH: usize = 256;

const ANON_ID_PREFIX: &str = "anon_";

#[derive(Debug, Error, Clone, PartialEq)]
pub enum IdentityValidationError {
    #[error("External user ID cannot be empty")]
    EmptyExternalId,

    #[error("External user ID exceeds maximum length of {0} characters")]
    ExternalIdTooLong(usize),
}

/// Validate a raw, integrator-supplied user identifier
pub fn validate_external_user_id(raw: &str) -> Result<(), IdentityValidationError> {
    if raw.trim().is_empty() {
        return Err(IdentityValidationError::EmptyExternalId);
    }

    if raw.chars().count() > MAX_EXTERNAL_USER_ID_LENGTH {
        return Err(IdentityValidationError::ExternalIdTooLong(
            MAX_EXTERNAL_USER_ID_LENGTH,
        ));
    }

    Ok(())
}

/// Opaque pseudonymous identifier minted by the service
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnonId(String);

impl AnonId {
    pub fn generate() -> Self {
        Self(format!("{}{}", ANON_ID_PREFIX, Uuid::new_v4().simple()))
    }

    /// Wrap a value read back from storage
    pub fn from_stored(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AnonId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// `(key_id, external_user_hash) -> anon_id`, immutable once created
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalIdentityMapping {
    key_id: ApiKeyId,
    external_user_hash: String,
    anon_id: AnonId,
    created_at: DateTime<Utc>,
}

impl ExternalIdentityMapping {
    pub fn new(key_id: ApiKeyId, external_user_hash: impl Into<String>, anon_id: AnonId) -> Self {
        Self {
            key_id,
            external_user_hash: external_user_hash.into(),
            anon_id,
            created_at: Utc::now(),
        }
    }

    pub fn restore(
        key_id: ApiKeyId,
        external_user_hash: String,
        anon_id: AnonId,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            key_id,
            external_user_hash,
            anon_id,
            created_at,
        }
    }

    pub fn key_id(&self) -> &ApiKeyId {
        &self.key_id
    }

    pub fn external_user_hash(&self) -> &str {
        &self.external_user_hash
    }

    pub fn anon_id(&self) -> &AnonId {
        &self.anon_id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anon_id_format() {
        let id = AnonId::generate();
        assert!(id.as_str().starts_with("anon_"));
        assert_eq!(id.as_str().len(), 5 + 32);
        assert_ne!(id, AnonId::generate());
    }

    #[test]
    fn test_validate_external_user_id() {
        assert!(validate_external_user_id("user-42").is_ok());
        assert_eq!(
            validate_external_user_id("   "),
            Err(IdentityValidationError::EmptyExternalId)
        );

        let long = "x".repeat(MAX_EXTERNAL_USER_ID_LENGTH + 1);
        assert_eq!(
            validate_external_user_id(&long),
            Err(IdentityValidationError::ExternalIdTooLong(
                MAX_EXTERNAL_USER_ID_LENGTH
            ))
        );
    }
}
