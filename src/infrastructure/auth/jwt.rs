//! Portal session tokens
//!
//! The application's own login issues HS256 tokens whose `sub` is the
//! developer (owner) id. This service only needs to check them; issuing is
//! kept for fixtures and local tooling.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

use crate::domain::api_key::OwnerId;
use crate::domain::DomainError;

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortalClaims {
    /// Subject (owner ID)
    pub sub: String,
    /// Issued at timestamp (Unix epoch)
    pub iat: i64,
    /// Expiration timestamp (Unix epoch)
    pub exp: i64,
}

/// HS256 portal token service
#[derive(Clone)]
pub struct PortalTokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl Debug for PortalTokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PortalTokenService")
            .field("encoding_key", &"[hidden]")
            .field("decoding_key", &"[hidden]")
            .finish()
    }
}

impl PortalTokenService {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Issue a token for `owner_id` valid for `ttl`
    pub fn issue(&self, owner_id: &OwnerId, ttl: Duration) -> Result<String, DomainError> {
        let now = Utc::now();
        let claims = PortalClaims {
            sub: owner_id.as_str().to_string(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| DomainError::internal(format!("Failed to generate JWT: {}", e)))
    }

    /// Validate a token and return the owner it belongs to
    pub fn validate(&self, token: &str) -> Result<OwnerId, DomainError> {
        let token_data = decode::<PortalClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| DomainError::validation(format!("Invalid JWT: {}", e)))?;

        OwnerId::new(token_data.claims.sub)
            .map_err(|e| DomainError::validation(format!("Invalid JWT subject: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_and_validate() {
        let service = PortalTokenService::new("portal-secret");
        let owner = OwnerId::new("dev-7").unwrap();

        let token = service.issue(&owner, Duration::hours(1)).unwrap();
        assert_eq!(service.validate(&token).unwrap(), owner);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let issuer = PortalTokenService::new("one");
        let checker = PortalTokenService::new("two");
        let token = issuer
            .issue(&OwnerId::new("dev-7").unwrap(), Duration::hours(1))
            .unwrap();

        assert!(checker.validate(&token).is_err());
    }

    #[test]
    fn test_expired_rejected() {
        let service = PortalTokenService::new("portal-secret");
        let token = service
            .issue(&OwnerId::new("dev-7").unwrap(), Duration::hours(-2))
            .unwrap();

        assert!(service.validate(&token).is_err());
    }

    #[test]
    fn test_garbage_rejected() {
        let service = PortalTokenService::new("portal-secret");
        assert!(service.validate("not.a.jwt").is_err());
    }
}
