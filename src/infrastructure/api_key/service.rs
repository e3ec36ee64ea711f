//! API Key service
//!
//! Issuance, request validation, and owner-scoped management of developer
//! credentials.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::domain::access::{AuthError, InfrastructureError, Principal};
use crate::domain::api_key::{
    clamp_rate_limit_rpm, validate_label, ApiKey, ApiKeyId, ApiKeyRepository, OwnerId,
    DEFAULT_RATE_LIMIT_RPM,
};
use crate::domain::{AccessError, DomainError};
use crate::infrastructure::observability::{record_auth_failure, record_store_unavailable};

use super::generator::ApiKeyGenerator;

const STORE_NAME: &str = "key store";

/// Result of creating a new API key
#[derive(Debug)]
pub struct CreateApiKeyResult {
    /// The API key entity (without the secret)
    pub api_key: ApiKey,
    /// The full secret key (only returned once)
    pub secret: String,
}

/// Parameters for issuing a key
#[derive(Debug, Clone, Default)]
pub struct CreateApiKeyParams {
    pub label: String,
    pub expires_at: Option<DateTime<Utc>>,
    /// Overrides the default tier; clamped when used
    pub rate_limit_rpm: Option<u32>,
}

impl CreateApiKeyParams {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Default::default()
        }
    }

    pub fn with_expiration(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    pub fn with_rate_limit_rpm(mut self, rpm: u32) -> Self {
        self.rate_limit_rpm = Some(rpm);
        self
    }
}

#[derive(Debug, Clone)]
pub struct ApiKeyServiceConfig {
    pub default_rate_limit_rpm: u32,
    /// Cap on simultaneously active keys per owner; 0 disables the cap
    pub max_active_per_owner: usize,
    /// Upper bound on the authentication lookup
    pub store_timeout: Duration,
}

impl Default for ApiKeyServiceConfig {
    fn default() -> Self {
        Self {
            default_rate_limit_rpm: DEFAULT_RATE_LIMIT_RPM,
            max_active_per_owner: 10,
            store_timeout: Duration::from_millis(250),
        }
    }
}

/// API Key service for issuing, validating and managing keys
#[derive(Debug)]
pub struct ApiKeyService {
    repository: Arc<dyn ApiKeyRepository>,
    generator: ApiKeyGenerator,
    config: ApiKeyServiceConfig,
}

impl ApiKeyService {
    pub fn new(repository: Arc<dyn ApiKeyRepository>) -> Self {
        Self {
            repository,
            generator: ApiKeyGenerator::default(),
            config: ApiKeyServiceConfig::default(),
        }
    }

    /// Create with a custom generator
    pub fn with_generator(mut self, generator: ApiKeyGenerator) -> Self {
        self.generator = generator;
        self
    }

    pub fn with_config(mut self, config: ApiKeyServiceConfig) -> Self {
        self.config = config;
        self
    }

    pub fn generator(&self) -> &ApiKeyGenerator {
        &self.generator
    }

    /// Issue a new API key. The secret in the result is never stored.
    pub async fn create(
        &self,
        owner_id: &OwnerId,
        params: CreateApiKeyParams,
    ) -> Result<CreateApiKeyResult, DomainError> {
        let generated = self.generator.generate();
        self.issue(owner_id, params, generated).await
    }

    async fn issue(
        &self,
        owner_id: &OwnerId,
        params: CreateApiKeyParams,
        generated: super::generator::GeneratedApiKey,
    ) -> Result<CreateApiKeyResult, DomainError> {
        let label = params.label.trim().to_string();
        validate_label(&label).map_err(|e| DomainError::validation(e.to_string()))?;

        if let Some(expires_at) = params.expires_at {
            if expires_at <= Utc::now() {
                return Err(DomainError::validation("expires_at must be in the future"));
            }
        }

        // Soft cap: count and insert are separate statements, so concurrent
        // issues for one owner can overshoot by the number of racing requests.
        if self.config.max_active_per_owner > 0 {
            let active = self.repository.count_active_by_owner(owner_id).await?;
            if active >= self.config.max_active_per_owner {
                return Err(DomainError::conflict(format!(
                    "Owner already has the maximum of {} active API keys",
                    self.config.max_active_per_owner
                )));
            }
        }

        let rpm = params
            .rate_limit_rpm
            .unwrap_or(self.config.default_rate_limit_rpm);

        let mut api_key = ApiKey::new(
            ApiKeyId::generate(),
            owner_id.clone(),
            label,
            generated.hash,
            generated.display_prefix,
        )
        .with_rate_limit_rpm(clamp_rate_limit_rpm(rpm));

        if let Some(expires_at) = params.expires_at {
            api_key = api_key.with_expiration(expires_at);
        }

        let created = self.repository.create(api_key).await?;

        info!(
            key_id = %created.id(),
            owner_id = %owner_id,
            display_prefix = created.display_prefix(),
            "API key issued"
        );

        Ok(CreateApiKeyResult {
            api_key: created,
            secret: generated.key,
        })
    }

    /// Authenticate a presented credential
    pub async fn validate(&self, presented: &str) -> Result<Principal, AccessError> {
        self.validate_at(presented, Utc::now()).await
    }

    pub async fn validate_at(
        &self,
        presented: &str,
        now: DateTime<Utc>,
    ) -> Result<Principal, AccessError> {
        if !self.generator.is_well_formed(presented) {
            return Err(reject(AuthError::Malformed));
        }

        let key_hash = self.generator.hash_key(presented);

        let lookup = tokio::time::timeout(
            self.config.store_timeout,
            self.repository.get_by_hash(&key_hash),
        )
        .await;

        let api_key = match lookup {
            Ok(Ok(Some(key))) => key,
            Ok(Ok(None)) => return Err(reject(AuthError::Unknown)),
            Ok(Err(e)) => {
                warn!(error = %e, "API key lookup failed");
                record_store_unavailable(STORE_NAME);
                return Err(InfrastructureError::store_unavailable(STORE_NAME, e.to_string()).into());
            }
            Err(_) => {
                warn!(
                    timeout_ms = self.config.store_timeout.as_millis() as u64,
                    "API key lookup timed out"
                );
                record_store_unavailable(STORE_NAME);
                return Err(InfrastructureError::store_unavailable(STORE_NAME, "timed out").into());
            }
        };

        if !api_key.is_active() {
            return Err(reject(AuthError::Revoked));
        }

        if api_key.is_expired_at(now) {
            return Err(reject(AuthError::Expired));
        }

        Ok(Principal::from(&api_key))
    }

    /// Get a key belonging to `owner_id`
    pub async fn get(&self, owner_id: &OwnerId, id: &ApiKeyId) -> Result<ApiKey, DomainError> {
        match self.repository.get(id).await? {
            Some(key) if key.owner_id() == owner_id => Ok(key),
            _ => Err(DomainError::not_found(format!("API key '{}' not found", id))),
        }
    }

    /// List keys belonging to `owner_id`, newest first
    pub async fn list(&self, owner_id: &OwnerId) -> Result<Vec<ApiKey>, DomainError> {
        self.repository.list_by_owner(owner_id).await
    }

    /// Every known key, for batch jobs
    pub async fn list_all(&self) -> Result<Vec<ApiKey>, DomainError> {
        self.repository.list_all().await
    }

    pub async fn rename(
        &self,
        owner_id: &OwnerId,
        id: &ApiKeyId,
        label: &str,
    ) -> Result<ApiKey, DomainError> {
        validate_label(label).map_err(|e| DomainError::validation(e.to_string()))?;
        self.get(owner_id, id).await?;

        info!(key_id = %id, "Renaming API key");
        self.repository
            .rename(id, label)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("API key '{}' not found", id)))
    }

    /// Revoke a key. Revoking twice is a no-op.
    pub async fn revoke(&self, owner_id: &OwnerId, id: &ApiKeyId) -> Result<ApiKey, DomainError> {
        let key = self.get(owner_id, id).await?;

        if !key.is_active() {
            return Ok(key);
        }

        info!(key_id = %id, "Revoking API key");
        self.repository
            .revoke(id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("API key '{}' not found", id)))
    }

    pub async fn ping(&self) -> Result<(), DomainError> {
        self.repository.ping().await
    }
}

fn reject(reason: AuthError) -> AccessError {
    debug!(reason = reason.reason(), "API key rejected");
    record_auth_failure(reason.reason());
    reason.into()
}
