//! External identity resolver

use std::sync::Arc;

use tracing::{debug, info};

use crate::domain::api_key::ApiKeyId;
use crate::domain::identity::{
    validate_external_user_id, AnonId, ExternalIdentityMapping, ExternalIdentityRepository,
};
use crate::domain::DomainError;
use crate::infrastructure::crypto::SecretHasher;

/// Maps `(key_id, raw external user id)` to a stable anon id, creating the
/// mapping on first sight. The raw id is hashed before it reaches storage.
#[derive(Debug)]
pub struct ExternalIdentityResolver {
    repository: Arc<dyn ExternalIdentityRepository>,
    hasher: SecretHasher,
}

impl ExternalIdentityResolver {
    pub fn new(repository: Arc<dyn ExternalIdentityRepository>, hasher: SecretHasher) -> Self {
        Self { repository, hasher }
    }

    pub async fn resolve(
        &self,
        key_id: &ApiKeyId,
        raw_external_user_id: &str,
    ) -> Result<AnonId, DomainError> {
        validate_external_user_id(raw_external_user_id)
            .map_err(|e| DomainError::validation(e.to_string()))?;

        let hash = self.hasher.fingerprint(raw_external_user_id);

        if let Some(existing) = self.repository.find(key_id, &hash).await? {
            return Ok(existing.anon_id().clone());
        }

        let mapping = ExternalIdentityMapping::new(*key_id, hash.clone(), AnonId::generate());

        match self.repository.create(mapping).await {
            Ok(created) => {
                info!(key_id = %key_id, anon_id = %created.anon_id(), "External identity mapped");
                Ok(created.anon_id().clone())
            }
            Err(DomainError::Conflict { .. }) => {
                debug!(key_id = %key_id, "Lost identity creation race, re-reading");
                self.repository
                    .find(key_id, &hash)
                    .await?
                    .map(|winner| winner.anon_id().clone())
                    .ok_or_else(|| {
                        DomainError::internal("Identity mapping missing after uniqueness conflict")
                    })
            }
            Err(e) => Err(e),
        }
    }
}
