//! In-memory external identity repository

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::api_key::ApiKeyId;
use crate::domain::identity::{ExternalIdentityMapping, ExternalIdentityRepository};
use crate::domain::DomainError;

#[derive(Debug, Default)]
pub struct InMemoryExternalIdentityRepository {
    mappings: Arc<RwLock<HashMap<(ApiKeyId, String), ExternalIdentityMapping>>>,
}

impl InMemoryExternalIdentityRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every stored mapping
    pub async fn all(&self) -> Vec<ExternalIdentityMapping> {
        self.mappings.read().await.values().cloned().collect()
    }
}

#[async_trait]
impl ExternalIdentityRepository for InMemoryExternalIdentityRepository {
    async fn find(
        &self,
        key_id: &ApiKeyId,
        external_user_hash: &str,
    ) -> Result<Option<ExternalIdentityMapping>, DomainError> {
        let mappings = self.mappings.read().await;
        Ok(mappings
            .get(&(*key_id, external_user_hash.to_string()))
            .cloned())
    }

    async fn create(
        &self,
        mapping: ExternalIdentityMapping,
    ) -> Result<ExternalIdentityMapping, DomainError> {
        let mut mappings = self.mappings.write().await;
        let key = (*mapping.key_id(), mapping.external_user_hash().to_string());

        if mappings.contains_key(&key) {
            return Err(DomainError::conflict("External identity mapping already exists"));
        }

        mappings.insert(key, mapping.clone());
        Ok(mapping)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::identity::AnonId;

    #[tokio::test]
    async fn test_create_is_immutable() {
        let repo = InMemoryExternalIdentityRepository::new();
        let key = ApiKeyId::generate();
        let original = AnonId::generate();

        repo.create(ExternalIdentityMapping::new(key, "h1", original.clone()))
            .await
            .unwrap();

        let second = repo
            .create(ExternalIdentityMapping::new(key, "h1", AnonId::generate()))
            .await;
        assert!(matches!(second, Err(DomainError::Conflict { .. })));

        let found = repo.find(&key, "h1").await.unwrap().unwrap();
        assert_eq!(found.anon_id(), &original);
    }
}
