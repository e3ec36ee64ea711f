//! In-memory API key repository implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::api_key::{ApiKey, ApiKeyId, ApiKeyRepository, OwnerId};
use crate::domain::DomainError;

/// In-memory implementation of ApiKeyRepository
#[derive(Debug, Default)]
pub struct InMemoryApiKeyRepository {
    keys: Arc<RwLock<HashMap<ApiKeyId, ApiKey>>>,
    hash_index: Arc<RwLock<HashMap<String, ApiKeyId>>>,
}

impl InMemoryApiKeyRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn newest_first(mut keys: Vec<ApiKey>) -> Vec<ApiKey> {
    keys.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
    keys
}

#[async_trait]
impl ApiKeyRepository for InMemoryApiKeyRepository {
    async fn get(&self, id: &ApiKeyId) -> Result<Option<ApiKey>, DomainError> {
        let keys = self.keys.read().await;
        Ok(keys.get(id).cloned())
    }

    async fn get_by_hash(&self, key_hash: &str) -> Result<Option<ApiKey>, DomainError> {
        let hash_index = self.hash_index.read().await;

        if let Some(key_id) = hash_index.get(key_hash) {
            let keys = self.keys.read().await;
            Ok(keys.get(key_id).cloned())
        } else {
            Ok(None)
        }
    }

    async fn create(&self, api_key: ApiKey) -> Result<ApiKey, DomainError> {
        let mut keys = self.keys.write().await;
        let mut hash_index = self.hash_index.write().await;

        if keys.contains_key(api_key.id()) {
            return Err(DomainError::conflict(format!(
                "API key with ID '{}' already exists",
                api_key.id()
            )));
        }

        if hash_index.contains_key(api_key.key_hash()) {
            return Err(DomainError::conflict("API key fingerprint already exists"));
        }

        hash_index.insert(api_key.key_hash().to_string(), *api_key.id());
        keys.insert(*api_key.id(), api_key.clone());

        Ok(api_key)
    }

    async fn rename(&self, id: &ApiKeyId, label: &str) -> Result<Option<ApiKey>, DomainError> {
        let mut keys = self.keys.write().await;

        match keys.get_mut(id) {
            Some(key) => {
                key.rename(label)
                    .map_err(|e| DomainError::validation(e.to_string()))?;
                Ok(Some(key.clone()))
            }
            None => Ok(None),
        }
    }

    async fn revoke(&self, id: &ApiKeyId) -> Result<Option<ApiKey>, DomainError> {
        let mut keys = self.keys.write().await;

        Ok(keys.get_mut(id).map(|key| {
            key.revoke();
            key.clone()
        }))
    }

    async fn list_by_owner(&self, owner_id: &OwnerId) -> Result<Vec<ApiKey>, DomainError> {
        let keys = self.keys.read().await;
        Ok(newest_first(
            keys.values()
                .filter(|k| k.owner_id() == owner_id)
                .cloned()
                .collect(),
        ))
    }

    async fn list_all(&self) -> Result<Vec<ApiKey>, DomainError> {
        let keys = self.keys.read().await;
        Ok(newest_first(keys.values().cloned().collect()))
    }

    async fn touch_last_used(&self, id: &ApiKeyId, at: DateTime<Utc>) -> Result<(), DomainError> {
        let mut keys = self.keys.write().await;

        if let Some(key) = keys.get_mut(id) {
            key.record_usage(at);
            Ok(())
        } else {
            Err(DomainError::not_found(format!("API key '{}' not found", id)))
        }
    }
}
