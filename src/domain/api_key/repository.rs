//! API Key repository trait

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt::Debug;

use super::entity::{ApiKey, ApiKeyId, OwnerId};
use crate::domain::DomainError;

/// Repository trait for the durable key store
///
/// Keys are never physically deleted, so there is no delete operation.
#[async_trait]
pub trait ApiKeyRepository: Send + Sync + Debug {
    /// Get an API key by its ID
    async fn get(&self, id: &ApiKeyId) -> Result<Option<ApiKey>, DomainError>;

    /// Get an API key by its fingerprint (the authentication lookup)
    async fn get_by_hash(&self, key_hash: &str) -> Result<Option<ApiKey>, DomainError>;

    /// Create a new API key. Fails with a conflict if the id or hash exists.
    async fn create(&self, api_key: ApiKey) -> Result<ApiKey, DomainError>;

    /// Set the label of a key, leaving every other column untouched.
    /// Returns the stored row after the change, or `None` if the key is unknown.
    async fn rename(&self, id: &ApiKeyId, label: &str) -> Result<Option<ApiKey>, DomainError>;

    /// Mark a key inactive. Only ever moves a key from active to revoked.
    /// Returns the stored row after the change, or `None` if the key is unknown.
    async fn revoke(&self, id: &ApiKeyId) -> Result<Option<ApiKey>, DomainError>;

    /// List keys belonging to an owner, newest first
    async fn list_by_owner(&self, owner_id: &OwnerId) -> Result<Vec<ApiKey>, DomainError>;

    /// List every known key regardless of status
    async fn list_all(&self) -> Result<Vec<ApiKey>, DomainError>;

    /// Count active keys belonging to an owner
    async fn count_active_by_owner(&self, owner_id: &OwnerId) -> Result<usize, DomainError> {
        Ok(self
            .list_by_owner(owner_id)
            .await?
            .iter()
            .filter(|k| k.is_active())
            .count())
    }

    /// Record the last time a key authenticated a request
    async fn touch_last_used(&self, id: &ApiKeyId, at: DateTime<Utc>) -> Result<(), DomainError>;

    /// Cheap connectivity probe
    async fn ping(&self) -> Result<(), DomainError> {
        Ok(())
    }
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::RwLock;

    /// Mock API key repository that can be switched into a failing state
    #[derive(Debug, Default)]
    pub struct MockApiKeyRepository {
        keys: Arc<RwLock<HashMap<ApiKeyId, ApiKey>>>,
        should_fail: Arc<RwLock<bool>>,
    }

    impl MockApiKeyRepository {
        pub fn new() -> Self {
            Self::default()
        }

        /// Set whether operations should fail
        pub async fn set_should_fail(&self, fail: bool) {
            *self.should_fail.write().await = fail;
        }

        async fn check_should_fail(&self) -> Result<(), DomainError> {
            if *self.should_fail.read().await {
                return Err(DomainError::storage("Mock repository configured to fail"));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl ApiKeyRepository for MockApiKeyRepository {
        async fn get(&self, id: &ApiKeyId) -> Result<Option<ApiKey>, DomainError> {
            self.check_should_fail().await?;
            Ok(self.keys.read().await.get(id).cloned())
        }

        async fn get_by_hash(&self, key_hash: &str) -> Result<Option<ApiKey>, DomainError> {
            self.check_should_fail().await?;
            let keys = self.keys.read().await;
            Ok(keys.values().find(|k| k.key_hash() == key_hash).cloned())
        }

        async fn create(&self, api_key: ApiKey) -> Result<ApiKey, DomainError> {
            self.check_should_fail().await?;
            let mut keys = self.keys.write().await;

            if keys.contains_key(api_key.id()) {
                return Err(DomainError::conflict(format!(
                    "API key with ID '{}' already exists",
                    api_key.id()
                )));
            }

            keys.insert(*api_key.id(), api_key.clone());
            Ok(api_key)
        }

        async fn rename(
            &self,
            id: &ApiKeyId,
            label: &str,
        ) -> Result<Option<ApiKey>, DomainError> {
            self.check_should_fail().await?;
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
            self.check_should_fail().await?;
            let mut keys = self.keys.write().await;

            Ok(keys.get_mut(id).map(|key| {
                key.revoke();
                key.clone()
            }))
        }

        async fn list_by_owner(&self, owner_id: &OwnerId) -> Result<Vec<ApiKey>, DomainError> {
            self.check_should_fail().await?;
            let keys = self.keys.read().await;
            Ok(keys
                .values()
                .filter(|k| k.owner_id() == owner_id)
                .cloned()
                .collect())
        }

        async fn list_all(&self) -> Result<Vec<ApiKey>, DomainError> {
            self.check_should_fail().await?;
            Ok(self.keys.read().await.values().cloned().collect())
        }

        async fn touch_last_used(
            &self,
            id: &ApiKeyId,
            at: DateTime<Utc>,
        ) -> Result<(), DomainError> {
            self.check_should_fail().await?;
            let mut keys = self.keys.write().await;

            match keys.get_mut(id) {
                Some(key) => {
                    key.record_usage(at);
                    Ok(())
                }
                None => Err(DomainError::not_found(format!("API key '{}' not found", id))),
            }
        }

        async fn ping(&self) -> Result<(), DomainError> {
            self.check_should_fail().await
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        fn create_test_key(owner: &str) -> ApiKey {
            ApiKey::new(
                ApiKeyId::generate(),
                OwnerId::new(owner).unwrap(),
                "Test Key",
                format!("sha256${}", uuid::Uuid::new_v4()),
                "dk_live_test0000",
            )
        }

        #[tokio::test]
        async fn test_count_active_default_impl() {
            let repo = MockApiKeyRepository::new();
            let owner = OwnerId::new("owner-1").unwrap();

            let mut revoked = create_test_key("owner-1");
            revoked.revoke();
            repo.create(revoked).await.unwrap();
            repo.create(create_test_key("owner-1")).await.unwrap();
            repo.create(create_test_key("owner-2")).await.unwrap();

            assert_eq!(repo.count_active_by_owner(&owner).await.unwrap(), 1);
        }

        #[tokio::test]
        async fn test_should_fail() {
            let repo = MockApiKeyRepository::new();
            repo.set_should_fail(true).await;

            let err = repo.get_by_hash("sha256$x").await.unwrap_err();
            assert!(matches!(err, DomainError::Storage { .. }));
        }
    }
}
