//! External identity repository trait

use std::fmt::Debug;

use async_trait::async_trait;

use super::entity::ExternalIdentityMapping;
use crate::domain::api_key::ApiKeyId;
use crate::domain::DomainError;

/// Store of identity mappings, unique on `(key_id, external_user_hash)`
#[async_trait]
pub trait ExternalIdentityRepository: Send + Sync + Debug {
    async fn find(
        &self,
        key_id: &ApiKeyId,
        external_user_hash: &str,
    ) -> Result<Option<ExternalIdentityMapping>, DomainError>;

    /// Insert a new mapping. Returns `DomainError::Conflict` when a mapping for
    /// the same pair already exists; the existing row is left untouched.
    async fn create(
        &self,
        mapping: ExternalIdentityMapping,
    ) -> Result<ExternalIdentityMapping, DomainError>;
}
