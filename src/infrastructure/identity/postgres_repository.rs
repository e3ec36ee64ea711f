//! PostgreSQL external identity repository implementation

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::domain::api_key::ApiKeyId;
use crate::domain::identity::{AnonId, ExternalIdentityMapping, ExternalIdentityRepository};
use crate::domain::DomainError;
use crate::infrastructure::storage::map_insert_error;

#[derive(Debug, Clone)]
pub struct PostgresExternalIdentityRepository {
    pool: PgPool,
}

impl PostgresExternalIdentityRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ExternalIdentityRepository for PostgresExternalIdentityRepository {
    async fn find(
        &self,
        key_id: &ApiKeyId,
        external_user_hash: &str,
    ) -> Result<Option<ExternalIdentityMapping>, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT key_id, external_user_hash, anon_id, created_at
            FROM external_identities
            WHERE key_id = $1 AND external_user_hash = $2
            "#,
        )
        .bind(key_id.as_uuid())
        .bind(external_user_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to find external identity: {}", e)))?;

        Ok(row.map(|row| {
            let key_id: Uuid = row.get("key_id");
            let anon_id: String = row.get("anon_id");
            ExternalIdentityMapping::restore(
                ApiKeyId::from(key_id),
                row.get("external_user_hash"),
                AnonId::from_stored(anon_id),
                row.get("created_at"),
            )
        }))
    }

    async fn create(
        &self,
        mapping: ExternalIdentityMapping,
    ) -> Result<ExternalIdentityMapping, DomainError> {
        let result = sqlx::query(
            r#"
            INSERT INTO external_identities (key_id, external_user_hash, anon_id, created_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (key_id, external_user_hash) DO NOTHING
            "#,
        )
        .bind(mapping.key_id().as_uuid())
        .bind(mapping.external_user_hash())
        .bind(mapping.anon_id().as_str())
        .bind(mapping.created_at())
        .execute(&self.pool)
        .await
        .map_err(|e| map_insert_error(e, "External identity mapping"))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::conflict(
                "External identity mapping already exists",
            ));
        }

        Ok(mapping)
    }
}
