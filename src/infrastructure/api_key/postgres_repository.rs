//! PostgreSQL API key repository implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::domain::api_key::{ApiKey, ApiKeyId, ApiKeyRepository, OwnerId};
use crate::domain::DomainError;
use crate::infrastructure::storage::{map_insert_error, ping_pool};

const SELECT_COLUMNS: &str = "id, owner_id, label, key_hash, display_prefix, is_active, \
     rate_limit_rpm, created_at, last_used_at, expires_at";

/// PostgreSQL implementation of ApiKeyRepository
#[derive(Debug, Clone)]
pub struct PostgresApiKeyRepository {
    pool: PgPool,
}

impl PostgresApiKeyRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ApiKeyRepository for PostgresApiKeyRepository {
    async fn get(&self, id: &ApiKeyId) -> Result<Option<ApiKey>, DomainError> {
        let row = sqlx::query(&format!("SELECT {} FROM api_keys WHERE id = $1", SELECT_COLUMNS))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to get API key: {}", e)))?;

        row.as_ref().map(row_to_api_key).transpose()
    }

    async fn get_by_hash(&self, key_hash: &str) -> Result<Option<ApiKey>, DomainError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM api_keys WHERE key_hash = $1",
            SELECT_COLUMNS
        ))
        .bind(key_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to look up API key: {}", e)))?;

        row.as_ref().map(row_to_api_key).transpose()
    }

    async fn create(&self, api_key: ApiKey) -> Result<ApiKey, DomainError> {
        sqlx::query(
            r#"
            INSERT INTO api_keys (id, owner_id, label, key_hash, display_prefix, is_active,
                                  rate_limit_rpm, created_at, last_used_at, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(api_key.id().as_uuid())
        .bind(api_key.owner_id().as_str())
        .bind(api_key.label())
        .bind(api_key.key_hash())
        .bind(api_key.display_prefix())
        .bind(api_key.is_active())
        .bind(api_key.rate_limit_rpm() as i32)
        .bind(api_key.created_at())
        .bind(api_key.last_used_at())
        .bind(api_key.expires_at())
        .execute(&self.pool)
        .await
        .map_err(|e| map_insert_error(e, "API key"))?;

        Ok(api_key)
    }

    async fn rename(&self, id: &ApiKeyId, label: &str) -> Result<Option<ApiKey>, DomainError> {
        let row = sqlx::query(&format!(
            "UPDATE api_keys SET label = $2 WHERE id = $1 RETURNING {}",
            SELECT_COLUMNS
        ))
        .bind(id.as_uuid())
        .bind(label.trim())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to rename API key: {}", e)))?;

        row.as_ref().map(row_to_api_key).transpose()
    }

    async fn revoke(&self, id: &ApiKeyId) -> Result<Option<ApiKey>, DomainError> {
        let row = sqlx::query(&format!(
            "UPDATE api_keys SET is_active = FALSE WHERE id = $1 RETURNING {}",
            SELECT_COLUMNS
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to revoke API key: {}", e)))?;

        row.as_ref().map(row_to_api_key).transpose()
    }

    async fn list_by_owner(&self, owner_id: &OwnerId) -> Result<Vec<ApiKey>, DomainError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM api_keys WHERE owner_id = $1 ORDER BY created_at DESC",
            SELECT_COLUMNS
        ))
        .bind(owner_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to list API keys: {}", e)))?;

        rows.iter().map(row_to_api_key).collect()
    }

    async fn list_all(&self) -> Result<Vec<ApiKey>, DomainError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM api_keys ORDER BY created_at DESC",
            SELECT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to list API keys: {}", e)))?;

        rows.iter().map(row_to_api_key).collect()
    }

    async fn count_active_by_owner(&self, owner_id: &OwnerId) -> Result<usize, DomainError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM api_keys WHERE owner_id = $1 AND is_active",
        )
        .bind(owner_id.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to count API keys: {}", e)))?;

        Ok(count as usize)
    }

    async fn touch_last_used(&self, id: &ApiKeyId, at: DateTime<Utc>) -> Result<(), DomainError> {
        // Never move the timestamp backwards when updates race
        sqlx::query(
            r#"
            UPDATE api_keys
            SET last_used_at = $2
            WHERE id = $1 AND (last_used_at IS NULL OR last_used_at < $2)
            "#,
        )
        .bind(id.as_uuid())
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to record API key usage: {}", e)))?;

        Ok(())
    }

    async fn ping(&self) -> Result<(), DomainError> {
        ping_pool(&self.pool).await
    }
}

fn row_to_api_key(row: &sqlx::postgres::PgRow) -> Result<ApiKey, DomainError> {
    let id: Uuid = row.get("id");
    let owner_id: String = row.get("owner_id");
    let rate_limit_rpm: i32 = row.get("rate_limit_rpm");

    let owner_id = OwnerId::new(owner_id)
        .map_err(|e| DomainError::storage(format!("Invalid owner ID in database: {}", e)))?;

    Ok(ApiKey::restore(
        ApiKeyId::from(id),
        owner_id,
        row.get("label"),
        row.get("key_hash"),
        row.get("display_prefix"),
        row.get("is_active"),
        rate_limit_rpm.max(0) as u32,
        row.get("created_at"),
        row.get("last_used_at"),
        row.get("expires_at"),
    ))
}
