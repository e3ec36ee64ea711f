//! PostgreSQL daily usage repository implementation

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::domain::api_key::ApiKeyId;
use crate::domain::usage::{DailyUsageRecord, DailyUsageRepository};
use crate::domain::DomainError;

#[derive(Debug, Clone)]
pub struct PostgresDailyUsageRepository {
    pool: PgPool,
}

impl PostgresDailyUsageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DailyUsageRepository for PostgresDailyUsageRepository {
    async fn upsert(&self, record: &DailyUsageRecord) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO daily_usage (key_id, usage_date, request_count, error_count, updated_at)
            VALUES ($1, $2, $3, $4, NOW())
            ON CONFLICT (key_id, usage_date) DO UPDATE
            SET request_count = EXCLUDED.request_count,
                error_count = EXCLUDED.error_count,
                updated_at = NOW()
            "#,
        )
        .bind(record.key_id.as_uuid())
        .bind(record.date)
        .bind(record.request_count as i64)
        .bind(record.error_count as i64)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to upsert daily usage: {}", e)))?;

        Ok(())
    }

    async fn get(
        &self,
        key_id: &ApiKeyId,
        date: NaiveDate,
    ) -> Result<Option<DailyUsageRecord>, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT key_id, usage_date, request_count, error_count
            FROM daily_usage
            WHERE key_id = $1 AND usage_date = $2
            "#,
        )
        .bind(key_id.as_uuid())
        .bind(date)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to get daily usage: {}", e)))?;

        Ok(row.as_ref().map(row_to_record))
    }

    async fn list_range(
        &self,
        key_id: &ApiKeyId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<DailyUsageRecord>, DomainError> {
        let rows = sqlx::query(
            r#"
            SELECT key_id, usage_date, request_count, error_count
            FROM daily_usage
            WHERE key_id = $1 AND usage_date BETWEEN $2 AND $3
            ORDER BY usage_date
            "#,
        )
        .bind(key_id.as_uuid())
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to list daily usage: {}", e)))?;

        Ok(rows.iter().map(row_to_record).collect())
    }
}

fn row_to_record(row: &sqlx::postgres::PgRow) -> DailyUsageRecord {
    let key_id: Uuid = row.get("key_id");
    let request_count: i64 = row.get("request_count");
    let error_count: i64 = row.get("error_count");

    DailyUsageRecord {
        key_id: ApiKeyId::from(key_id),
        date: row.get("usage_date"),
        request_count: request_count.max(0) as u64,
        error_count: error_count.max(0) as u64,
    }
}
