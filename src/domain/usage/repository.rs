//! Durable usage repository trait

use std::fmt::Debug;

use async_trait::async_trait;
use chrono::NaiveDate;

use super::record::DailyUsageRecord;
use crate::domain::api_key::ApiKeyId;
use crate::domain::DomainError;

/// Store of daily aggregates, unique on `(key_id, date)`
#[async_trait]
pub trait DailyUsageRepository: Send + Sync + Debug {
    /// Insert or overwrite the record for `(key_id, date)`. Never increments.
    async fn upsert(&self, record: &DailyUsageRecord) -> Result<(), DomainError>;

    /// Get the record for one day
    async fn get(
        &self,
        key_id: &ApiKeyId,
        date: NaiveDate,
    ) -> Result<Option<DailyUsageRecord>, DomainError>;

    /// Records with `from <= date <= to`, oldest first
    async fn list_range(
        &self,
        key_id: &ApiKeyId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<DailyUsageRecord>, DomainError>;
}
