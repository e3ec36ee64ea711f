//! In-memory daily usage repository

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::RwLock;

use crate::domain::api_key::ApiKeyId;
use crate::domain::usage::{DailyUsageRecord, DailyUsageRepository};
use crate::domain::DomainError;

#[derive(Debug, Default)]
pub struct InMemoryDailyUsageRepository {
    records: Arc<RwLock<HashMap<(ApiKeyId, NaiveDate), DailyUsageRecord>>>,
}

impl InMemoryDailyUsageRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DailyUsageRepository for InMemoryDailyUsageRepository {
    async fn upsert(&self, record: &DailyUsageRecord) -> Result<(), DomainError> {
        let mut records = self.records.write().await;
        records.insert((record.key_id, record.date), record.clone());
        Ok(())
    }

    async fn get(
        &self,
        key_id: &ApiKeyId,
        date: NaiveDate,
    ) -> Result<Option<DailyUsageRecord>, DomainError> {
        let records = self.records.read().await;
        Ok(records.get(&(*key_id, date)).cloned())
    }

    async fn list_range(
        &self,
        key_id: &ApiKeyId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<DailyUsageRecord>, DomainError> {
        let records = self.records.read().await;
        let mut found: Vec<DailyUsageRecord> = records
            .values()
            .filter(|r| &r.key_id == key_id && r.date >= from && r.date <= to)
            .cloned()
            .collect();

        found.sort_by_key(|r| r.date);
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(key: ApiKeyId, date: NaiveDate, requests: u64) -> DailyUsageRecord {
        DailyUsageRecord {
            key_id: key,
            date,
            request_count: requests,
            error_count: 0,
        }
    }

    #[tokio::test]
    async fn test_upsert_overwrites() {
        let repo = InMemoryDailyUsageRepository::new();
        let key = ApiKeyId::generate();
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();

        repo.upsert(&record(key, date, 10)).await.unwrap();
        repo.upsert(&record(key, date, 4)).await.unwrap();

        assert_eq!(repo.get(&key, date).await.unwrap().unwrap().request_count, 4);
    }

    #[tokio::test]
    async fn test_list_range_sorted_and_scoped() {
        let repo = InMemoryDailyUsageRepository::new();
        let key = ApiKeyId::generate();
        let other = ApiKeyId::generate();
        let d1 = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let d2 = NaiveDate::from_ymd_opt(2024, 5, 2).unwrap();
        let d3 = NaiveDate::from_ymd_opt(2024, 5, 3).unwrap();

        repo.upsert(&record(key, d3, 3)).await.unwrap();
        repo.upsert(&record(key, d1, 1)).await.unwrap();
        repo.upsert(&record(other, d2, 2)).await.unwrap();

        let found = repo.list_range(&key, d1, d2).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].date, d1);

        let found = repo.list_range(&key, d1, d3).await.unwrap();
        let dates: Vec<_> = found.iter().map(|r| r.date).collect();
        assert_eq!(dates, vec![d1, d3]);
    }
}
