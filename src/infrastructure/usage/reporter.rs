//! Usage reporter
//!
//! Today comes from the live counters; prior days come from the durable
//! rollup records, since their counters may already have expired.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Days, NaiveDate, Utc};

use crate::domain::api_key::ApiKeyId;
use crate::domain::counter::CounterStore;
use crate::domain::usage::{
    daily_counter_key, hourly_counter_key, DailyUsage, DailyUsageRepository, HourlyUsage,
    TodayUsage, UsageMetric, UsageSummary,
};
use crate::domain::DomainError;

pub const DEFAULT_HISTORY_DAYS: u32 = 7;
pub const MAX_HISTORY_DAYS: u32 = 90;

#[derive(Debug)]
pub struct UsageReporter {
    store: Arc<dyn CounterStore>,
    daily: Arc<dyn DailyUsageRepository>,
}

impl UsageReporter {
    pub fn new(store: Arc<dyn CounterStore>, daily: Arc<dyn DailyUsageRepository>) -> Self {
        Self { store, daily }
    }

    /// Summary with `days` prior days of history (capped at 90)
    pub async fn summary(&self, key_id: &ApiKeyId, days: u32) -> Result<UsageSummary, DomainError> {
        self.summary_at(key_id, days, Utc::now()).await
    }

    pub async fn summary_at(
        &self,
        key_id: &ApiKeyId,
        days: u32,
        now: DateTime<Utc>,
    ) -> Result<UsageSummary, DomainError> {
        let today = now.date_naive();
        let days = days.min(MAX_HISTORY_DAYS);

        let today_usage = self.today(key_id, today).await?;
        let history = self.history(key_id, today, days).await?;

        Ok(UsageSummary::new(*key_id, today_usage, history))
    }

    async fn today(&self, key_id: &ApiKeyId, date: NaiveDate) -> Result<TodayUsage, DomainError> {
        let mut keys = vec![
            daily_counter_key(key_id, date, UsageMetric::Requests),
            daily_counter_key(key_id, date, UsageMetric::Errors),
        ];
        for hour in 0..24 {
            keys.push(hourly_counter_key(key_id, date, hour, UsageMetric::Requests));
            keys.push(hourly_counter_key(key_id, date, hour, UsageMetric::Errors));
        }

        let values = self.store.get_many(&keys).await?;
        let value = |i: usize| values.get(i).copied().flatten().unwrap_or(0).max(0) as u64;

        let hourly = (0..24u32)
            .map(|hour| {
                let base = 2 + 2 * hour as usize;
                HourlyUsage {
                    hour,
                    requests: value(base),
                    errors: value(base + 1),
                }
            })
            .collect();

        Ok(TodayUsage {
            date,
            requests: value(0),
            errors: value(1),
            hourly,
        })
    }

    async fn history(
        &self,
        key_id: &ApiKeyId,
        today: NaiveDate,
        days: u32,
    ) -> Result<Vec<DailyUsage>, DomainError> {
        if days == 0 {
            return Ok(Vec::new());
        }

        let (Some(from), Some(to)) = (
            today.checked_sub_days(Days::new(u64::from(days))),
            today.pred_opt(),
        ) else {
            return Ok(Vec::new());
        };

        let records: HashMap<NaiveDate, (u64, u64)> = self
            .daily
            .list_range(key_id, from, to)
            .await?
            .into_iter()
            .map(|r| (r.date, (r.request_count, r.error_count)))
            .collect();

        Ok(from
            .iter_days()
            .take_while(|date| *date <= to)
            .map(|date| {
                let (requests, errors) = records.get(&date).copied().unwrap_or((0, 0));
                DailyUsage {
                    date,
                    requests,
                    errors,
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::time::Duration;

    use crate::domain::usage::DailyUsageRecord;
    use crate::infrastructure::counter::InMemoryCounterStore;
    use crate::infrastructure::usage::InMemoryDailyUsageRepository;

    const TTL: Duration = Duration::from_secs(3600);

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 10, 15, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_summary_combines_live_and_durable() {
        let store = Arc::new(InMemoryCounterStore::new());
        let daily = Arc::new(InMemoryDailyUsageRepository::new());
        let key = ApiKeyId::generate();
        let today = now().date_naive();

        store
            .increment(&daily_counter_key(&key, today, UsageMetric::Requests), 5, TTL)
            .await
            .unwrap();
        store
            .increment(&daily_counter_key(&key, today, UsageMetric::Errors), 1, TTL)
            .await
            .unwrap();
        store
            .increment(
                &hourly_counter_key(&key, today, 15, UsageMetric::Requests),
                5,
                TTL,
            )
            .await
            .unwrap();

        let two_days_ago = today.checked_sub_days(Days::new(2)).unwrap();
        daily
            .upsert(&DailyUsageRecord {
                key_id: key,
                date: two_days_ago,
                request_count: 40,
                error_count: 3,
            })
            .await
            .unwrap();

        let reporter = UsageReporter::new(store, daily);
        let summary = reporter.summary_at(&key, 3, now()).await.unwrap();

        assert_eq!(summary.today.requests, 5);
        assert_eq!(summary.today.errors, 1);
        assert_eq!(summary.today.hourly.len(), 24);
        assert_eq!(summary.today.hourly[15].requests, 5);
        assert_eq!(summary.today.hourly[14].requests, 0);

        // Oldest first, missing days reported as zero
        let dates: Vec<NaiveDate> = summary.history.iter().map(|d| d.date).collect();
        assert_eq!(
            dates,
            vec![
                today.checked_sub_days(Days::new(3)).unwrap(),
                two_days_ago,
                today.pred_opt().unwrap(),
            ]
        );
        assert_eq!(summary.history[1].requests, 40);
        assert_eq!(summary.history[0].requests, 0);
        assert_eq!(summary.total_requests, 45);
        assert_eq!(summary.total_errors, 4);
    }

    #[tokio::test]
    async fn test_history_capped() {
        let reporter = UsageReporter::new(
            Arc::new(InMemoryCounterStore::new()),
            Arc::new(InMemoryDailyUsageRepository::new()),
        );

        let summary = reporter
            .summary_at(&ApiKeyId::generate(), 365, now())
            .await
            .unwrap();
        assert_eq!(summary.history.len(), MAX_HISTORY_DAYS as usize);

        let summary = reporter
            .summary_at(&ApiKeyId::generate(), 0, now())
            .await
            .unwrap();
        assert!(summary.history.is_empty());
    }
}
