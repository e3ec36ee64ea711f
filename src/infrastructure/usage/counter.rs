//! Usage counter
//!
//! Per-request metering written off the critical path. Nothing here can fail
//! the caller: every error is logged, counted, and dropped. Store calls are
//! bounded by a timeout and the number of writes in flight is capped, so a
//! stalled store sheds metering instead of piling up tasks.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Timelike, Utc};
use futures::future::join_all;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::warn;

use crate::domain::api_key::{ApiKeyId, ApiKeyRepository};
use crate::domain::counter::CounterStore;
use crate::domain::usage::{daily_counter_key, hourly_counter_key, UsageMetric};
use crate::infrastructure::observability::record_usage_failure;

#[derive(Debug, Clone)]
pub struct UsageCounterConfig {
    /// Outlives the rollup lookback so yesterday can still be flushed
    pub daily_ttl: Duration,
    pub hourly_ttl: Duration,
    /// Upper bound on each store call made while recording
    pub store_timeout: Duration,
    /// Background writes allowed at once; further requests go unmetered
    pub max_in_flight: usize,
}

impl Default for UsageCounterConfig {
    fn default() -> Self {
        Self {
            daily_ttl: Duration::from_secs(8 * 24 * 3600),
            hourly_ttl: Duration::from_secs(48 * 3600),
            store_timeout: Duration::from_secs(1),
            max_in_flight: 1024,
        }
    }
}

#[derive(Debug)]
pub struct UsageCounter {
    store: Arc<dyn CounterStore>,
    keys: Arc<dyn ApiKeyRepository>,
    in_flight: Arc<Semaphore>,
    config: UsageCounterConfig,
}

impl UsageCounter {
    pub fn new(
        store: Arc<dyn CounterStore>,
        keys: Arc<dyn ApiKeyRepository>,
        config: UsageCounterConfig,
    ) -> Self {
        Self {
            store,
            keys,
            in_flight: Arc::new(Semaphore::new(config.max_in_flight.max(1))),
            config,
        }
    }

    /// Record one request in the background and return immediately
    ///
    /// Returns `None` when the in-flight cap is reached and the write is dropped.
    pub fn dispatch(self: &Arc<Self>, key_id: ApiKeyId, status: u16) -> Option<JoinHandle<()>> {
        let permit = match Arc::clone(&self.in_flight).try_acquire_owned() {
            Ok(permit) => permit,
            Err(_) => {
                warn!(key_id = %key_id, "Usage writes saturated, dropping request count");
                record_usage_failure("overloaded");
                return None;
            }
        };

        let counter = Arc::clone(self);
        let at = Utc::now();

        Some(tokio::spawn(async move {
            counter.record_at(&key_id, status, at).await;
            drop(permit);
        }))
    }

    /// Record one request with response `status` observed at `at`
    pub async fn record_at(&self, key_id: &ApiKeyId, status: u16, at: DateTime<Utc>) {
        let date = at.date_naive();
        let hour = at.hour();

        let mut keys = vec![
            (
                daily_counter_key(key_id, date, UsageMetric::Requests),
                self.config.daily_ttl,
            ),
            (
                hourly_counter_key(key_id, date, hour, UsageMetric::Requests),
                self.config.hourly_ttl,
            ),
        ];

        if status >= 400 {
            keys.push((
                daily_counter_key(key_id, date, UsageMetric::Errors),
                self.config.daily_ttl,
            ));
            keys.push((
                hourly_counter_key(key_id, date, hour, UsageMetric::Errors),
                self.config.hourly_ttl,
            ));
        }

        let timeout = self.config.store_timeout;
        let results = join_all(keys.iter().map(|(key, ttl)| {
            tokio::time::timeout(timeout, self.store.increment(key, 1, *ttl))
        }))
        .await;

        for (result, (key, _)) in results.into_iter().zip(&keys) {
            match result {
                Ok(Ok(_)) => {}
                Ok(Err(e)) => {
                    warn!(key_id = %key_id, counter = %key, error = %e, "Failed to record usage");
                    record_usage_failure("counter");
                }
                Err(_) => {
                    warn!(
                        key_id = %key_id,
                        counter = %key,
                        timeout_ms = timeout.as_millis() as u64,
                        "Recording usage timed out"
                    );
                    record_usage_failure("timeout");
                }
            }
        }

        match tokio::time::timeout(timeout, self.keys.touch_last_used(key_id, at)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                warn!(key_id = %key_id, error = %e, "Failed to update last_used_at");
                record_usage_failure("last_used_at");
            }
            Err(_) => {
                warn!(
                    key_id = %key_id,
                    timeout_ms = timeout.as_millis() as u64,
                    "Updating last_used_at timed out"
                );
                record_usage_failure("timeout");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    use crate::domain::api_key::{ApiKey, MockApiKeyRepository, OwnerId};
    use crate::domain::counter::MockCounterStore;
    use crate::domain::DomainError;
    use crate::infrastructure::counter::InMemoryCounterStore;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 13, 45, 0).unwrap()
    }

    async fn seeded_repo() -> (Arc<MockApiKeyRepository>, ApiKeyId) {
        let repo = Arc::new(MockApiKeyRepository::new());
        let key = ApiKey::new(
            ApiKeyId::generate(),
            OwnerId::new("o1").unwrap(),
            "k",
            "sha256$x",
            "dk_live_aaaaaaaa",
        );
        let id = *key.id();
        repo.create(key).await.unwrap();
        (repo, id)
    }

    #[tokio::test]
    async fn test_success_increments_requests_only() {
        let store = Arc::new(InMemoryCounterStore::new());
        let (repo, id) = seeded_repo().await;
        let counter = UsageCounter::new(store.clone(), repo.clone(), UsageCounterConfig::default());

        counter.record_at(&id, 200, at()).await;
        counter.record_at(&id, 200, at()).await;

        let date = at().date_naive();
        let daily = daily_counter_key(&id, date, UsageMetric::Requests);
        let hourly = hourly_counter_key(&id, date, 13, UsageMetric::Requests);
        let errors = daily_counter_key(&id, date, UsageMetric::Errors);

        assert_eq!(store.get(&daily).await.unwrap(), Some(2));
        assert_eq!(store.get(&hourly).await.unwrap(), Some(2));
        assert_eq!(store.get(&errors).await.unwrap(), None);

        let key = repo.get(&id).await.unwrap().unwrap();
        assert_eq!(key.last_used_at(), Some(at()));
    }

    #[tokio::test]
    async fn test_error_status_increments_error_counters() {
        let store = Arc::new(InMemoryCounterStore::new());
        let (repo, id) = seeded_repo().await;
        let counter = UsageCounter::new(store.clone(), repo, UsageCounterConfig::default());

        counter.record_at(&id, 404, at()).await;

        let date = at().date_naive();
        assert_eq!(
            store
                .get(&daily_counter_key(&id, date, UsageMetric::Errors))
                .await
                .unwrap(),
            Some(1)
        );
        assert_eq!(
            store
                .get(&hourly_counter_key(&id, date, 13, UsageMetric::Errors))
                .await
                .unwrap(),
            Some(1)
        );
    }

    #[tokio::test]
    async fn test_failures_are_swallowed() {
        let mut store = MockCounterStore::new();
        store
            .expect_increment()
            .returning(|_, _, _| Err(DomainError::cache("down")));

        let (repo, id) = seeded_repo().await;
        repo.set_should_fail(true).await;

        let counter = Arc::new(UsageCounter::new(
            Arc::new(store),
            repo,
            UsageCounterConfig::default(),
        ));

        // Completes without panicking or propagating
        counter.dispatch(id, 500).unwrap().await.unwrap();
    }

    /// Counter store whose writes never complete
    #[derive(Debug)]
    struct HangingStore;

    #[async_trait::async_trait]
    impl CounterStore for HangingStore {
        async fn increment(&self, _: &str, _: i64, _: Duration) -> Result<i64, DomainError> {
            std::future::pending().await
        }

        async fn get(&self, _: &str) -> Result<Option<i64>, DomainError> {
            std::future::pending().await
        }

        async fn get_many(&self, _: &[String]) -> Result<Vec<Option<i64>>, DomainError> {
            std::future::pending().await
        }

        async fn sliding_window_hit(
            &self,
            _: &str,
            _: u32,
            _: Duration,
            _: i64,
        ) -> Result<crate::domain::counter::WindowOutcome, DomainError> {
            std::future::pending().await
        }

        async fn ping(&self) -> Result<(), DomainError> {
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_hanging_store_times_out() {
        let (repo, id) = seeded_repo().await;
        let counter = Arc::new(UsageCounter::new(
            Arc::new(HangingStore),
            repo.clone(),
            UsageCounterConfig::default(),
        ));

        let handles: Vec<_> = (0..1000)
            .filter_map(|_| counter.dispatch(id, 200))
            .collect();
        assert_eq!(handles.len(), 1000);

        tokio::time::advance(Duration::from_secs(2)).await;

        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(counter.in_flight.available_permits(), 1024);

        // The last_used_at write still lands after the counters time out
        let key = repo.get(&id).await.unwrap().unwrap();
        assert!(key.last_used_at().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_saturated_dispatch_is_dropped() {
        let (repo, id) = seeded_repo().await;
        let counter = Arc::new(UsageCounter::new(
            Arc::new(HangingStore),
            repo,
            UsageCounterConfig {
                max_in_flight: 2,
                ..Default::default()
            },
        ));

        let first = counter.dispatch(id, 200);
        let second = counter.dispatch(id, 200);
        assert!(first.is_some() && second.is_some());
        assert!(counter.dispatch(id, 200).is_none());

        tokio::time::advance(Duration::from_secs(2)).await;
        first.unwrap().await.unwrap();
        second.unwrap().await.unwrap();

        assert!(counter.dispatch(id, 200).is_some());
    }

    #[test]
    fn test_daily_ttl_outlives_hourly() {
        let config = UsageCounterConfig::default();
        assert!(config.daily_ttl > config.hourly_ttl);
    }
}
