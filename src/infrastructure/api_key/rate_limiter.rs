//! Rate limiter
//!
//! Sliding one-minute window per credential on the shared counter store.
//! The check-and-record is delegated to the store as a single atomic step,
//! so concurrent requests across instances cannot overshoot the budget.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, warn};

use crate::domain::access::{InfrastructureError, RateLimitDecision, RateLimitError};
use crate::domain::api_key::{clamp_rate_limit_rpm, ApiKeyId};
use crate::domain::counter::CounterStore;
use crate::domain::usage::rate_limit_key;
use crate::domain::AccessError;
use crate::infrastructure::observability::{record_rate_limited, record_store_unavailable};

pub const RATE_LIMIT_WINDOW: Duration = Duration::from_secs(60);

const STORE_NAME: &str = "counter store";

#[derive(Debug, Clone)]
pub struct RateLimiter {
    store: Arc<dyn CounterStore>,
    timeout: Duration,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn CounterStore>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    /// Admit or reject one request for `key_id` at the current time
    pub async fn check(&self, key_id: &ApiKeyId, rpm: u32) -> Result<RateLimitDecision, AccessError> {
        self.check_at(key_id, rpm, Utc::now().timestamp_millis()).await
    }

    /// Admit or reject one request at `now_ms` (epoch milliseconds)
    pub async fn check_at(
        &self,
        key_id: &ApiKeyId,
        rpm: u32,
        now_ms: i64,
    ) -> Result<RateLimitDecision, AccessError> {
        let limit = clamp_rate_limit_rpm(rpm);
        let key = rate_limit_key(key_id);

        let outcome = match tokio::time::timeout(
            self.timeout,
            self.store
                .sliding_window_hit(&key, limit, RATE_LIMIT_WINDOW, now_ms),
        )
        .await
        {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(e)) => {
                warn!(key_id = %key_id, error = %e, "Rate limit check failed");
                record_store_unavailable(STORE_NAME);
                return Err(InfrastructureError::store_unavailable(STORE_NAME, e.to_string()).into());
            }
            Err(_) => {
                warn!(key_id = %key_id, timeout_ms = self.timeout.as_millis() as u64, "Rate limit check timed out");
                record_store_unavailable(STORE_NAME);
                return Err(InfrastructureError::store_unavailable(STORE_NAME, "timed out").into());
            }
        };

        if !outcome.allowed {
            let retry_after_secs = retry_after_secs(outcome.reset_after_ms);
            debug!(key_id = %key_id, limit, retry_after_secs, "Rate limit exceeded");
            record_rate_limited();
            return Err(RateLimitError::Exceeded { retry_after_secs }.into());
        }

        Ok(RateLimitDecision {
            limit,
            remaining: limit.saturating_sub(outcome.count),
        })
    }
}

/// Whole seconds until a slot frees up, never less than one
fn retry_after_secs(reset_after_ms: u64) -> u64 {
    reset_after_ms.div_ceil(1000).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::counter::{MockCounterStore, WindowOutcome};
    use crate::domain::DomainError;
    use crate::infrastructure::counter::InMemoryCounterStore;

    fn limiter() -> RateLimiter {
        RateLimiter::new(
            Arc::new(InMemoryCounterStore::new()),
            Duration::from_millis(250),
        )
    }

    #[test]
    fn test_retry_after_rounds_up() {
        assert_eq!(retry_after_secs(0), 1);
        assert_eq!(retry_after_secs(1), 1);
        assert_eq!(retry_after_secs(1000), 1);
        assert_eq!(retry_after_secs(1001), 2);
        assert_eq!(retry_after_secs(59_500), 60);
    }

    #[tokio::test]
    async fn test_sixty_per_minute_window() {
        let limiter = limiter();
        let key = ApiKeyId::generate();
        let start = 1_700_000_000_000;

        for i in 0..60 {
            let decision = limiter.check_at(&key, 60, start + i * 500).await.unwrap();
            assert_eq!(decision.limit, 60);
            assert_eq!(decision.remaining, 59 - i as u32);
        }

        let err = limiter.check_at(&key, 60, start + 30_000).await.unwrap_err();
        match err {
            AccessError::RateLimited(e) => assert!(e.retry_after_secs() > 0),
            other => panic!("expected rate limit, got {:?}", other),
        }

        // The whole first minute has slid out of the window
        assert!(limiter.check_at(&key, 60, start + 90_000).await.is_ok());
    }

    #[tokio::test]
    async fn test_one_rpm_two_requests_same_second() {
        let limiter = limiter();
        let key = ApiKeyId::generate();
        let now = 1_700_000_000_000;

        assert!(limiter.check_at(&key, 1, now).await.is_ok());

        let err = limiter.check_at(&key, 1, now + 200).await.unwrap_err();
        assert_eq!(
            err,
            AccessError::RateLimited(RateLimitError::Exceeded {
                retry_after_secs: 60
            })
        );
    }

    #[tokio::test]
    async fn test_zero_rpm_is_clamped_to_one() {
        let limiter = limiter();
        let key = ApiKeyId::generate();

        let decision = limiter.check_at(&key, 0, 0).await.unwrap();
        assert_eq!(decision.limit, 1);
        assert!(limiter.check_at(&key, 0, 1).await.is_err());
    }

    #[tokio::test]
    async fn test_keys_do_not_share_budget() {
        let limiter = limiter();
        let (a, b) = (ApiKeyId::generate(), ApiKeyId::generate());

        assert!(limiter.check_at(&a, 1, 0).await.is_ok());
        assert!(limiter.check_at(&b, 1, 0).await.is_ok());
    }

    #[tokio::test]
    async fn test_store_error_fails_closed() {
        let mut store = MockCounterStore::new();
        store
            .expect_sliding_window_hit()
            .returning(|_, _, _, _| Err(DomainError::cache("connection refused")));

        let limiter = RateLimiter::new(Arc::new(store), Duration::from_millis(250));
        let err = limiter.check(&ApiKeyId::generate(), 60).await.unwrap_err();

        assert!(matches!(err, AccessError::Infrastructure(_)));
    }

    #[derive(Debug)]
    struct HangingStore;

    #[async_trait::async_trait]
    impl CounterStore for HangingStore {
        async fn increment(&self, _: &str, _: i64, _: Duration) -> Result<i64, DomainError> {
            Ok(0)
        }

        async fn get(&self, _: &str) -> Result<Option<i64>, DomainError> {
            Ok(None)
        }

        async fn get_many(&self, keys: &[String]) -> Result<Vec<Option<i64>>, DomainError> {
            Ok(vec![None; keys.len()])
        }

        async fn sliding_window_hit(
            &self,
            _: &str,
            _: u32,
            _: Duration,
            _: i64,
        ) -> Result<WindowOutcome, DomainError> {
            std::future::pending().await
        }

        async fn ping(&self) -> Result<(), DomainError> {
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_store_times_out() {
        let limiter = RateLimiter::new(Arc::new(HangingStore), Duration::from_millis(250));
        let err = limiter.check(&ApiKeyId::generate(), 60).await.unwrap_err();

        assert!(matches!(
            err,
            AccessError::Infrastructure(InfrastructureError::StoreUnavailable { .. })
        ));
    }
}
