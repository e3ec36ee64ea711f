//! Rollup job
//!
//! Copies the live daily counters of every key into durable records. Each
//! write is an overwrite of the current snapshot, so reruns and runs that
//! overlap live traffic converge instead of double counting.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Days, NaiveDate, Utc};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{info, warn};

use crate::domain::api_key::{ApiKeyId, ApiKeyRepository};
use crate::domain::counter::CounterStore;
use crate::domain::usage::{
    daily_counter_key, DailyUsageRecord, DailyUsageRepository, UsageMetric, UsageSnapshot,
};
use crate::domain::DomainError;
use crate::infrastructure::observability::record_rollup_run;

#[derive(Debug, Clone)]
pub struct RollupConfig {
    /// Prior days to re-snapshot besides today
    pub lookback_days: u32,
    /// Keys processed in parallel
    pub concurrency: usize,
}

impl Default for RollupConfig {
    fn default() -> Self {
        Self {
            lookback_days: 1,
            concurrency: 8,
        }
    }
}

/// Outcome of one run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RollupReport {
    pub keys_scanned: usize,
    pub records_written: usize,
    pub failures: usize,
}

#[derive(Debug)]
pub struct RollupJob {
    keys: Arc<dyn ApiKeyRepository>,
    store: Arc<dyn CounterStore>,
    daily: Arc<dyn DailyUsageRepository>,
    config: RollupConfig,
}

/// Records written for one key, and whether a day failed partway
#[derive(Debug, Default)]
struct KeyOutcome {
    written: usize,
    failed: bool,
}

impl RollupJob {
    pub fn new(
        keys: Arc<dyn ApiKeyRepository>,
        store: Arc<dyn CounterStore>,
        daily: Arc<dyn DailyUsageRepository>,
        config: RollupConfig,
    ) -> Self {
        Self {
            keys,
            store,
            daily,
            config,
        }
    }

    pub async fn run(&self) -> Result<RollupReport, DomainError> {
        self.run_at(Utc::now()).await
    }

    /// Run for the day of `now` plus the configured lookback. Fails only when
    /// the key list itself cannot be read.
    pub async fn run_at(&self, now: DateTime<Utc>) -> Result<RollupReport, DomainError> {
        let started = Instant::now();
        let today = now.date_naive();
        let dates: Vec<NaiveDate> = (0..=self.config.lookback_days)
            .filter_map(|back| today.checked_sub_days(Days::new(u64::from(back))))
            .collect();

        let keys = self.keys.list_all().await?;
        let keys_scanned = keys.len();

        let outcomes: Vec<KeyOutcome> = stream::iter(keys)
            .map(|key| {
                let dates = &dates;
                async move { self.rollup_key(key.id(), dates).await }
            })
            .buffer_unordered(self.config.concurrency.max(1))
            .collect()
            .await;

        let report = RollupReport {
            keys_scanned,
            records_written: outcomes.iter().map(|o| o.written).sum(),
            failures: outcomes.iter().filter(|o| o.failed).count(),
        };

        record_rollup_run(report.records_written, report.failures, started.elapsed());
        info!(
            keys_scanned = report.keys_scanned,
            records_written = report.records_written,
            failures = report.failures,
            duration_ms = started.elapsed().as_millis() as u64,
            "Usage rollup finished"
        );

        Ok(report)
    }

    /// Snapshot one key; the first failing day stops this key only. Days
    /// written before the failure still count.
    async fn rollup_key(&self, key_id: &ApiKeyId, dates: &[NaiveDate]) -> KeyOutcome {
        let mut outcome = KeyOutcome::default();

        for &date in dates {
            match self.rollup_day(key_id, date).await {
                Ok(true) => outcome.written += 1,
                Ok(false) => {}
                Err(e) => {
                    warn!(
                        key_id = %key_id,
                        date = %date,
                        written = outcome.written,
                        error = %e,
                        "Usage rollup failed for key"
                    );
                    outcome.failed = true;
                    break;
                }
            }
        }

        outcome
    }

    async fn rollup_day(&self, key_id: &ApiKeyId, date: NaiveDate) -> Result<bool, DomainError> {
        let counters = self
            .store
            .get_many(&[
                daily_counter_key(key_id, date, UsageMetric::Requests),
                daily_counter_key(key_id, date, UsageMetric::Errors),
            ])
            .await?;

        let read = |i: usize| counters.get(i).copied().flatten().unwrap_or(0).max(0) as u64;
        let snapshot = UsageSnapshot::new(read(0), read(1));

        // Expired or untouched counters must not wipe an existing record
        if snapshot.is_empty() {
            return Ok(false);
        }

        self.daily
            .upsert(&DailyUsageRecord::from_snapshot(*key_id, date, snapshot))
            .await?;

        Ok(true)
    }
}
