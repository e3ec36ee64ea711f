//! Counter store trait definition

use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::DomainError;

/// Result of one atomic sliding-window check-and-record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowOutcome {
    /// Whether the hit was admitted (and recorded)
    pub allowed: bool,
    /// Hits inside the window after this call
    pub count: u32,
    /// Milliseconds until the oldest hit leaves the window
    pub reset_after_ms: u64,
}

/// Distributed, low-latency counter store
///
/// Every operation must be atomic at the store so that several service
/// instances can share it without in-process coordination.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CounterStore: Send + Sync + Debug {
    /// Add `delta` to a counter, creating it if needed, and (re)arm its TTL.
    /// Returns the new value.
    async fn increment(&self, key: &str, delta: i64, ttl: Duration) -> Result<i64, DomainError>;

    /// Read a counter; `None` when absent or expired
    async fn get(&self, key: &str) -> Result<Option<i64>, DomainError>;

    /// Read several counters in one round trip, in the order given
    async fn get_many(&self, keys: &[String]) -> Result<Vec<Option<i64>>, DomainError>;

    /// Atomically drop hits older than `window`, and record a new hit at
    /// `now_ms` only if fewer than `limit` hits remain.
    async fn sliding_window_hit(
        &self,
        key: &str,
        limit: u32,
        window: Duration,
        now_ms: i64,
    ) -> Result<WindowOutcome, DomainError>;

    /// Cheap connectivity probe
    async fn ping(&self) -> Result<(), DomainError>;
}
