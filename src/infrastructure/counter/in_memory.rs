//! In-memory counter store
//!
//! Single-process stand-in for Redis. One lock guards all state, which makes
//! every operation atomic with respect to the others. Expired counters and
//! idle windows are swept every `SWEEP_EVERY` writes.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::domain::counter::{CounterStore, WindowOutcome};
use crate::domain::DomainError;

const SWEEP_EVERY: u64 = 1024;

#[derive(Debug)]
struct CounterEntry {
    value: i64,
    expires_at: Instant,
}

#[derive(Debug, Default)]
struct State {
    counters: HashMap<String, CounterEntry>,
    /// Hit timestamps (epoch ms), oldest first
    windows: HashMap<String, VecDeque<i64>>,
    /// Longest window seen, used to decide when a window is idle
    max_window_ms: i64,
    writes: u64,
}

impl State {
    fn note_write(&mut self, now: Instant, now_ms: Option<i64>) {
        self.writes = self.writes.wrapping_add(1);
        if self.writes % SWEEP_EVERY == 0 {
            self.sweep(now, now_ms);
        }
    }

    fn sweep(&mut self, now: Instant, now_ms: Option<i64>) {
        self.counters.retain(|_, entry| entry.expires_at > now);

        if let Some(now_ms) = now_ms {
            let horizon = now_ms - self.max_window_ms;
            self.windows
                .retain(|_, hits| hits.back().is_some_and(|&newest| newest > horizon));
        }
    }
}

#[derive(Debug, Default)]
pub struct InMemoryCounterStore {
    state: Mutex<State>,
}

impl InMemoryCounterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop expired counters and windows with no hit newer than the longest
    /// window ending at `now_ms`
    pub async fn sweep(&self, now_ms: i64) {
        let mut state = self.state.lock().await;
        state.sweep(Instant::now(), Some(now_ms));
    }

    /// Number of counter and window entries held, live or not
    pub async fn entries(&self) -> usize {
        let state = self.state.lock().await;
        state.counters.len() + state.windows.len()
    }

    /// Number of live counters
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        let state = self.state.lock().await;
        state
            .counters
            .values()
            .filter(|entry| entry.expires_at > now)
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl CounterStore for InMemoryCounterStore {
    async fn increment(&self, key: &str, delta: i64, ttl: Duration) -> Result<i64, DomainError> {
        let now = Instant::now();
        let mut state = self.state.lock().await;

        let entry = state
            .counters
            .entry(key.to_string())
            .or_insert(CounterEntry {
                value: 0,
                expires_at: now,
            });

        if entry.expires_at <= now {
            entry.value = 0;
        }

        entry.value += delta;
        entry.expires_at = now + ttl;
        let value = entry.value;

        state.note_write(now, None);
        Ok(value)
    }

    async fn get(&self, key: &str) -> Result<Option<i64>, DomainError> {
        let now = Instant::now();
        let mut state = self.state.lock().await;

        match state.counters.get(key) {
            Some(entry) if entry.expires_at > now => Ok(Some(entry.value)),
            Some(_) => {
                state.counters.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn get_many(&self, keys: &[String]) -> Result<Vec<Option<i64>>, DomainError> {
        let now = Instant::now();
        let state = self.state.lock().await;

        Ok(keys
            .iter()
            .map(|key| {
                state
                    .counters
                    .get(key)
                    .filter(|entry| entry.expires_at > now)
                    .map(|entry| entry.value)
            })
            .collect())
    }

    async fn sliding_window_hit(
        &self,
        key: &str,
        limit: u32,
        window: Duration,
        now_ms: i64,
    ) -> Result<WindowOutcome, DomainError> {
        let window_ms = window.as_millis() as i64;
        let mut state = self.state.lock().await;
        state.max_window_ms = state.max_window_ms.max(window_ms);
        let hits = state.windows.entry(key.to_string()).or_default();

        while hits.front().is_some_and(|&ts| ts <= now_ms - window_ms) {
            hits.pop_front();
        }

        let allowed = (hits.len() as u64) < u64::from(limit);
        if allowed {
            hits.push_back(now_ms);
        }

        let reset_after_ms = hits
            .front()
            .map(|&oldest| (oldest + window_ms - now_ms).max(0) as u64)
            .unwrap_or(window_ms as u64);
        let count = hits.len() as u32;

        if hits.is_empty() {
            state.windows.remove(key);
        }
        state.note_write(Instant::now(), Some(now_ms));

        Ok(WindowOutcome {
            allowed,
            count,
            reset_after_ms,
        })
    }

    async fn ping(&self) -> Result<(), DomainError> {
        Ok(())
    }
}
