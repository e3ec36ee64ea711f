//! Redis counter store
//!
//! Counters are plain integer keys armed with `EXPIRE`; the sliding window is
//! a sorted set of hit timestamps maintained by a Lua script so that the
//! prune, count, and insert steps run as one atomic unit on the server.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{Client, Script};
use uuid::Uuid;

use crate::domain::counter::{CounterStore, WindowOutcome};
use crate::domain::DomainError;

const SLIDING_WINDOW_SCRIPT: &str = r#"
local key = KEYS[1]
local now = tonumber(ARGV[1])
local window = tonumber(ARGV[2])
local limit = tonumber(ARGV[3])
local member = ARGV[4]

redis.call('ZREMRANGEBYSCORE', key, '-inf', now - window)
local count = redis.call('ZCARD', key)
local allowed = 0
if count < limit then
    redis.call('ZADD', key, now, member)
    count = count + 1
    allowed = 1
end
redis.call('PEXPIRE', key, window)

local reset = window
local oldest = redis.call('ZRANGE', key, 0, 0, 'WITHSCORES')
if oldest[2] then
    reset = tonumber(oldest[2]) + window - now
end
return {allowed, count, reset}
"#;

/// Configuration for the Redis counter store
#[derive(Debug, Clone)]
pub struct RedisCounterStoreConfig {
    /// Redis connection URL (e.g., "redis://127.0.0.1:6379")
    pub url: String,
    /// Key prefix for namespacing
    pub key_prefix: Option<String>,
}

impl Default for RedisCounterStoreConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".to_string(),
            key_prefix: None,
        }
    }
}

impl RedisCounterStoreConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Sets the key prefix
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        self.key_prefix = (!prefix.is_empty()).then_some(prefix);
        self
    }
}

#[derive(Clone)]
pub struct RedisCounterStore {
    connection: ConnectionManager,
    config: RedisCounterStoreConfig,
    window_script: Script,
}

impl fmt::Debug for RedisCounterStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisCounterStore")
            .field("config", &self.config)
            .field("connection", &"<ConnectionManager>")
            .finish()
    }
}

impl RedisCounterStore {
    pub async fn new(config: RedisCounterStoreConfig) -> Result<Self, DomainError> {
        let client = Client::open(config.url.as_str())
            .map_err(|e| DomainError::cache(format!("Failed to create Redis client: {}", e)))?;

        let connection = ConnectionManager::new(client)
            .await
            .map_err(|e| DomainError::cache(format!("Failed to connect to Redis: {}", e)))?;

        Ok(Self {
            connection,
            config,
            window_script: Script::new(SLIDING_WINDOW_SCRIPT),
        })
    }

    fn prefix_key(&self, key: &str) -> String {
        match &self.config.key_prefix {
            Some(prefix) => format!("{}:{}", prefix, key),
            None => key.to_string(),
        }
    }
}

#[async_trait]
impl CounterStore for RedisCounterStore {
    async fn increment(&self, key: &str, delta: i64, ttl: Duration) -> Result<i64, DomainError> {
        let prefixed_key = self.prefix_key(key);
        let mut conn = self.connection.clone();
        let ttl_secs = ttl.as_secs().max(1) as i64;

        let (value,): (i64,) = redis::pipe()
            .atomic()
            .incr(&prefixed_key, delta)
            .expire(&prefixed_key, ttl_secs)
            .ignore()
            .query_async(&mut conn)
            .await
            .map_err(|e| {
                DomainError::cache(format!("Failed to increment key '{}': {}", key, e))
            })?;

        Ok(value)
    }

    async fn get(&self, key: &str) -> Result<Option<i64>, DomainError> {
        let prefixed_key = self.prefix_key(key);
        let mut conn = self.connection.clone();

        let value: Option<i64> = redis::cmd("GET")
            .arg(&prefixed_key)
            .query_async(&mut conn)
            .await
            .map_err(|e| DomainError::cache(format!("Failed to get key '{}': {}", key, e)))?;

        Ok(value)
    }

    async fn get_many(&self, keys: &[String]) -> Result<Vec<Option<i64>>, DomainError> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let prefixed: Vec<String> = keys.iter().map(|k| self.prefix_key(k)).collect();
        let mut conn = self.connection.clone();

        let values: Vec<Option<i64>> = redis::cmd("MGET")
            .arg(&prefixed)
            .query_async(&mut conn)
            .await
            .map_err(|e| DomainError::cache(format!("Failed to read counters: {}", e)))?;

        Ok(values)
    }

    async fn sliding_window_hit(
        &self,
        key: &str,
        limit: u32,
        window: Duration,
        now_ms: i64,
    ) -> Result<WindowOutcome, DomainError> {
        let prefixed_key = self.prefix_key(key);
        let mut conn = self.connection.clone();
        let member = format!("{}-{}", now_ms, Uuid::new_v4().simple());

        let (allowed, count, reset): (i64, i64, i64) = self
            .window_script
            .key(&prefixed_key)
            .arg(now_ms)
            .arg(window.as_millis() as i64)
            .arg(limit)
            .arg(member)
            .invoke_async(&mut conn)
            .await
            .map_err(|e| {
                DomainError::cache(format!("Sliding window check failed for '{}': {}", key, e))
            })?;

        Ok(WindowOutcome {
            allowed: allowed == 1,
            count: count.max(0) as u32,
            reset_after_ms: reset.max(0) as u64,
        })
    }

    async fn ping(&self) -> Result<(), DomainError> {
        let mut conn = self.connection.clone();

        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| DomainError::cache(format!("Redis ping failed: {}", e)))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_prefix() {
        let config = RedisCounterStoreConfig::new("redis://cache:6379").with_key_prefix("devapi");
        assert_eq!(config.key_prefix.as_deref(), Some("devapi"));

        let config = RedisCounterStoreConfig::new("redis://cache:6379").with_key_prefix("");
        assert!(config.key_prefix.is_none());
    }

    async fn store() -> RedisCounterStore {
        let url =
            std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string());
        let prefix = format!("devapi-test-{}", Uuid::new_v4().simple());
        RedisCounterStore::new(RedisCounterStoreConfig::new(url).with_key_prefix(prefix))
            .await
            .unwrap()
    }

    #[tokio::test]
    #[ignore = "requires a running Redis"]
    async fn test_increment_sets_ttl() {
        let store = store().await;

        assert_eq!(
            store
                .increment("c", 2, Duration::from_secs(30))
                .await
                .unwrap(),
            2
        );
        assert_eq!(store.get("c").await.unwrap(), Some(2));

        let values = store
            .get_many(&["c".to_string(), "missing".to_string()])
            .await
            .unwrap();
        assert_eq!(values, vec![Some(2), None]);
    }

    #[tokio::test]
    #[ignore = "requires a running Redis"]
    async fn test_sliding_window_script() {
        let store = store().await;
        let window = Duration::from_secs(60);
        let now = chrono::Utc::now().timestamp_millis();

        assert!(store.sliding_window_hit("w", 1, window, now).await.unwrap().allowed);

        let rejected = store
            .sliding_window_hit("w", 1, window, now + 500)
            .await
            .unwrap();
        assert!(!rejected.allowed);
        assert_eq!(rejected.reset_after_ms, 59_500);
    }
}
