use serde::Deserialize;

use crate::infrastructure::observability::MetricsConfig;

/// Application configuration
///
/// Layered from `config/default`, `config/local`, then `APP__SECTION__KEY`
/// environment variables.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub metrics: MetricsConfig,
    pub storage: StorageConfig,
    pub counter_store: CounterStoreConfig,
    pub access: AccessConfig,
    pub api_keys: ApiKeysConfig,
    pub usage: UsageConfig,
    pub rollup: RollupSettings,
    pub portal: PortalConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Memory,
    Postgres,
}

/// Durable store for keys, daily usage, and identity mappings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub database_url: String,
    pub max_connections: u32,
    pub connect_timeout_secs: u64,
    /// Apply schema migrations on startup
    pub run_migrations: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CounterStoreBackend {
    #[default]
    Memory,
    Redis,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CounterStoreConfig {
    pub backend: CounterStoreBackend,
    pub redis_url: String,
    pub key_prefix: String,
}

/// Request access path (authentication and rate limiting)
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AccessConfig {
    /// Upper bound on each store call before failing closed
    pub store_timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiKeysConfig {
    pub prefix: String,
    pub default_rate_limit_rpm: u32,
    pub max_active_per_owner: usize,
    /// Optional server-side secret mixed into every fingerprint
    pub hash_pepper: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UsageConfig {
    pub daily_ttl_secs: u64,
    pub hourly_ttl_secs: u64,
    /// History length when a report does not ask for one
    pub history_days: u32,
    /// Upper bound on each background counter write
    pub timeout_ms: u64,
    /// Background writes allowed at once
    pub max_in_flight: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RollupSettings {
    /// Bearer secret for the rollup trigger; the endpoint is closed without it
    pub secret: Option<String>,
    /// Run the job in-process every N seconds; 0 disables
    pub interval_secs: u64,
    pub lookback_days: u32,
    pub concurrency: usize,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct PortalConfig {
    /// HS256 secret shared with the application's login; portal routes
    /// reject every request without it
    pub jwt_secret: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            database_url: "postgres://localhost/directory_devapi".to_string(),
            max_connections: 10,
            connect_timeout_secs: 5,
            run_migrations: true,
        }
    }
}

impl Default for CounterStoreConfig {
    fn default() -> Self {
        Self {
            backend: CounterStoreBackend::default(),
            redis_url: "redis://127.0.0.1:6379".to_string(),
            key_prefix: "devapi".to_string(),
        }
    }
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            store_timeout_ms: 250,
        }
    }
}

impl Default for ApiKeysConfig {
    fn default() -> Self {
        Self {
            prefix: "dk_live_".to_string(),
            default_rate_limit_rpm: 60,
            max_active_per_owner: 10,
            hash_pepper: None,
        }
    }
}

impl Default for UsageConfig {
    fn default() -> Self {
        Self {
            daily_ttl_secs: 8 * 24 * 3600,
            hourly_ttl_secs: 48 * 3600,
            history_days: 7,
            timeout_ms: 1000,
            max_in_flight: 1024,
        }
    }
}

impl Default for RollupSettings {
    fn default() -> Self {
        Self {
            secret: None,
            interval_secs: 0,
            lookback_days: 1,
            concurrency: 8,
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
