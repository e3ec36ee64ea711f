//! Application configuration

mod app_config;

pub use app_config::{
    AccessConfig, ApiKeysConfig, AppConfig, CounterStoreBackend, CounterStoreConfig, LogFormat,
    LoggingConfig, PortalConfig, RollupSettings, ServerConfig, StorageBackend, StorageConfig,
    UsageConfig,
};
