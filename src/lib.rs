//! Directory Developer API
//!
//! The access layer in front of the directory's public API:
//! - API key issuance, validation, and owner-scoped management
//! - Per-key sliding-window rate limiting on a shared counter store
//! - Usage metering with a daily rollup into durable records
//! - Stable pseudonymous identities for integrators' end users

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use self::config::AppConfig;

use std::sync::Arc;
use std::time::Duration;

use api::state::AppState;
use crate::config::{
    ApiKeysConfig, CounterStoreBackend, CounterStoreConfig, StorageBackend, StorageConfig,
};
use domain::{ApiKeyRepository, CounterStore, DailyUsageRepository, ExternalIdentityRepository};
use infrastructure::{
    api_key::{
        ApiKeyGenerator, ApiKeyService, ApiKeyServiceConfig, InMemoryApiKeyRepository,
        PostgresApiKeyRepository, RateLimiter,
    },
    auth::PortalTokenService,
    counter::{InMemoryCounterStore, RedisCounterStore, RedisCounterStoreConfig},
    crypto::SecretHasher,
    identity::{
        ExternalIdentityResolver, InMemoryExternalIdentityRepository,
        PostgresExternalIdentityRepository,
    },
    review::InMemoryReviewSink,
    storage::{connect_pool, PostgresConfig, PostgresMigrator},
    usage::{
        InMemoryDailyUsageRepository, PostgresDailyUsageRepository, RollupConfig, RollupJob,
        UsageCounter, UsageCounterConfig, UsageReporter,
    },
};
use tracing::{info, warn};

/// Durable repositories, all on the same backend
struct Repositories {
    api_keys: Arc<dyn ApiKeyRepository>,
    daily_usage: Arc<dyn DailyUsageRepository>,
    identities: Arc<dyn ExternalIdentityRepository>,
}

/// Create the application state with default configuration (in-memory stores)
pub async fn create_app_state() -> anyhow::Result<AppState> {
    create_app_state_with_config(&AppConfig::default()).await
}

/// Create the application state with custom configuration
pub async fn create_app_state_with_config(config: &AppConfig) -> anyhow::Result<AppState> {
    let repositories = create_repositories(&config.storage).await?;
    let counter_store = create_counter_store(&config.counter_store).await?;
    let hasher = create_hasher(&config.api_keys);
    let store_timeout = Duration::from_millis(config.access.store_timeout_ms);

    let api_key_service = ApiKeyService::new(repositories.api_keys.clone())
        .with_generator(ApiKeyGenerator::new(
            config.api_keys.prefix.clone(),
            hasher.clone(),
        ))
        .with_config(ApiKeyServiceConfig {
            default_rate_limit_rpm: config.api_keys.default_rate_limit_rpm,
            max_active_per_owner: config.api_keys.max_active_per_owner,
            store_timeout,
        });

    let rate_limiter = RateLimiter::new(counter_store.clone(), store_timeout);

    let usage_counter = UsageCounter::new(
        counter_store.clone(),
        repositories.api_keys.clone(),
        UsageCounterConfig {
            daily_ttl: Duration::from_secs(config.usage.daily_ttl_secs),
            hourly_ttl: Duration::from_secs(config.usage.hourly_ttl_secs),
            store_timeout: Duration::from_millis(config.usage.timeout_ms),
            max_in_flight: config.usage.max_in_flight,
        },
    );

    let usage_reporter = UsageReporter::new(counter_store.clone(), repositories.daily_usage.clone());

    let rollup_job = RollupJob::new(
        repositories.api_keys.clone(),
        counter_store.clone(),
        repositories.daily_usage.clone(),
        RollupConfig {
            lookback_days: config.rollup.lookback_days,
            concurrency: config.rollup.concurrency.max(1),
        },
    );

    let identity_resolver = ExternalIdentityResolver::new(repositories.identities.clone(), hasher);

    let mut state = AppState::new(
        Arc::new(api_key_service),
        Arc::new(rate_limiter),
        Arc::new(usage_counter),
        Arc::new(usage_reporter),
        Arc::new(rollup_job),
        Arc::new(identity_resolver),
        Arc::new(InMemoryReviewSink::new()),
        counter_store,
    )
    .with_default_history_days(config.usage.history_days);

    match config.portal.jwt_secret.as_deref().filter(|s| !s.is_empty()) {
        Some(secret) => state = state.with_portal_tokens(PortalTokenService::new(secret)),
        None => warn!("portal.jwt_secret is not set; portal routes will reject every request"),
    }

    match config.rollup.secret.as_deref() {
        Some(secret) => state = state.with_rollup_secret(secret),
        None => info!("rollup.secret is not set; the rollup trigger endpoint is closed"),
    }

    Ok(state)
}

async fn create_repositories(config: &StorageConfig) -> anyhow::Result<Repositories> {
    match config.backend {
        StorageBackend::Memory => {
            info!("Using in-memory storage");

            Ok(Repositories {
                api_keys: Arc::new(InMemoryApiKeyRepository::new()),
                daily_usage: Arc::new(InMemoryDailyUsageRepository::new()),
                identities: Arc::new(InMemoryExternalIdentityRepository::new()),
            })
        }
        StorageBackend::Postgres => {
            let pool = connect_pool(
                &PostgresConfig::new(config.database_url.clone())
                    .with_max_connections(config.max_connections)
                    .with_connect_timeout(config.connect_timeout_secs),
            )
            .await?;

            if config.run_migrations {
                let applied = PostgresMigrator::new(pool.clone()).run().await?;
                info!(applied, "Database migrations complete");
            }

            info!("Using PostgreSQL storage");

            Ok(Repositories {
                api_keys: Arc::new(PostgresApiKeyRepository::new(pool.clone())),
                daily_usage: Arc::new(PostgresDailyUsageRepository::new(pool.clone())),
                identities: Arc::new(PostgresExternalIdentityRepository::new(pool)),
            })
        }
    }
}

async fn create_counter_store(config: &CounterStoreConfig) -> anyhow::Result<Arc<dyn CounterStore>> {
    match config.backend {
        CounterStoreBackend::Memory => {
            info!("Using in-memory counter store; counters are per-process");
            Ok(Arc::new(InMemoryCounterStore::new()))
        }
        CounterStoreBackend::Redis => {
            let store = RedisCounterStore::new(
                RedisCounterStoreConfig::new(config.redis_url.clone())
                    .with_key_prefix(config.key_prefix.clone()),
            )
            .await?;

            info!("Using Redis counter store");
            Ok(Arc::new(store))
        }
    }
}

fn create_hasher(config: &ApiKeysConfig) -> SecretHasher {
    match config.hash_pepper.as_deref() {
        Some(pepper) => SecretHasher::new().with_pepper(pepper),
        None => SecretHasher::new(),
    }
}
