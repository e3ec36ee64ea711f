//! API Key infrastructure implementations
//!
//! Key generation, storage backends, validation, and rate limiting.

mod generator;
mod postgres_repository;
mod rate_limiter;
mod repository;
mod service;

pub use generator::{ApiKeyGenerator, GeneratedApiKey, DEFAULT_KEY_PREFIX};
pub use postgres_repository::PostgresApiKeyRepository;
pub use rate_limiter::{RateLimiter, RATE_LIMIT_WINDOW};
pub use repository::InMemoryApiKeyRepository;
pub use service::{ApiKeyService, ApiKeyServiceConfig, CreateApiKeyParams, CreateApiKeyResult};
