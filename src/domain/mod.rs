//! Domain layer - Core business logic and entities

pub mod access;
pub mod api_key;
pub mod counter;
pub mod error;
pub mod identity;
pub mod review;
pub mod usage;

pub use access::{AccessError, AuthError, InfrastructureError, Principal, RateLimitError};
pub use api_key::{ApiKey, ApiKeyId, ApiKeyRepository, ApiKeyStatus, OwnerId};
pub use counter::{CounterStore, WindowOutcome};
pub use error::DomainError;
pub use identity::{AnonId, ExternalIdentityMapping, ExternalIdentityRepository};
pub use review::{Review, ReviewSink};
pub use usage::{DailyUsageRecord, DailyUsageRepository, UsageSummary};
