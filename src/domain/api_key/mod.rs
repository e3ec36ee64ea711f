//! API Key domain
//!
//! Domain types and traits for developer API credentials: the stored key
//! record, its lifecycle, and the durable key store contract.

mod entity;
mod repository;
mod validation;

pub use entity::{
    clamp_rate_limit_rpm, ApiKey, ApiKeyId, ApiKeyStatus, OwnerId, DEFAULT_RATE_LIMIT_RPM,
    MAX_RATE_LIMIT_RPM, MIN_RATE_LIMIT_RPM,
};
pub use repository::ApiKeyRepository;
pub use validation::{validate_label, ApiKeyValidationError, MAX_LABEL_LENGTH};

#[cfg(test)]
pub use repository::mock::MockApiKeyRepository;
