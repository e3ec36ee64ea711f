//! API Key validation utilities

use thiserror::Error;

/// Errors that can occur during API key validation
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ApiKeyValidationError {
    #[error("Label cannot be empty")]
    EmptyLabel,

    #[error("Label exceeds maximum length of {0} characters")]
    LabelTooLong(usize),

    #[error("Owner ID cannot be empty")]
    EmptyOwner,

    #[error("Owner ID exceeds maximum length of {0} characters")]
    OwnerTooLong(usize),

    #[error("Invalid API key ID: '{0}'")]
    InvalidId(String),
}

pub const MAX_LABEL_LENGTH: usize = 100;

const MAX_OWNER_ID_LENGTH: usize = 128;

/// Validate a human-facing key label
///
/// Rules:
/// - Cannot be empty or whitespace only
/// - At most 100 characters once trimmed
pub fn validate_label(label: &str) -> Result<(), ApiKeyValidationError> {
    let trimmed = label.trim();

    if trimmed.is_empty() {
        return Err(ApiKeyValidationError::EmptyLabel);
    }

    if trimmed.chars().count() > MAX_LABEL_LENGTH {
        return Err(ApiKeyValidationError::LabelTooLong(MAX_LABEL_LENGTH));
    }

    Ok(())
}

pub fn validate_owner_id(id: &str) -> Result<(), ApiKeyValidationError> {
    if id.trim().is_empty() {
        return Err(ApiKeyValidationError::EmptyOwner);
    }

    if id.len() > MAX_OWNER_ID_LENGTH {
        return Err(ApiKeyValidationError::OwnerTooLong(MAX_OWNER_ID_LENGTH));
    }

    Ok(())
}
