//! Review submissions handed to the catalog collaborator

use std::fmt::Debug;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::api_key::ApiKeyId;
use crate::domain::identity::AnonId;
use crate::domain::DomainError;

pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;
pub const MAX_REVIEW_BODY_LENGTH: usize = 5000;

/// A review attributed to a pseudonymous identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Review {
    pub id: Uuid,
    pub key_id: ApiKeyId,
    pub anon_id: AnonId,
    pub listing_id: String,
    pub rating: u8,
    pub body: Option<String>,
    pub submitted_at: DateTime<Utc>,
}

impl Review {
    /// Check the submitted fields without building a review
    pub fn validate_fields(
        listing_id: &str,
        rating: u8,
        body: Option<&str>,
    ) -> Result<(), DomainError> {
        if listing_id.trim().is_empty() {
            return Err(DomainError::validation("listing_id cannot be empty"));
        }

        if !(MIN_RATING..=MAX_RATING).contains(&rating) {
            return Err(DomainError::validation(format!(
                "rating must be between {} and {}",
                MIN_RATING, MAX_RATING
            )));
        }

        if let Some(text) = body {
            if text.chars().count() > MAX_REVIEW_BODY_LENGTH {
                return Err(DomainError::validation(format!(
                    "body exceeds maximum length of {} characters",
                    MAX_REVIEW_BODY_LENGTH
                )));
            }
        }

        Ok(())
    }

    pub fn new(
        key_id: ApiKeyId,
        anon_id: AnonId,
        listing_id: impl Into<String>,
        rating: u8,
        body: Option<String>,
    ) -> Result<Self, DomainError> {
        let listing_id = listing_id.into();
        Self::validate_fields(&listing_id, rating, body.as_deref())?;

        Ok(Self {
            id: Uuid::new_v4(),
            key_id,
            anon_id,
            listing_id,
            rating,
            body,
            submitted_at: Utc::now(),
        })
    }
}

/// Destination for accepted reviews (the catalog owns them from here)
#[async_trait]
pub trait ReviewSink: Send + Sync + Debug {
    async fn submit(&self, review: Review) -> Result<(), DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_review_validation() {
        let key = ApiKeyId::generate();

        assert!(Review::new(key, AnonId::generate(), "listing-1", 5, None).is_ok());
        assert!(Review::new(key, AnonId::generate(), " ", 5, None).is_err());
        assert!(Review::new(key, AnonId::generate(), "listing-1", 0, None).is_err());
        assert!(Review::new(key, AnonId::generate(), "listing-1", 6, None).is_err());

        let long = "a".repeat(MAX_REVIEW_BODY_LENGTH + 1);
        assert!(Review::new(key, AnonId::generate(), "listing-1", 3, Some(long)).is_err());
    }

    #[test]
    fn test_validate_fields_matches_new() {
        assert!(Review::validate_fields("listing-1", 1, Some("fine")).is_ok());
        assert!(matches!(
            Review::validate_fields("listing-1", 9, None),
            Err(DomainError::Validation { .. })
        ));
        assert!(Review::validate_fields("", 3, None).is_err());
    }
}
