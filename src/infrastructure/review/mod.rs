//! Review sinks

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::info;

use crate::domain::review::{Review, ReviewSink};
use crate::domain::DomainError;

/// Keeps accepted reviews in memory until the catalog picks them up
#[derive(Debug, Default, Clone)]
pub struct InMemoryReviewSink {
    reviews: Arc<RwLock<Vec<Review>>>,
}

impl InMemoryReviewSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn reviews(&self) -> Vec<Review> {
        self.reviews.read().await.clone()
    }
}

#[async_trait]
impl ReviewSink for InMemoryReviewSink {
    async fn submit(&self, review: Review) -> Result<(), DomainError> {
        info!(
            review_id = %review.id,
            key_id = %review.key_id,
            anon_id = %review.anon_id,
            listing_id = %review.listing_id,
            "Review accepted"
        );
        self.reviews.write().await.push(review);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::api_key::ApiKeyId;
    use crate::domain::identity::AnonId;

    #[tokio::test]
    async fn test_submit_stores_review() {
        let sink = InMemoryReviewSink::new();
        let review = Review::new(ApiKeyId::generate(), AnonId::generate(), "l-1", 4, None).unwrap();

        sink.submit(review.clone()).await.unwrap();
        assert_eq!(sink.reviews().await, vec![review]);
    }
}
