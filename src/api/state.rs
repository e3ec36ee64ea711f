//! Application state for shared services

use std::sync::Arc;

use crate::domain::{CounterStore, ReviewSink};
use crate::infrastructure::api_key::{ApiKeyService, RateLimiter};
use crate::infrastructure::auth::PortalTokenService;
use crate::infrastructure::identity::ExternalIdentityResolver;
use crate::infrastructure::usage::{RollupJob, UsageCounter, UsageReporter, DEFAULT_HISTORY_DAYS};

/// Handles built once at startup and shared by every request
#[derive(Clone)]
pub struct AppState {
    pub api_key_service: Arc<ApiKeyService>,
    pub rate_limiter: Arc<RateLimiter>,
    pub usage_counter: Arc<UsageCounter>,
    pub usage_reporter: Arc<UsageReporter>,
    pub rollup_job: Arc<RollupJob>,
    pub identity_resolver: Arc<ExternalIdentityResolver>,
    pub review_sink: Arc<dyn ReviewSink>,
    pub counter_store: Arc<dyn CounterStore>,
    /// Portal routes reject every request when unset
    pub portal_tokens: Option<Arc<PortalTokenService>>,
    /// Rollup trigger secret; the endpoint is closed when unset
    pub rollup_secret: Option<Arc<str>>,
    pub default_history_days: u32,
}

impl AppState {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        api_key_service: Arc<ApiKeyService>,
        rate_limiter: Arc<RateLimiter>,
        usage_counter: Arc<UsageCounter>,
        usage_reporter: Arc<UsageReporter>,
        rollup_job: Arc<RollupJob>,
        identity_resolver: Arc<ExternalIdentityResolver>,
        review_sink: Arc<dyn ReviewSink>,
        counter_store: Arc<dyn CounterStore>,
    ) -> Self {
        Self {
            api_key_service,
            rate_limiter,
            usage_counter,
            usage_reporter,
            rollup_job,
            identity_resolver,
            review_sink,
            counter_store,
            portal_tokens: None,
            rollup_secret: None,
            default_history_days: DEFAULT_HISTORY_DAYS,
        }
    }

    pub fn with_portal_tokens(mut self, tokens: PortalTokenService) -> Self {
        self.portal_tokens = Some(Arc::new(tokens));
        self
    }

    pub fn with_rollup_secret(mut self, secret: impl Into<String>) -> Self {
        let secret = secret.into();
        self.rollup_secret = (!secret.is_empty()).then(|| Arc::from(secret));
        self
    }

    pub fn with_default_history_days(mut self, days: u32) -> Self {
        self.default_history_days = days;
        self
    }
}
