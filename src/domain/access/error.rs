//! Access-path error taxonomy
//!
//! Everything that can stop a request before it reaches a handler. Callers
//! branch only on these kinds, never on a backing-store library error.

use thiserror::Error;

/// Why a credential was not accepted. All variants surface as the same 401.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    #[error("no credential presented")]
    Missing,

    #[error("credential is malformed")]
    Malformed,

    #[error("credential is not known")]
    Unknown,

    #[error("credential has been revoked")]
    Revoked,

    #[error("credential has expired")]
    Expired,
}

impl AuthError {
    /// Label used for logs and metrics, never for responses
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Missing => "missing",
            Self::Malformed => "malformed",
            Self::Unknown => "unknown",
            Self::Revoked => "revoked",
            Self::Expired => "expired",
        }
    }
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitError {
    #[error("rate limit exceeded, retry in {retry_after_secs}s")]
    Exceeded { retry_after_secs: u64 },
}

impl RateLimitError {
    pub fn retry_after_secs(&self) -> u64 {
        match self {
            Self::Exceeded { retry_after_secs } => *retry_after_secs,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InfrastructureError {
    #[error("{store} unavailable: {message}")]
    StoreUnavailable { store: &'static str, message: String },
}

impl InfrastructureError {
    pub fn store_unavailable(store: &'static str, message: impl Into<String>) -> Self {
        Self::StoreUnavailable {
            store,
            message: message.into(),
        }
    }
}

/// Union of everything the access path can reject with
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AccessError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    RateLimited(#[from] RateLimitError),

    #[error(transparent)]
    Infrastructure(#[from] InfrastructureError),
}
