//! Request access domain: who is calling and why a call may be refused

mod error;
mod principal;

pub use error::{AccessError, AuthError, InfrastructureError, RateLimitError};
pub use principal::{Principal, RateLimitDecision};
