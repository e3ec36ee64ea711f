//! Authentication infrastructure module
//!
//! Validation of developer-portal session tokens.

mod jwt;

pub use jwt::{PortalClaims, PortalTokenService};
