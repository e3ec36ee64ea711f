//! API middleware components

pub mod auth;
pub mod logging;
pub mod metrics;
pub mod portal_auth;
pub mod security;

pub use auth::{extract_credential, require_api_key, ApiPrincipal};
pub use logging::logging_middleware;
pub use metrics::metrics_middleware;
pub use portal_auth::PortalOwner;
pub use security::security_headers_middleware;
