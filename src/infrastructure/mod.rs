//! Infrastructure layer - backing stores and service implementations

pub mod api_key;
pub mod auth;
pub mod counter;
pub mod crypto;
pub mod identity;
pub mod logging;
pub mod observability;
pub mod review;
pub mod storage;
pub mod usage;
