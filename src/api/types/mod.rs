//! HTTP request/response types

pub mod access;
pub mod api_key;
pub mod error;
pub mod json;
pub mod query;

pub use access::{CreateReviewRequest, MeResponse, ReviewResponse, UsageQuery};
pub use api_key::{
    ApiKeyResponse, ApiKeysListResponse, CreateApiKeyRequest, CreateApiKeyResponse,
    RenameApiKeyRequest,
};
pub use error::{ApiError, ApiErrorResponse, UNAUTHORIZED_MESSAGE};
pub use json::Json;
pub use query::Query;
