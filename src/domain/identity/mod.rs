//! External identity domain
//!
//! Pseudonymous identities for end users of an integration. Raw external
//! identifiers are never stored, only their fingerprints.

mod entity;
mod repository;

pub use entity::{
    validate_external_user_id, AnonId, ExternalIdentityMapping, IdentityValidationError,
    MAX_EXTERNAL_USER_ID_LENGTH,
};
pub use repository::ExternalIdentityRepository;
