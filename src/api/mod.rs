//! API layer - HTTP endpoints and middleware

pub mod health;
pub mod internal;
pub mod middleware;
pub mod portal;
pub mod router;
pub mod state;
pub mod types;
pub mod v1;

pub use router::create_router;
pub use state::AppState;
