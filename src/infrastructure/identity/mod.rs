//! External identity infrastructure

mod in_memory;
mod postgres_repository;
mod resolver;

pub use in_memory::InMemoryExternalIdentityRepository;
pub use postgres_repository::PostgresExternalIdentityRepository;
pub use resolver::ExternalIdentityResolver;
