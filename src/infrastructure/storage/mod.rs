//! Storage infrastructure - PostgreSQL pool and schema

mod migrations;
mod postgres;

pub use migrations::{Migration, PostgresMigrator, MIGRATIONS};
pub use postgres::{connect_pool, PostgresConfig};
pub(crate) use postgres::{map_insert_error, ping_pool};
