//! Schema bootstrap
//!
//! Versioned migrations recorded in `_migrations`; each one is applied at most
//! once.

use sqlx::postgres::PgPool;
use tracing::info;

use crate::domain::DomainError;

/// A single, one-statement schema change
#[derive(Debug, Clone, Copy)]
pub struct Migration {
    pub version: i64,
    pub description: &'static str,
    pub up: &'static str,
}

pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "create api_keys",
        up: r#"
            CREATE TABLE IF NOT EXISTS api_keys (
                id UUID PRIMARY KEY,
                owner_id TEXT NOT NULL,
                label TEXT NOT NULL,
                key_hash TEXT NOT NULL UNIQUE,
                display_prefix TEXT NOT NULL,
                is_active BOOLEAN NOT NULL DEFAULT TRUE,
                rate_limit_rpm INTEGER NOT NULL DEFAULT 60,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                last_used_at TIMESTAMPTZ,
                expires_at TIMESTAMPTZ
            )
        "#,
    },
    Migration {
        version: 2,
        description: "index api_keys by owner",
        up: "CREATE INDEX IF NOT EXISTS idx_api_keys_owner ON api_keys (owner_id, created_at DESC)",
    },
    Migration {
        version: 3,
        description: "create daily_usage",
        up: r#"
            CREATE TABLE IF NOT EXISTS daily_usage (
                key_id UUID NOT NULL REFERENCES api_keys (id),
                usage_date DATE NOT NULL,
                request_count BIGINT NOT NULL DEFAULT 0,
                error_count BIGINT NOT NULL DEFAULT 0,
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                PRIMARY KEY (key_id, usage_date)
            )
        "#,
    },
    Migration {
        version: 4,
        description: "create external_identities",
        up: r#"
            CREATE TABLE IF NOT EXISTS external_identities (
                key_id UUID NOT NULL REFERENCES api_keys (id),
                external_user_hash TEXT NOT NULL,
                anon_id TEXT NOT NULL UNIQUE,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                PRIMARY KEY (key_id, external_user_hash)
            )
        "#,
    },
];

/// PostgreSQL migrator
#[derive(Debug)]
pub struct PostgresMigrator {
    pool: PgPool,
}

impl PostgresMigrator {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn ensure_migrations_table(&self) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS _migrations (
                version BIGINT PRIMARY KEY,
                description TEXT NOT NULL,
                installed_on TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to create migrations table: {}", e)))?;

        Ok(())
    }

    /// Apply every pending migration in version order
    pub async fn run(&self) -> Result<usize, DomainError> {
        self.ensure_migrations_table().await?;

        let mut applied_now = 0;
        for migration in MIGRATIONS {
            if self.run_migration(migration).await? {
                applied_now += 1;
            }
        }

        if applied_now > 0 {
            info!(count = applied_now, "Applied database migrations");
        }

        Ok(applied_now)
    }

    async fn run_migration(&self, migration: &Migration) -> Result<bool, DomainError> {
        let applied: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM _migrations WHERE version = $1)")
                .bind(migration.version)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| {
                    DomainError::storage(format!("Failed to check migration status: {}", e))
                })?;

        if applied {
            return Ok(false);
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DomainError::storage(format!("Failed to begin migration: {}", e)))?;

        sqlx::query(migration.up)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                DomainError::storage(format!(
                    "Failed to run migration {}: {}",
                    migration.version, e
                ))
            })?;

        sqlx::query("INSERT INTO _migrations (version, description) VALUES ($1, $2)")
            .bind(migration.version)
            .bind(migration.description)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                DomainError::storage(format!(
                    "Failed to record migration {}: {}",
                    migration.version, e
                ))
            })?;

        tx.commit()
            .await
            .map_err(|e| DomainError::storage(format!("Failed to commit migration: {}", e)))?;

        Ok(true)
    }
}
