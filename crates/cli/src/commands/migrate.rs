//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! horologe migrate
//! ```
//!
//! # Environment Variables
//!
//! - `HOROLOGE_DATABASE_URL` - `PostgreSQL` connection string (falls back to
//!   `DATABASE_URL`)
//!
//! Migrations live in `crates/api/migrations/` and are embedded in the
//! binary. The API server also applies them at startup.

use thiserror::Error;

use super::{DatabaseError, connect_pool};

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Apply all pending migrations.
///
/// # Errors
///
/// Returns `MigrationError` if the database is unreachable or a migration fails.
pub async fn run() -> Result<(), MigrationError> {
    let pool = connect_pool().await?;

    tracing::info!("Running migrations...");
    horologe_api::db::run_migrations(&pool).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
