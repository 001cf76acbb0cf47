//! CLI command implementations.

pub mod admin;
pub mod cart;
pub mod migrate;
pub mod seed;

use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;

use horologe_api::db::{self, Repositories};

/// Storage timeout for CLI operations.
pub const DB_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors shared by the database-backed commands.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0} (or DATABASE_URL)")]
    MissingEnvVar(&'static str),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Connect(#[from] sqlx::Error),
}

/// Read the database URL, falling back to the generic `DATABASE_URL`.
fn database_url() -> Result<SecretString, DatabaseError> {
    dotenvy::dotenv().ok();

    std::env::var("HOROLOGE_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .ok()
        .filter(|url| !url.trim().is_empty())
        .map(SecretString::from)
        .ok_or(DatabaseError::MissingEnvVar("HOROLOGE_DATABASE_URL"))
}

/// Connect to `PostgreSQL` and return the pool.
async fn connect_pool() -> Result<sqlx::PgPool, DatabaseError> {
    let url = database_url()?;
    tracing::info!("Connecting to database...");
    Ok(db::create_pool(&url).await?)
}

/// Connect to `PostgreSQL` and wrap the pool in repositories.
async fn connect() -> Result<Repositories, DatabaseError> {
    Ok(Repositories::postgres(connect_pool().await?))
}
