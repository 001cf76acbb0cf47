//! Storage layer.
//!
//! Every table is reached through a repository trait so the API can run on
//! `PostgreSQL` or, when no database is configured, on an in-memory store.
//!
//! # Schema: `shop`
//!
//! - `user` - Customer and administrator accounts
//! - `api_token` - Hashed bearer tokens with expiry
//! - `product` - Watch catalog
//! - `customer_order` - Orders with JSONB line-item snapshots
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/` and run via:
//! ```bash
//! cargo run -p horologe-cli -- migrate
//! ```

pub mod memory;
pub mod orders;
pub mod products;
pub mod tokens;
pub mod users;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use memory::MemoryStore;
pub use orders::{OrderRepository, PgOrderRepository};
pub use products::{PgProductRepository, ProductRepository};
pub use tokens::{PgTokenRepository, TokenRepository};
pub use users::{PgUserRepository, UserRepository};

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// The operation did not finish within the configured limit.
    #[error("storage did not respond within {0:?}")]
    Timeout(Duration),
}

impl RepositoryError {
    /// Map a unique-constraint violation to `Conflict`, anything else to `Database`.
    pub(crate) fn from_insert(error: sqlx::Error, what: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = error
            && db_err.is_unique_violation()
        {
            return Self::Conflict(format!("{what} already exists"));
        }
        Self::Database(error)
    }
}

/// Run a storage operation with an upper bound on its duration.
///
/// # Errors
///
/// Returns `RepositoryError::Timeout` if `operation` does not complete
/// within `limit`, otherwise whatever the operation returns.
pub async fn with_timeout<T, F>(limit: Duration, operation: F) -> Result<T, RepositoryError>
where
    F: Future<Output = Result<T, RepositoryError>>,
{
    tokio::time::timeout(limit, operation)
        .await
        .map_err(|_| RepositoryError::Timeout(limit))?
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Apply pending schema migrations.
///
/// # Errors
///
/// Returns `sqlx::migrate::MigrateError` if a migration fails.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

/// The full set of repositories the services work against.
#[derive(Clone)]
pub struct Repositories {
    pub orders: Arc<dyn OrderRepository>,
    pub products: Arc<dyn ProductRepository>,
    pub users: Arc<dyn UserRepository>,
    pub tokens: Arc<dyn TokenRepository>,
    pool: Option<PgPool>,
}

impl Repositories {
    /// Repositories backed by `PostgreSQL`.
    #[must_use]
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            orders: Arc::new(PgOrderRepository::new(pool.clone())),
            products: Arc::new(PgProductRepository::new(pool.clone())),
            users: Arc::new(PgUserRepository::new(pool.clone())),
            tokens: Arc::new(PgTokenRepository::new(pool.clone())),
            pool: Some(pool),
        }
    }

    /// Repositories backed by a fresh, empty in-memory store.
    #[must_use]
    pub fn in_memory() -> Self {
        let store = Arc::new(MemoryStore::default());
        Self {
            orders: store.clone(),
            products: store.clone(),
            users: store.clone(),
            tokens: store,
            pool: None,
        }
    }

    /// Whether data lives in `PostgreSQL` (as opposed to process memory).
    #[must_use]
    pub const fn is_persistent(&self) -> bool {
        self.pool.is_some()
    }

    /// Check that the backing store is reachable.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the database does not answer.
    pub async fn ping(&self) -> Result<(), RepositoryError> {
        if let Some(pool) = &self.pool {
            sqlx::query("SELECT 1").execute(pool).await?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for Repositories {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repositories")
            .field("persistent", &self.is_persistent())
            .finish_non_exhaustive()
    }
}
