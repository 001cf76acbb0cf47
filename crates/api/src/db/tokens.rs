//! Bearer token repository.
//!
//! Only the SHA-256 hash of a token is stored; the plaintext exists solely
//! in the response that issued it.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use horologe_core::UserId;

use super::RepositoryError;
use crate::models::User;

/// Token storage.
#[async_trait]
pub trait TokenRepository: Send + Sync {
    async fn insert(
        &self,
        token_hash: &str,
        user_id: UserId,
        expires_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError>;

    /// The owner of a token that has not expired as of `now`.
    async fn find_user(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<User>, RepositoryError>;

    /// Delete a token. Returns whether it existed.
    async fn revoke(&self, token_hash: &str) -> Result<bool, RepositoryError>;

    /// Delete every token that expired before `now`. Returns how many.
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, RepositoryError>;
}

/// `PostgreSQL`-backed [`TokenRepository`].
#[derive(Debug, Clone)]
pub struct PgTokenRepository {
    pool: PgPool,
}

impl PgTokenRepository {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TokenRepository for PgTokenRepository {
    async fn insert(
        &self,
        token_hash: &str,
        user_id: UserId,
        expires_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO shop.api_token (token_hash, user_id, expires_at)
            VALUES ($1, $2, $3)
            ",
        )
        .bind(token_hash)
        .bind(user_id)
        .bind(expires_at)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::from_insert(e, "token"))?;
        Ok(())
    }

    async fn find_user(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(
            r"
            SELECT u.id, u.first_name, u.last_name, u.email, u.is_admin,
                   u.created_at, u.updated_at
            FROM shop.api_token t
            JOIN shop.user u ON u.id = t.user_id
            WHERE t.token_hash = $1 AND t.expires_at > $2
            ",
        )
        .bind(token_hash)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn revoke(&self, token_hash: &str) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.api_token WHERE token_hash = $1")
            .bind(token_hash)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.api_token WHERE expires_at <= $1")
            .bind(now)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
