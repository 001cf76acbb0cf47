//! User repository.

use async_trait::async_trait;
use sqlx::PgPool;

use horologe_core::{Email, UserId};

use super::RepositoryError;
use crate::models::{NewUser, ProfileChanges, User};

const USER_COLUMNS: &str = "id, first_name, last_name, email, is_admin, created_at, updated_at";

/// Account storage.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert an account.
    ///
    /// Returns `RepositoryError::Conflict` if the email is already registered.
    async fn create(&self, user: NewUser) -> Result<User, RepositoryError>;

    async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError>;

    async fn get_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError>;

    /// Get a user together with their password hash, for login.
    async fn get_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError>;

    /// Apply a partial profile update. Returns `None` if the user is gone.
    async fn update_profile(
        &self,
        id: UserId,
        changes: ProfileChanges,
    ) -> Result<Option<User>, RepositoryError>;

    /// Grant or revoke administrator rights.
    async fn set_admin(&self, id: UserId, is_admin: bool) -> Result<Option<User>, RepositoryError>;

    /// Number of non-administrator accounts.
    async fn count_customers(&self) -> Result<i64, RepositoryError>;
}

#[derive(sqlx::FromRow)]
struct CredentialRow {
    #[sqlx(flatten)]
    user: User,
    password_hash: String,
}

/// `PostgreSQL`-backed [`UserRepository`].
#[derive(Debug, Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create(&self, user: NewUser) -> Result<User, RepositoryError> {
        sqlx::query_as::<_, User>(&format!(
            r"
            INSERT INTO shop.user (first_name, last_name, email, password_hash, is_admin)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {USER_COLUMNS}
            "
        ))
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.is_admin)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| RepositoryError::from_insert(e, "email"))
    }

    async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM shop.user WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn get_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM shop.user WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn get_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let row = sqlx::query_as::<_, CredentialRow>(&format!(
            "SELECT {USER_COLUMNS}, password_hash FROM shop.user WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|r| (r.user, r.password_hash)))
    }

    async fn update_profile(
        &self,
        id: UserId,
        changes: ProfileChanges,
    ) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(&format!(
            r"
            UPDATE shop.user
            SET first_name = COALESCE($2, first_name),
                last_name = COALESCE($3, last_name),
                password_hash = COALESCE($4, password_hash),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "
        ))
        .bind(id)
        .bind(changes.first_name)
        .bind(changes.last_name)
        .bind(changes.password_hash)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn set_admin(&self, id: UserId, is_admin: bool) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(&format!(
            r"
            UPDATE shop.user
            SET is_admin = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "
        ))
        .bind(id)
        .bind(is_admin)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn count_customers(&self) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM shop.user WHERE NOT is_admin")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
