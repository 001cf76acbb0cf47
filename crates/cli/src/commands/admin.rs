//! Admin account management commands.
//!
//! # Usage
//!
//! ```bash
//! # Create a new administrator
//! horologe admin create -e admin@example.com -f Ada -l Lovelace
//!
//! # Grant admin rights to an existing customer account
//! horologe admin promote -e shopper@example.com
//! ```
//!
//! # Environment Variables
//!
//! - `HOROLOGE_DATABASE_URL` - `PostgreSQL` connection string
//! - `HOROLOGE_ADMIN_PASSWORD` - Password for `admin create` when `--password`
//!   is not given

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use horologe_api::services::auth::{AuthError, AuthService};
use horologe_core::{RegisterRequest, UserId};

use super::{DB_TIMEOUT, DatabaseError, connect};

/// Errors that can occur during admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    #[error(transparent)]
    Database(#[from] DatabaseError),

    /// Admin user already exists.
    #[error("An account already exists with email: {0}")]
    UserExists(String),

    /// No account to promote.
    #[error("No account with email: {0}")]
    UserNotFound(String),

    #[error("{0}")]
    Auth(AuthError),
}

/// Create a new administrator account.
///
/// # Returns
///
/// The ID of the created user.
///
/// # Errors
///
/// Returns `AdminError` if the email is taken, the password is too short,
/// or the database is unreachable.
pub async fn create_user(
    email: &str,
    first_name: &str,
    last_name: &str,
    password: &SecretString,
) -> Result<UserId, AdminError> {
    let repos = connect().await?;
    let auth = AuthService::new(&repos, chrono::TimeDelta::zero(), DB_TIMEOUT);

    tracing::info!("Creating admin user: {}", email);

    let request = RegisterRequest {
        first_name: first_name.to_owned(),
        last_name: last_name.to_owned(),
        email: email.to_owned(),
        password: password.expose_secret().to_owned(),
    };
    let user = auth
        .create_account(request, true)
        .await
        .map_err(|e| match e {
            AuthError::UserAlreadyExists => AdminError::UserExists(email.to_owned()),
            other => AdminError::Auth(other),
        })?;

    tracing::info!(
        "Admin user created successfully! ID: {}, Email: {}",
        user.id,
        user.email
    );
    Ok(user.id)
}

/// Grant administrator rights to an existing account.
///
/// # Errors
///
/// Returns `AdminError::UserNotFound` if no account has this email.
pub async fn promote(email: &str) -> Result<UserId, AdminError> {
    let repos = connect().await?;
    let auth = AuthService::new(&repos, chrono::TimeDelta::zero(), DB_TIMEOUT);

    let user = auth.promote_to_admin(email).await.map_err(|e| match e {
        AuthError::UserNotFound => AdminError::UserNotFound(email.to_owned()),
        other => AdminError::Auth(other),
    })?;

    tracing::info!("{} is now an administrator (ID: {})", user.email, user.id);
    Ok(user.id)
}
