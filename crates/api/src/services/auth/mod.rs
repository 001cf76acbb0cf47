//! Authentication service.
//!
//! Password accounts with Argon2id hashes, and opaque bearer tokens. A token
//! is 32 random bytes encoded as URL-safe base64; only its SHA-256 hex digest
//! is stored.

mod error;

pub use error::AuthError;

use std::time::Duration;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{TimeDelta, Utc};
use rand::RngCore;
use sha2::{Digest, Sha256};

use horologe_core::{
    AuthResponse, Email, LoginRequest, RegisterRequest, UpdateProfileRequest, UserId, UserProfile,
};

use crate::db::{Repositories, RepositoryError, with_timeout};
use crate::models::{CurrentUser, NewUser, ProfileChanges, User};

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Random bytes per bearer token.
const TOKEN_BYTES: usize = 32;

/// Authentication service.
///
/// Handles registration, login, token issue/lookup, and profile updates.
pub struct AuthService<'a> {
    repos: &'a Repositories,
    token_ttl: TimeDelta,
    timeout: Duration,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(repos: &'a Repositories, token_ttl: TimeDelta, timeout: Duration) -> Self {
        Self {
            repos,
            token_ttl,
            timeout,
        }
    }

    // =========================================================================
    // Accounts
    // =========================================================================

    /// Create an account and sign it in.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail`, `WeakPassword` or `Validation` for
    /// bad input and `AuthError::UserAlreadyExists` for a taken email.
    pub async fn register(&self, request: RegisterRequest) -> Result<AuthResponse, AuthError> {
        let user = self.create_account(request, false).await?;
        tracing::info!(user_id = %user.id, "user registered");
        self.sign_in(&user).await
    }

    /// Create an account without issuing a token. Used to bootstrap admins.
    ///
    /// # Errors
    ///
    /// Same as [`AuthService::register`].
    pub async fn create_account(
        &self,
        request: RegisterRequest,
        is_admin: bool,
    ) -> Result<User, AuthError> {
        let email = Email::parse(&request.email)?;
        let first_name = request.first_name.trim().to_owned();
        if first_name.is_empty() {
            return Err(AuthError::Validation("first name is required".to_owned()));
        }
        validate_password(&request.password)?;
        let password_hash = hash_password(&request.password)?;

        let new_user = NewUser {
            first_name,
            last_name: request.last_name.trim().to_owned(),
            email,
            password_hash,
            is_admin,
        };

        with_timeout(self.timeout, self.repos.users.create(new_user))
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })
    }

    /// Grant administrator rights to an existing account.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if no account has this email.
    pub async fn promote_to_admin(&self, email: &str) -> Result<User, AuthError> {
        let email = Email::parse(email)?;
        let user = with_timeout(self.timeout, self.repos.users.get_by_email(&email))
            .await?
            .ok_or(AuthError::UserNotFound)?;
        with_timeout(self.timeout, self.repos.users.set_admin(user.id, true))
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    /// Login with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    pub async fn login(&self, request: LoginRequest) -> Result<AuthResponse, AuthError> {
        let user = self.verify_credentials(&request).await?;
        self.sign_in(&user).await
    }

    /// Login for the admin console. Only administrators get a token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` for a wrong email/password and
    /// `AuthError::NotAdmin` for a customer account.
    pub async fn admin_login(&self, request: LoginRequest) -> Result<AuthResponse, AuthError> {
        let user = self.verify_credentials(&request).await?;
        if !user.is_admin {
            tracing::warn!(user_id = %user.id, "non-admin attempted admin login");
            return Err(AuthError::NotAdmin);
        }
        self.sign_in(&user).await
    }

    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if the account no longer exists.
    pub async fn profile(&self, user_id: UserId) -> Result<UserProfile, AuthError> {
        let user = with_timeout(self.timeout, self.repos.users.get_by_id(user_id))
            .await?
            .ok_or(AuthError::UserNotFound)?;
        Ok(user.profile())
    }

    /// Update names and/or password. Blank fields are ignored.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::WeakPassword` for a short new password and
    /// `AuthError::UserNotFound` if the account no longer exists.
    pub async fn update_profile(
        &self,
        user_id: UserId,
        request: UpdateProfileRequest,
    ) -> Result<UserProfile, AuthError> {
        let password_hash = match request.password.as_deref().filter(|p| !p.is_empty()) {
            Some(password) => {
                validate_password(password)?;
                Some(hash_password(password)?)
            }
            None => None,
        };

        let changes = ProfileChanges {
            first_name: trimmed(request.first_name),
            last_name: request.last_name.map(|s| s.trim().to_owned()),
            password_hash,
        };

        let user = with_timeout(self.timeout, self.repos.users.update_profile(user_id, changes))
            .await?
            .ok_or(AuthError::UserNotFound)?;
        Ok(user.profile())
    }

    // =========================================================================
    // Tokens
    // =========================================================================

    /// Resolve a bearer token to its (unexpired) owner.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` for unknown or expired tokens.
    pub async fn authenticate(&self, token: &str) -> Result<CurrentUser, AuthError> {
        let user = with_timeout(
            self.timeout,
            self.repos.tokens.find_user(&hash_token(token), Utc::now()),
        )
        .await?
        .ok_or(AuthError::InvalidToken)?;
        Ok(user.current())
    }

    /// Revoke a bearer token. Unknown tokens are ignored.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if storage fails.
    pub async fn logout(&self, token: &str) -> Result<(), AuthError> {
        with_timeout(self.timeout, self.repos.tokens.revoke(&hash_token(token))).await?;
        Ok(())
    }

    /// Delete expired tokens. Returns how many were removed.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if storage fails.
    pub async fn purge_expired_tokens(&self) -> Result<u64, AuthError> {
        Ok(with_timeout(self.timeout, self.repos.tokens.purge_expired(Utc::now())).await?)
    }

    async fn verify_credentials(&self, request: &LoginRequest) -> Result<User, AuthError> {
        let email = Email::parse(&request.email).map_err(|_| AuthError::InvalidCredentials)?;
        let (user, password_hash) =
            with_timeout(self.timeout, self.repos.users.get_password_hash(&email))
                .await?
                .ok_or(AuthError::InvalidCredentials)?;
        verify_password(&request.password, &password_hash)?;
        Ok(user)
    }

    async fn sign_in(&self, user: &User) -> Result<AuthResponse, AuthError> {
        let token = generate_token();
        let expires_at = Utc::now() + self.token_ttl;
        with_timeout(
            self.timeout,
            self.repos
                .tokens
                .insert(&hash_token(&token), user.id, expires_at),
        )
        .await?;

        Ok(AuthResponse {
            user: user.profile(),
            token,
        })
    }
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_owned())
        .filter(|s| !s.is_empty())
}

/// Validate password meets requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

/// A fresh random bearer token.
fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// The stored form of a token.
fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn service(repos: &Repositories) -> AuthService<'_> {
        AuthService::new(repos, TimeDelta::hours(24), Duration::from_secs(5))
    }

    fn register_request(email: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            first_name: "Asha".into(),
            last_name: "Rao".into(),
            email: email.into(),
            password: password.into(),
        }
    }

    fn login(email: &str, password: &str) -> LoginRequest {
        LoginRequest {
            email: email.into(),
            password: password.into(),
        }
    }

    #[test]
    fn test_password_round_trip() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("correct horse", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong horse", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_tokens_are_random_and_hashed() {
        let a = generate_token();
        let b = generate_token();
        assert_ne!(a, b);
        // 32 bytes -> 43 base64 chars without padding
        assert_eq!(a.len(), 43);
        let digest = hash_token(&a);
        assert_eq!(digest.len(), 64);
        assert_ne!(digest, a);
        assert_eq!(digest, hash_token(&a));
    }

    #[tokio::test]
    async fn test_register_login_authenticate() {
        let repos = Repositories::in_memory();
        let auth = service(&repos);

        let registered = auth
            .register(register_request(" Asha@Example.com ", "watchlover"))
            .await
            .unwrap();
        assert_eq!(registered.user.email.as_str(), "asha@example.com");
        assert!(!registered.user.is_admin);

        let current = auth.authenticate(&registered.token).await.unwrap();
        assert_eq!(current.id, registered.user.id);

        let logged_in = auth.login(login("asha@example.com", "watchlover")).await.unwrap();
        assert_ne!(logged_in.token, registered.token);

        assert!(matches!(
            auth.login(login("asha@example.com", "wrong-password")).await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            auth.login(login("nobody@example.com", "watchlover")).await,
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_registration_rules() {
        let repos = Repositories::in_memory();
        let auth = service(&repos);

        assert!(matches!(
            auth.register(register_request("a@example.com", "short")).await,
            Err(AuthError::WeakPassword(_))
        ));
        assert!(matches!(
            auth.register(register_request("not-an-email", "long enough")).await,
            Err(AuthError::InvalidEmail(_))
        ));

        auth.register(register_request("a@example.com", "long enough"))
            .await
            .unwrap();
        assert!(matches!(
            auth.register(register_request("A@example.com", "long enough")).await,
            Err(AuthError::UserAlreadyExists)
        ));
    }

    #[tokio::test]
    async fn test_admin_login_requires_admin() {
        let repos = Repositories::in_memory();
        let auth = service(&repos);
        auth.register(register_request("c@example.com", "customer!"))
            .await
            .unwrap();
        auth.create_account(register_request("admin@example.com", "administrator"), true)
            .await
            .unwrap();

        assert!(matches!(
            auth.admin_login(login("c@example.com", "customer!")).await,
            Err(AuthError::NotAdmin)
        ));
        let admin = auth
            .admin_login(login("admin@example.com", "administrator"))
            .await
            .unwrap();
        assert!(admin.user.is_admin);

        auth.promote_to_admin("c@example.com").await.unwrap();
        assert!(auth.admin_login(login("c@example.com", "customer!")).await.is_ok());
    }

    #[tokio::test]
    async fn test_expired_and_revoked_tokens_are_rejected() {
        let repos = Repositories::in_memory();
        let expired = AuthService::new(&repos, TimeDelta::seconds(-1), Duration::from_secs(5));
        let response = expired
            .register(register_request("a@example.com", "long enough"))
            .await
            .unwrap();
        assert!(matches!(
            expired.authenticate(&response.token).await,
            Err(AuthError::InvalidToken)
        ));
        assert_eq!(expired.purge_expired_tokens().await.unwrap(), 1);

        let auth = service(&repos);
        let response = auth.login(login("a@example.com", "long enough")).await.unwrap();
        auth.logout(&response.token).await.unwrap();
        assert!(matches!(
            auth.authenticate(&response.token).await,
            Err(AuthError::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn test_update_profile() {
        let repos = Repositories::in_memory();
        let auth = service(&repos);
        let response = auth
            .register(register_request("a@example.com", "long enough"))
            .await
            .unwrap();

        let profile = auth
            .update_profile(
                response.user.id,
                UpdateProfileRequest {
                    first_name: Some("  Meera ".into()),
                    last_name: None,
                    password: Some("new password".into()),
                },
            )
            .await
            .unwrap();
        assert_eq!(profile.first_name, "Meera");
        assert_eq!(profile.last_name, "Rao");

        assert!(auth.login(login("a@example.com", "new password")).await.is_ok());
        assert!(matches!(
            auth.update_profile(
                response.user.id,
                UpdateProfileRequest {
                    password: Some("short".into()),
                    ..UpdateProfileRequest::default()
                },
            )
            .await,
            Err(AuthError::WeakPassword(_))
        ));
    }
}
