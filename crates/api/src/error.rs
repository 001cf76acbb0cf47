//! Unified error handling with Sentry integration.
//!
//! Every handler returns `Result<T, AppError>`. Failures are rendered as
//! `{"message": "..."}`; server-side errors are captured to Sentry and their
//! details withheld from the client.

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::auth::AuthError;
use crate::services::catalog::CatalogError;
use crate::services::orders::OrderError;

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Order error: {0}")]
    Order(#[from] OrderError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Caller is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Caller is authenticated but lacks the required role.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// The repository failure behind this error, if there is one.
    const fn repository(&self) -> Option<&RepositoryError> {
        match self {
            Self::Database(e)
            | Self::Order(OrderError::Repository(e))
            | Self::Catalog(CatalogError::Repository(e))
            | Self::Auth(AuthError::Repository(e)) => Some(e),
            _ => None,
        }
    }

    fn status(&self) -> StatusCode {
        if let Some(err) = self.repository() {
            return match err {
                RepositoryError::Timeout(_) => StatusCode::SERVICE_UNAVAILABLE,
                RepositoryError::NotFound => StatusCode::NOT_FOUND,
                RepositoryError::Conflict(_) => StatusCode::CONFLICT,
                RepositoryError::Database(_) | RepositoryError::DataCorruption(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            };
        }

        match self {
            Self::Order(err) => match err {
                OrderError::Validation(_) => StatusCode::BAD_REQUEST,
                OrderError::NotFound(_) => StatusCode::NOT_FOUND,
                OrderError::Forbidden => StatusCode::FORBIDDEN,
                OrderError::InvalidState(_) => StatusCode::CONFLICT,
                OrderError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Catalog(err) => match err {
                CatalogError::Validation(_) => StatusCode::BAD_REQUEST,
                CatalogError::NotFound(_) => StatusCode::NOT_FOUND,
                CatalogError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials | AuthError::NotAdmin | AuthError::InvalidToken => {
                    StatusCode::UNAUTHORIZED
                }
                AuthError::UserNotFound => StatusCode::NOT_FOUND,
                AuthError::UserAlreadyExists => StatusCode::CONFLICT,
                AuthError::WeakPassword(_)
                | AuthError::InvalidEmail(_)
                | AuthError::Validation(_) => StatusCode::BAD_REQUEST,
                AuthError::Repository(_) | AuthError::PasswordHash => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-facing message. Internal details are never exposed.
    fn message(&self, status: StatusCode) -> String {
        if status == StatusCode::SERVICE_UNAVAILABLE {
            return "Service temporarily unavailable".to_owned();
        }
        if status.is_server_error() {
            return "Internal server error".to_owned();
        }
        if let Some(RepositoryError::Conflict(msg)) = self.repository() {
            return msg.clone();
        }
        match self {
            Self::Order(err) => err.to_string(),
            Self::Catalog(err) => err.to_string(),
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials => "Invalid email or password".to_owned(),
                AuthError::NotAdmin => "Not authorized as an admin".to_owned(),
                AuthError::InvalidToken => "Not authorized, token failed".to_owned(),
                AuthError::UserNotFound => "User not found".to_owned(),
                AuthError::UserAlreadyExists => {
                    "An account with this email already exists".to_owned()
                }
                AuthError::WeakPassword(msg) | AuthError::Validation(msg) => msg.clone(),
                AuthError::InvalidEmail(_) => "Invalid email address".to_owned(),
                AuthError::Repository(_) | AuthError::PasswordHash => {
                    "Authentication error".to_owned()
                }
            },
            Self::Database(_) => "Not found".to_owned(),
            Self::NotFound(msg)
            | Self::Unauthorized(msg)
            | Self::Forbidden(msg)
            | Self::BadRequest(msg)
            | Self::Internal(msg) => msg.clone(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let message = self.message(status);
        (status, Json(json!({ "message": message }))).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context for the authenticated caller.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}
