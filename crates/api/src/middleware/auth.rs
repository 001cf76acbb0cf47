//! Bearer token authentication extractors.
//!
//! ```rust,ignore
//! async fn my_orders(RequireAuth(user): RequireAuth, State(state): State<AppState>) { ... }
//! async fn dashboard(RequireAdmin(admin): RequireAdmin, ...) { ... }
//! ```

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::error::{AppError, set_sentry_user};
use crate::models::CurrentUser;
use crate::state::AppState;

/// The raw token from an `Authorization: Bearer <token>` header.
pub struct BearerToken(pub String);

impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(parse_bearer)
            .map(|token| Self(token.to_owned()))
            .ok_or_else(|| AppError::Unauthorized("Not authorized, no token".to_owned()))
    }
}

/// Extractor that requires a valid bearer token.
pub struct RequireAuth(pub CurrentUser);

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let BearerToken(token) = BearerToken::from_request_parts(parts, state).await?;
        let user = state.auth().authenticate(&token).await?;

        tracing::Span::current().record("user_id", tracing::field::display(user.id));
        set_sentry_user(&user.id, Some(user.email.as_str()));

        Ok(Self(user))
    }
}

/// Extractor that requires a valid bearer token of an administrator.
pub struct RequireAdmin(pub CurrentUser);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let RequireAuth(user) = RequireAuth::from_request_parts(parts, state).await?;
        if !user.is_admin {
            return Err(AppError::Forbidden("Not authorized as an admin".to_owned()));
        }
        Ok(Self(user))
    }
}

/// Extract the token from a `Bearer` authorization value.
fn parse_bearer(value: &str) -> Option<&str> {
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}
