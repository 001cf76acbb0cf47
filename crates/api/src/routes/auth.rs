//! Account route handlers.

use axum::{Json, extract::State, http::StatusCode};
use serde_json::{Value, json};
use tracing::instrument;

use horologe_core::{AuthResponse, LoginRequest, RegisterRequest, UpdateProfileRequest, UserProfile};

use super::ApiJson;
use crate::error::Result;
use crate::middleware::{BearerToken, RequireAuth};
use crate::state::AppState;

/// POST /api/auth/register
#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>)> {
    let response = state.auth().register(request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// POST /api/auth/login
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<Json<AuthResponse>> {
    Ok(Json(state.auth().login(request).await?))
}

/// POST /api/auth/admin/login
#[instrument(skip_all)]
pub async fn admin_login(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<Json<AuthResponse>> {
    Ok(Json(state.auth().admin_login(request).await?))
}

/// POST /api/auth/logout
///
/// Revokes the token the request was made with.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn logout(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    BearerToken(token): BearerToken,
) -> Result<Json<Value>> {
    state.auth().logout(&token).await?;
    Ok(Json(json!({ "message": "Logged out" })))
}

/// GET /api/auth/profile
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn profile(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<UserProfile>> {
    Ok(Json(state.auth().profile(user.id).await?))
}

/// PUT /api/auth/profile
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn update_profile(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(request): ApiJson<UpdateProfileRequest>,
) -> Result<Json<UserProfile>> {
    Ok(Json(state.auth().update_profile(user.id, request).await?))
}
