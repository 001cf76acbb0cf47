//! Order route handlers.
//!
//! Every route requires a bearer token. Ownership and admin checks happen
//! in [`crate::services::orders::OrderService`].

use axum::{Json, body::Bytes, extract::State, http::StatusCode};
use serde::de::DeserializeOwned;
use tracing::instrument;

use horologe_core::{CreateOrderRequest, MarkPaidRequest, Order, OrderId, SetStatusRequest};

use super::{ApiJson, ApiPath};
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::state::AppState;

/// POST /api/orders
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(request): ApiJson<CreateOrderRequest>,
) -> Result<(StatusCode, Json<Order>)> {
    let order = state.orders().create(&user, request).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// GET /api/orders (admin)
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<Order>>> {
    Ok(Json(state.orders().list_all(&user).await?))
}

/// GET /api/orders/myorders and GET /api/orders/user
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn mine(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<Order>>> {
    Ok(Json(state.orders().list_for_user(&user).await?))
}

/// GET /api/orders/{id}
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiPath(id): ApiPath<OrderId>,
) -> Result<Json<Order>> {
    Ok(Json(state.orders().get_by_id(id, &user).await?))
}

/// PUT /api/orders/{id}/pay
///
/// The body is optional; missing payment details get defaults.
#[instrument(skip(state, user, body), fields(user_id = %user.id))]
pub async fn pay(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiPath(id): ApiPath<OrderId>,
    body: Bytes,
) -> Result<Json<Order>> {
    let request = parse_optional_body(&body)?;
    Ok(Json(state.orders().mark_paid(id, &user, request).await?))
}

/// PUT /api/orders/{id}/status (admin)
#[instrument(skip(state, user, request), fields(user_id = %user.id))]
pub async fn set_status(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiPath(id): ApiPath<OrderId>,
    ApiJson(request): ApiJson<SetStatusRequest>,
) -> Result<Json<Order>> {
    Ok(Json(
        state.orders().set_status(id, &user, &request.status).await?,
    ))
}

/// PUT /api/orders/{id}/deliver (admin)
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn deliver(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiPath(id): ApiPath<OrderId>,
) -> Result<Json<Order>> {
    Ok(Json(state.orders().mark_delivered(id, &user).await?))
}

/// Deserialize a JSON body that may be absent entirely.
fn parse_optional_body<T: DeserializeOwned + Default>(body: &[u8]) -> Result<T> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|e| AppError::BadRequest(format!("invalid JSON body: {e}")))
}
