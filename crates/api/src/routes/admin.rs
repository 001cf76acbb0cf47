//! Admin console route handlers.

use axum::{Json, extract::State};
use tracing::instrument;

use horologe_core::DashboardSummary;

use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::state::AppState;

/// GET /api/admin/dashboard
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn dashboard(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<DashboardSummary>> {
    Ok(Json(state.orders().dashboard_summary(&user).await?))
}
