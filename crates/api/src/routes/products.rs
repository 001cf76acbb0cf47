//! Product catalog route handlers.

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

use horologe_core::{NewProduct, Product, ProductCategory, ProductId, ProductPage, ProductUpdate};

use super::{ApiJson, ApiPath, ApiQuery};
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::services::catalog::{CatalogQuery, DEFAULT_PAGE_SIZE};
use crate::state::AppState;

/// Query string of `GET /api/products`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ListParams {
    /// `male`, `female`, or `all`.
    pub category: Option<String>,
    /// `true` restricts the listing to bestsellers.
    pub bestseller: Option<String>,
    pub search: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl ListParams {
    fn into_query(self) -> Result<CatalogQuery> {
        let category = match self.category.as_deref().map(str::trim) {
            None | Some("" | "all") => None,
            Some(name) => Some(
                name.parse::<ProductCategory>()
                    .map_err(AppError::BadRequest)?,
            ),
        };

        Ok(CatalogQuery {
            category,
            bestseller_only: self
                .bestseller
                .is_some_and(|b| b.eq_ignore_ascii_case("true")),
            search: self.search,
            page: self.page.unwrap_or(1),
            limit: self.limit.unwrap_or(DEFAULT_PAGE_SIZE),
        })
    }
}

/// GET /api/products
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<ListParams>,
) -> Result<Json<ProductPage>> {
    let query = params.into_query()?;
    Ok(Json(state.catalog().list(query).await?))
}

/// GET /api/products/{id}
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ProductId>,
) -> Result<Json<Product>> {
    Ok(Json(state.catalog().get(id).await?))
}

/// POST /api/products
#[instrument(skip_all, fields(admin_id = %admin.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiJson(product): ApiJson<NewProduct>,
) -> Result<(StatusCode, Json<Product>)> {
    let product = state.catalog().create(product).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// PUT /api/products/{id}
#[instrument(skip(state, admin, update), fields(admin_id = %admin.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiPath(id): ApiPath<ProductId>,
    ApiJson(update): ApiJson<ProductUpdate>,
) -> Result<Json<Product>> {
    Ok(Json(state.catalog().update(id, update).await?))
}

/// DELETE /api/products/{id}
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiPath(id): ApiPath<ProductId>,
) -> Result<Json<Value>> {
    state.catalog().delete(id).await?;
    Ok(Json(json!({ "message": "Product removed" })))
}
