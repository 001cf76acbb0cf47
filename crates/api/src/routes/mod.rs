//! HTTP route handlers for the API.
//!
//! # Route Structure
//!
//! ```text
//! # Auth
//! POST /api/auth/register       - Create account, returns token
//! POST /api/auth/login          - Password login
//! POST /api/auth/admin/login    - Password login, administrators only
//! POST /api/auth/logout         - Revoke the presented token
//! GET  /api/auth/profile        - Current user
//! PUT  /api/auth/profile        - Update names and/or password
//!
//! # Products
//! GET    /api/products          - Filtered, paginated listing
//! GET    /api/products/{id}     - Product detail
//! POST   /api/products          - Create (admin)
//! PUT    /api/products/{id}     - Partial update (admin)
//! DELETE /api/products/{id}     - Delete (admin)
//!
//! # Orders (requires auth)
//! POST /api/orders              - Place an order
//! GET  /api/orders              - All orders (admin)
//! GET  /api/orders/myorders     - Caller's orders
//! GET  /api/orders/user         - Alias of myorders
//! GET  /api/orders/{id}         - Order detail (owner or admin)
//! PUT  /api/orders/{id}/pay     - Record payment (owner or admin)
//! PUT  /api/orders/{id}/status  - Set fulfillment stage (admin)
//! PUT  /api/orders/{id}/deliver - Mark delivered (admin)
//!
//! # Admin
//! GET  /api/admin/dashboard     - Store summary
//! ```

pub mod admin;
pub mod auth;
pub mod orders;
pub mod products;

use axum::{
    Router,
    extract::{FromRequest, FromRequestParts},
    routing::{get, post, put},
};

use crate::error::AppError;
use crate::state::AppState;

/// `axum::Json` whose rejection renders as an [`AppError`].
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// `axum::extract::Path` whose rejection renders as an [`AppError`].
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct ApiPath<T>(pub T);

/// `axum::extract::Query` whose rejection renders as an [`AppError`].
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/admin/login", post(auth::admin_login))
        .route("/logout", post(auth::logout))
        .route("/profile", get(auth::profile).put(auth::update_profile))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index).post(products::create))
        .route(
            "/{id}",
            get(products::show)
                .put(products::update)
                .delete(products::delete),
        )
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index).post(orders::create))
        .route("/myorders", get(orders::mine))
        .route("/user", get(orders::mine))
        .route("/{id}", get(orders::show))
        .route("/{id}/pay", put(orders::pay))
        .route("/{id}/status", put(orders::set_status))
        .route("/{id}/deliver", put(orders::deliver))
}

/// Create the admin routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new().route("/dashboard", get(admin::dashboard))
}

/// Create all API routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/api/auth", auth_routes())
        .nest("/api/products", product_routes())
        .nest("/api/orders", order_routes())
        .nest("/api/admin", admin_routes())
}
