//! Integration tests for Horologe.
//!
//! The tests drive the real router with `tower::ServiceExt::oneshot` over
//! the in-memory storage backend, so no database or running server is
//! needed:
//!
//! ```bash
//! cargo test -p horologe-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `api_auth` - Registration, login, tokens, profile
//! - `api_products` - Catalog listing and admin CRUD
//! - `api_orders` - Order lifecycle, ownership, dashboard
//! - `checkout` - Cart checkout against a live listener

#![allow(clippy::missing_panics_doc, clippy::unwrap_used)]

use std::net::SocketAddr;
use std::path::PathBuf;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use serde_json::{Value, json};
use tower::ServiceExt;

use horologe_api::config::ApiConfig;
use horologe_api::db::Repositories;
use horologe_api::state::AppState;
use horologe_core::RegisterRequest;

/// Upper bound on response bodies read by tests.
const MAX_BODY: usize = 1024 * 1024;

pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const ADMIN_PASSWORD: &str = "admin-password";

/// A router over a fresh in-memory store.
pub struct TestContext {
    pub state: AppState,
    pub app: Router,
}

impl TestContext {
    /// Build a context whose `/uploads` is served from a nonexistent directory.
    #[must_use]
    pub fn new() -> Self {
        Self::with_uploads(PathBuf::from("does-not-exist"))
    }

    #[must_use]
    pub fn with_uploads(uploads_dir: PathBuf) -> Self {
        let config = ApiConfig {
            uploads_dir,
            ..ApiConfig::default()
        };
        let state = AppState::new(config, Repositories::in_memory());
        let app = horologe_api::app(state.clone());
        Self { state, app }
    }

    /// Send a request and return the status and decoded JSON body.
    ///
    /// Non-JSON bodies come back as a JSON string.
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), MAX_BODY)
            .await
            .unwrap();
        let value = serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
        (status, value)
    }

    pub async fn get(&self, path: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send(Method::GET, path, token, None).await
    }

    pub async fn post(&self, path: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, path, token, Some(body)).await
    }

    pub async fn put(&self, path: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send(Method::PUT, path, token, Some(body)).await
    }

    /// Register a customer and return their token.
    pub async fn register(&self, email: &str) -> String {
        let (status, body) = self
            .post(
                "/api/auth/register",
                None,
                json!({
                    "firstName": "Test",
                    "lastName": "Customer",
                    "email": email,
                    "password": "customer-password",
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["token"].as_str().unwrap().to_owned()
    }

    /// Create the administrator account and return an admin token.
    pub async fn admin_token(&self) -> String {
        self.state
            .auth()
            .create_account(
                RegisterRequest {
                    first_name: "Admin".into(),
                    last_name: "User".into(),
                    email: ADMIN_EMAIL.into(),
                    password: ADMIN_PASSWORD.into(),
                },
                true,
            )
            .await
            .unwrap();

        let (status, body) = self
            .post(
                "/api/auth/admin/login",
                None,
                json!({ "email": ADMIN_EMAIL, "password": ADMIN_PASSWORD }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body["token"].as_str().unwrap().to_owned()
    }

    /// Create a product as `admin_token` and return its id.
    pub async fn create_product(
        &self,
        admin_token: &str,
        name: &str,
        price: &str,
        category: &str,
        is_bestseller: bool,
    ) -> i64 {
        let (status, body) = self
            .post(
                "/api/products",
                Some(admin_token),
                json!({
                    "name": name,
                    "description": format!("{name} description"),
                    "price": price,
                    "image": "watch1.jpg",
                    "category": category,
                    "isBestseller": is_bestseller,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["id"].as_i64().unwrap()
    }

    /// Serve the router on an ephemeral local port.
    pub async fn spawn(&self) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = self.app.clone();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

/// A complete shipping address as JSON.
#[must_use]
pub fn shipping_address() -> Value {
    json!({
        "firstName": "Asha",
        "lastName": "Rao",
        "email": "asha@example.com",
        "address": "12 MG Road",
        "city": "Bengaluru",
        "state": "Karnataka",
        "postalCode": "560001",
        "country": "India",
        "phone": "+91 98450 00000",
    })
}

/// An order body with one line of `quantity` units of product `id`.
#[must_use]
pub fn order_body(product_id: i64, unit_price: &str, quantity: u32, total: &str) -> Value {
    json!({
        "orderItems": [{
            "productId": product_id,
            "name": "Classic Silver Watch",
            "unitPrice": unit_price,
            "imageUrl": "watch1.jpg",
            "quantity": quantity,
        }],
        "shippingAddress": shipping_address(),
        "paymentMethod": "Cash on Delivery",
        "totalPrice": total,
    })
}
