//! Integration tests for accounts and bearer tokens.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use serde_json::json;

use horologe_integration_tests::{ADMIN_EMAIL, ADMIN_PASSWORD, TestContext};

#[tokio::test]
async fn test_health_endpoints() {
    let ctx = TestContext::new();

    let (status, body) = ctx.get("/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "ok");

    let (status, _) = ctx.get("/health/ready", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_register_then_profile() {
    let ctx = TestContext::new();
    let token = ctx.register("Shopper@Example.com").await;

    let (status, profile) = ctx.get("/api/auth/profile", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["email"], "shopper@example.com");
    assert_eq!(profile["firstName"], "Test");
    assert_eq!(profile["isAdmin"], false);
}

#[tokio::test]
async fn test_duplicate_registration_conflicts() {
    let ctx = TestContext::new();
    ctx.register("dup@example.com").await;

    let (status, body) = ctx
        .post(
            "/api/auth/register",
            None,
            json!({
                "firstName": "Again",
                "email": "DUP@example.com",
                "password": "another-password",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["message"].as_str().unwrap().contains("already exists"));
}

#[tokio::test]
async fn test_registration_validation() {
    let ctx = TestContext::new();

    let (status, body) = ctx
        .post(
            "/api/auth/register",
            None,
            json!({ "firstName": "A", "email": "a@example.com", "password": "short" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_string());

    let (status, _) = ctx
        .post(
            "/api/auth/register",
            None,
            json!({ "firstName": "A", "email": "no-at-sign", "password": "long enough" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Missing required field is a JSON rejection, still rendered as {message}
    let (status, body) = ctx
        .post("/api/auth/register", None, json!({ "email": "a@example.com" }))
        .await;
    assert!(status.is_client_error());
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn test_login_failures_are_unauthorized() {
    let ctx = TestContext::new();
    ctx.register("shopper@example.com").await;

    let (status, body) = ctx
        .post(
            "/api/auth/login",
            None,
            json!({ "email": "shopper@example.com", "password": "wrong-password" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid email or password");

    let (status, body) = ctx
        .post(
            "/api/auth/login",
            None,
            json!({ "email": "shopper@example.com", "password": "customer-password" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["token"].is_string());
    assert_eq!(body["user"]["email"], "shopper@example.com");
}

#[tokio::test]
async fn test_admin_login_rejects_customers() {
    let ctx = TestContext::new();
    ctx.register("shopper@example.com").await;

    let (status, _) = ctx
        .post(
            "/api/auth/admin/login",
            None,
            json!({ "email": "shopper@example.com", "password": "customer-password" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let token = ctx.admin_token().await;
    let (status, profile) = ctx.get("/api/auth/profile", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["email"], ADMIN_EMAIL);
    assert_eq!(profile["isAdmin"], true);

    let (status, _) = ctx
        .post(
            "/api/auth/login",
            None,
            json!({ "email": ADMIN_EMAIL, "password": ADMIN_PASSWORD }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_missing_or_bad_token() {
    let ctx = TestContext::new();

    let (status, body) = ctx.get("/api/auth/profile", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Not authorized, no token");

    let (status, _) = ctx.get("/api/auth/profile", Some("not-a-real-token")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_revokes_token() {
    let ctx = TestContext::new();
    let token = ctx.register("shopper@example.com").await;

    let (status, _) = ctx.post("/api/auth/logout", Some(&token), json!({})).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = ctx.get("/api/auth/profile", Some(&token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_update_profile() {
    let ctx = TestContext::new();
    let token = ctx.register("shopper@example.com").await;

    let (status, profile) = ctx
        .put(
            "/api/auth/profile",
            Some(&token),
            json!({ "lastName": "Rao", "password": "brand-new-password" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["firstName"], "Test");
    assert_eq!(profile["lastName"], "Rao");

    let (status, _) = ctx
        .post(
            "/api/auth/login",
            None,
            json!({ "email": "shopper@example.com", "password": "brand-new-password" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    let ctx = TestContext::new();
    let response = ctx
        .app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("x-request-id", "req-123")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.headers()["x-request-id"], "req-123");

    let response = ctx
        .app
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert!(response.headers().contains_key("x-request-id"));
}
