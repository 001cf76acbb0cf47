//! Integration tests for the product catalog.

#![allow(clippy::unwrap_used)]

use axum::http::{Method, StatusCode};
use serde_json::json;

use horologe_integration_tests::TestContext;

async fn seeded() -> (TestContext, String) {
    let ctx = TestContext::new();
    let admin = ctx.admin_token().await;
    ctx.create_product(&admin, "Classic Silver Watch", "199.99", "male", true)
        .await;
    ctx.create_product(&admin, "Gold Luxury Watch", "299.99", "female", true)
        .await;
    ctx.create_product(&admin, "Sport Black Watch", "149.99", "male", false)
        .await;
    ctx.create_product(&admin, "Rose Gold Watch", "249.99", "female", true)
        .await;
    (ctx, admin)
}

fn names(body: &serde_json::Value) -> Vec<String> {
    body["products"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap().to_owned())
        .collect()
}

#[tokio::test]
async fn test_listing_is_public_and_paginated() {
    let (ctx, _) = seeded().await;

    let (status, body) = ctx.get("/api/products", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["products"].as_array().unwrap().len(), 4);
    assert_eq!(body["totalPages"], 1);
    assert_eq!(body["currentPage"], 1);

    let (_, body) = ctx.get("/api/products?page=2&limit=3", None).await;
    assert_eq!(body["totalPages"], 2);
    assert_eq!(body["currentPage"], 2);
    assert_eq!(body["products"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_filters() {
    let (ctx, _) = seeded().await;

    let (_, body) = ctx.get("/api/products?category=female", None).await;
    let mut female = names(&body);
    female.sort();
    assert_eq!(female, ["Gold Luxury Watch", "Rose Gold Watch"]);

    let (_, body) = ctx.get("/api/products?category=all&bestseller=true", None).await;
    assert_eq!(names(&body).len(), 3);

    let (_, body) = ctx.get("/api/products?search=gold", None).await;
    assert_eq!(names(&body).len(), 2);

    let (status, body) = ctx.get("/api/products?category=kids", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn test_product_detail_resolves_image_url() {
    let (ctx, _) = seeded().await;
    let (_, body) = ctx.get("/api/products?search=sport", None).await;
    let id = body["products"][0]["id"].as_i64().unwrap();

    let (status, product) = ctx.get(&format!("/api/products/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(product["name"], "Sport Black Watch");
    assert_eq!(product["price"], "149.99");
    assert_eq!(product["image"], "watch1.jpg");
    assert_eq!(
        product["imageUrl"],
        "http://localhost:5000/uploads/watch1.jpg"
    );

    let (status, _) = ctx.get("/api/products/9999", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = ctx.get("/api/products/not-a-number", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_writes_require_admin() {
    let (ctx, _) = seeded().await;
    let customer = ctx.register("shopper@example.com").await;
    let body = json!({
        "name": "Pirate Watch",
        "description": "Arr",
        "price": "9.99",
        "image": "",
        "category": "male",
    });

    let (status, _) = ctx.post("/api/products", None, body.clone()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = ctx.post("/api/products", Some(&customer), body).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_admin_update_and_delete() {
    let (ctx, admin) = seeded().await;
    let id = ctx
        .create_product(&admin, "Diver Watch", "399.00", "male", false)
        .await;

    let (status, product) = ctx
        .put(
            &format!("/api/products/{id}"),
            Some(&admin),
            json!({ "inStock": false, "price": "379.00" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(product["inStock"], false);
    assert_eq!(product["price"], "379.00");
    assert_eq!(product["name"], "Diver Watch");

    let (status, body) = ctx
        .send(Method::DELETE, &format!("/api/products/{id}"), Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Product removed");

    let (status, _) = ctx.get(&format!("/api/products/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_uploads_are_served() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("watch1.jpg"), b"not really a jpeg").unwrap();
    let ctx = TestContext::with_uploads(dir.path().to_path_buf());

    let (status, body) = ctx.get("/uploads/watch1.jpg", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "not really a jpeg");

    let (status, _) = ctx.get("/uploads/missing.jpg", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
