//! User API tests.
//!
//! These tests require a running PostgreSQL database.
//! Set DATABASE_URL environment variable before running.

mod common;

use axum::http::{header::AUTHORIZATION, StatusCode};
use axum_test::TestServer;

use common::fixtures;
use common::TestContext;

/// Test registering a new user returns a token.
#[tokio::test]
#[ignore = "requires database"]
async fn test_register_user() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router()).unwrap();

    let response = server
        .post("/api/users/register")
        .json(&fixtures::user_register_request(Some("Ada")))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    let token = body["token"].as_str().unwrap();
    assert!(!token.is_empty());

    let user = ctx.db.get_user_by_token(token).await.unwrap().unwrap();
    assert_eq!(user.name.as_deref(), Some("Ada"));

    ctx.cleanup_user(user.id).await;
}

/// Test the current user endpoint.
#[tokio::test]
#[ignore = "requires database"]
async fn test_me() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router()).unwrap();
    let (user_id, token) = ctx.create_test_user(Some("Grace")).await;

    let body = fixtures::get_json(&server, &token, "/api/users/me").await;

    assert_eq!(body["user_id"], user_id.to_string());
    assert_eq!(body["name"], "Grace");

    ctx.cleanup_user(user_id).await;
}

/// Test protected routes reject missing and unknown tokens.
#[tokio::test]
#[ignore = "requires database"]
async fn test_unauthorized() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router()).unwrap();

    let response = server.get("/api/summary").await;
    response.assert_status(StatusCode::UNAUTHORIZED);

    let response = server
        .get("/api/subjects")
        .add_header(AUTHORIZATION, TestContext::auth_header_value("not-a-token"))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"], "unauthorized");
}

/// Test health check needs no token.
#[tokio::test]
#[ignore = "requires database"]
async fn test_health() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router()).unwrap();

    let response = server.get("/health").await;
    response.assert_status_ok();
    response.assert_text("OK");
}
