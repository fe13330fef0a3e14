//! Session API tests.
//!
//! These tests require a running PostgreSQL database.
//! Set DATABASE_URL environment variable before running.

mod common;

use axum::http::{header::AUTHORIZATION, StatusCode};
use axum_test::TestServer;
use uuid::Uuid;

use common::fixtures;
use common::TestContext;

/// Test sessions are titled from the subject's number sequence.
#[tokio::test]
#[ignore = "requires database"]
async fn test_session_numbering_never_reuses() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router()).unwrap();
    let (user_id, token) = ctx.create_test_user(None).await;
    let subject = fixtures::create_subject(&server, &token, "Math").await;
    let subject_id = subject["id"].as_str().unwrap();

    let first = fixtures::create_session(&server, &token, subject_id, 30, "pending").await;
    let second = fixtures::create_session(&server, &token, subject_id, 30, "pending").await;
    assert_eq!(first["title"], "S1");
    assert_eq!(second["title"], "S2");

    server
        .delete(&format!("/api/sessions/{}", second["id"].as_str().unwrap()))
        .add_header(AUTHORIZATION, TestContext::auth_header_value(&token))
        .await
        .assert_status_ok();

    let third = fixtures::create_session(&server, &token, subject_id, 30, "pending").await;
    assert_eq!(third["title"], "S3");

    let stored = fixtures::fetch_subject(&server, &token, subject_id).await;
    assert_eq!(stored["next_session_number"], 4);
    assert_eq!(stored["total_sessions"], 2);

    ctx.cleanup_user(user_id).await;
}

/// Test invalid session input is rejected without touching counters.
#[tokio::test]
#[ignore = "requires database"]
async fn test_create_session_validation() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router()).unwrap();
    let (user_id, token) = ctx.create_test_user(None).await;
    let subject = fixtures::create_subject(&server, &token, "Math").await;
    let subject_id = subject["id"].as_str().unwrap();

    let zero_duration = fixtures::new_session_request(subject_id, 0, "2024-01-12");
    fixtures::post_session(&server, &token, &zero_duration)
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    let bad_date = fixtures::new_session_request(subject_id, 30, "12/01/2024");
    fixtures::post_session(&server, &token, &bad_date)
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    let unknown = Uuid::new_v4().to_string();
    let unknown_subject = fixtures::new_session_request(&unknown, 30, "2024-01-12");
    fixtures::post_session(&server, &token, &unknown_subject)
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    let stored = fixtures::fetch_subject(&server, &token, subject_id).await;
    assert_eq!(stored["total_sessions"], 0);
    assert_eq!(stored["next_session_number"], 1);

    ctx.cleanup_user(user_id).await;
}

/// Test pending to completed moves one session into the completed counter.
#[tokio::test]
#[ignore = "requires database"]
async fn test_status_change_updates_counters() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router()).unwrap();
    let (user_id, token) = ctx.create_test_user(None).await;
    let subject = fixtures::create_subject(&server, &token, "Physics").await;
    let subject_id = subject["id"].as_str().unwrap();
    let session = fixtures::create_session(&server, &token, subject_id, 25, "pending").await;
    let path = format!("/api/sessions/{}/status", session["id"].as_str().unwrap());

    let before = fixtures::get_json(&server, &token, "/api/summary").await;

    let response = server
        .put(&path)
        .add_header(AUTHORIZATION, TestContext::auth_header_value(&token))
        .json(&fixtures::status_request("completed"))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["session"]["status"], "completed");
    assert_eq!(body["delta"]["total"], 0);
    assert_eq!(body["delta"]["completed"], 1);
    assert_eq!(body["delta"]["skipped"], 0);

    let stored = fixtures::fetch_subject(&server, &token, subject_id).await;
    assert_eq!(stored["completed_sessions"], 1);

    let after = fixtures::get_json(&server, &token, "/api/summary").await;
    assert_eq!(
        after["study_time_completed"].as_u64().unwrap(),
        before["study_time_completed"].as_u64().unwrap() + 25
    );

    // Repeating the same status is a no-op
    let response = server
        .put(&path)
        .add_header(AUTHORIZATION, TestContext::auth_header_value(&token))
        .json(&fixtures::status_request("completed"))
        .await;
    let body: serde_json::Value = response.json();
    assert_eq!(body["delta"]["completed"], 0);
    let stored = fixtures::fetch_subject(&server, &token, subject_id).await;
    assert_eq!(stored["completed_sessions"], 1);

    ctx.cleanup_user(user_id).await;
}

/// Test unknown status values are rejected.
#[tokio::test]
#[ignore = "requires database"]
async fn test_status_change_unknown_status() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router()).unwrap();
    let (user_id, token) = ctx.create_test_user(None).await;
    let subject = fixtures::create_subject(&server, &token, "Physics").await;
    let session = fixtures::create_session(
        &server,
        &token,
        subject["id"].as_str().unwrap(),
        25,
        "pending",
    )
    .await;

    let response = server
        .put(&format!("/api/sessions/{}/status", session["id"].as_str().unwrap()))
        .add_header(AUTHORIZATION, TestContext::auth_header_value(&token))
        .json(&fixtures::status_request("done"))
        .await;

    assert!(response.status_code().is_client_error());

    ctx.cleanup_user(user_id).await;
}

/// Test deleting a completed session decrements counters and study time.
#[tokio::test]
#[ignore = "requires database"]
async fn test_delete_completed_session() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router()).unwrap();
    let (user_id, token) = ctx.create_test_user(None).await;
    let subject = fixtures::create_subject(&server, &token, "History").await;
    let subject_id = subject["id"].as_str().unwrap();

    let target = fixtures::create_session(&server, &token, subject_id, 40, "completed").await;
    fixtures::create_session(&server, &token, subject_id, 30, "completed").await;
    fixtures::create_session(&server, &token, subject_id, 30, "completed").await;
    fixtures::create_session(&server, &token, subject_id, 30, "skipped").await;
    fixtures::create_session(&server, &token, subject_id, 30, "pending").await;

    let stored = fixtures::fetch_subject(&server, &token, subject_id).await;
    assert_eq!(stored["total_sessions"], 5);
    assert_eq!(stored["completed_sessions"], 3);
    let before = fixtures::get_json(&server, &token, "/api/summary").await;

    server
        .delete(&format!("/api/sessions/{}", target["id"].as_str().unwrap()))
        .add_header(AUTHORIZATION, TestContext::auth_header_value(&token))
        .await
        .assert_status_ok();

    let stored = fixtures::fetch_subject(&server, &token, subject_id).await;
    assert_eq!(stored["total_sessions"], 4);
    assert_eq!(stored["completed_sessions"], 2);

    let after = fixtures::get_json(&server, &token, "/api/summary").await;
    assert_eq!(
        before["study_time_completed"].as_u64().unwrap() - 40,
        after["study_time_completed"].as_u64().unwrap()
    );

    ctx.cleanup_user(user_id).await;
}

/// Test editing descriptive fields leaves status and counters alone.
#[tokio::test]
#[ignore = "requires database"]
async fn test_edit_session() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router()).unwrap();
    let (user_id, token) = ctx.create_test_user(None).await;
    let subject = fixtures::create_subject(&server, &token, "Music").await;
    let subject_id = subject["id"].as_str().unwrap();
    let session = fixtures::create_session(&server, &token, subject_id, 30, "skipped").await;
    let path = format!("/api/sessions/{}", session["id"].as_str().unwrap());

    let response = server
        .put(&path)
        .add_header(AUTHORIZATION, TestContext::auth_header_value(&token))
        .json(&serde_json::json!({
            "title": "Scales",
            "description": "major keys",
            "duration": 50,
        }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["title"], "Scales");
    assert_eq!(body["description"], "major keys");
    assert_eq!(body["duration"], 50);
    assert_eq!(body["status"], "skipped");

    // An empty description clears it
    let response = server
        .put(&path)
        .add_header(AUTHORIZATION, TestContext::auth_header_value(&token))
        .json(&serde_json::json!({ "description": "" }))
        .await;
    let body: serde_json::Value = response.json();
    assert!(body.get("description").map_or(true, |d| d.is_null()));
    assert_eq!(body["title"], "Scales");

    let stored = fixtures::fetch_subject(&server, &token, subject_id).await;
    assert_eq!(stored["skipped_sessions"], 1);

    ctx.cleanup_user(user_id).await;
}

/// Test list filters by subject and status.
#[tokio::test]
#[ignore = "requires database"]
async fn test_list_sessions_filters() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router()).unwrap();
    let (user_id, token) = ctx.create_test_user(None).await;
    let math = fixtures::create_subject(&server, &token, "Math").await;
    let art = fixtures::create_subject(&server, &token, "Art").await;
    let math_id = math["id"].as_str().unwrap();
    let art_id = art["id"].as_str().unwrap();

    fixtures::create_session(&server, &token, math_id, 30, "pending").await;
    fixtures::create_session(&server, &token, math_id, 30, "completed").await;
    fixtures::create_session(&server, &token, art_id, 30, "completed").await;

    let all = fixtures::get_json(&server, &token, "/api/sessions").await;
    assert_eq!(all["sessions"].as_array().unwrap().len(), 3);

    let math_only =
        fixtures::get_json(&server, &token, &format!("/api/sessions?subject_id={}", math_id)).await;
    assert_eq!(math_only["sessions"].as_array().unwrap().len(), 2);

    let completed = fixtures::get_json(&server, &token, "/api/sessions?status=completed").await;
    assert_eq!(completed["sessions"].as_array().unwrap().len(), 2);

    let response = server
        .get("/api/sessions?status=later")
        .add_header(AUTHORIZATION, TestContext::auth_header_value(&token))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    ctx.cleanup_user(user_id).await;
}

/// Test upcoming returns pending sessions earliest first.
#[tokio::test]
#[ignore = "requires database"]
async fn test_upcoming_sessions() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router()).unwrap();
    let (user_id, token) = ctx.create_test_user(None).await;
    let subject = fixtures::create_subject(&server, &token, "Math").await;
    let subject_id = subject["id"].as_str().unwrap();

    for date in ["2024-01-20", "2024-01-14", "2024-01-16"] {
        fixtures::post_session(
            &server,
            &token,
            &fixtures::new_session_request(subject_id, 30, date),
        )
        .await
        .assert_status_ok();
    }
    fixtures::post_session(
        &server,
        &token,
        &fixtures::new_session_with_status(subject_id, 30, "2024-01-13", "completed"),
    )
    .await
    .assert_status_ok();

    let body = fixtures::get_json(&server, &token, "/api/sessions/upcoming?limit=2").await;
    let sessions = body["sessions"].as_array().unwrap();
    assert_eq!(sessions.len(), 2);
    assert!(sessions[0]["date"].as_str().unwrap().starts_with("2024-01-14"));
    assert!(sessions[1]["date"].as_str().unwrap().starts_with("2024-01-16"));

    let body = fixtures::get_json(&server, &token, "/api/sessions/upcoming").await;
    assert_eq!(body["sessions"].as_array().unwrap().len(), 3);

    ctx.cleanup_user(user_id).await;
}
