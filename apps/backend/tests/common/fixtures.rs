//! Test fixtures and request helpers.

use axum::http::header::AUTHORIZATION;
use axum_test::{TestResponse, TestServer};
use chrono::NaiveDate;
use serde_json::{json, Value};

use super::TestContext;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Create a user register request body.
pub fn user_register_request(name: Option<&str>) -> Value {
    match name {
        Some(n) => json!({ "name": n }),
        None => json!({}),
    }
}

/// Create a subject request body.
pub fn new_subject_request(name: &str, color: &str) -> Value {
    json!({ "name": name, "color": color })
}

/// Create a session request body without an explicit title.
pub fn new_session_request(subject_id: &str, duration: i64, date: &str) -> Value {
    json!({
        "subject_id": subject_id,
        "duration": duration,
        "date": date,
    })
}

/// Create a session request body with an initial status.
pub fn new_session_with_status(subject_id: &str, duration: i64, date: &str, status: &str) -> Value {
    json!({
        "subject_id": subject_id,
        "duration": duration,
        "date": date,
        "status": status,
    })
}

/// Create a status update request body.
pub fn status_request(status: &str) -> Value {
    json!({ "status": status })
}

/// POST a subject and return its JSON.
pub async fn create_subject(server: &TestServer, token: &str, name: &str) -> Value {
    let response = server
        .post("/api/subjects")
        .add_header(AUTHORIZATION, TestContext::auth_header_value(token))
        .json(&new_subject_request(name, "blue"))
        .await;
    response.assert_status_ok();
    response.json()
}

/// POST a session and return the raw response.
pub async fn post_session(server: &TestServer, token: &str, body: &Value) -> TestResponse {
    server
        .post("/api/sessions")
        .add_header(AUTHORIZATION, TestContext::auth_header_value(token))
        .json(body)
        .await
}

/// POST a session and return its JSON.
pub async fn create_session(
    server: &TestServer,
    token: &str,
    subject_id: &str,
    duration: i64,
    status: &str,
) -> Value {
    let response = post_session(
        server,
        token,
        &new_session_with_status(subject_id, duration, "2024-01-12", status),
    )
    .await;
    response.assert_status_ok();
    response.json()
}

/// Authorized GET returning JSON.
pub async fn get_json(server: &TestServer, token: &str, path: &str) -> Value {
    let response = server
        .get(path)
        .add_header(AUTHORIZATION, TestContext::auth_header_value(token))
        .await;
    response.assert_status_ok();
    response.json()
}

/// Fetch one subject from the subject list.
pub async fn fetch_subject(server: &TestServer, token: &str, subject_id: &str) -> Value {
    let body = get_json(server, token, "/api/subjects").await;
    body["subjects"]
        .as_array()
        .unwrap()
        .iter()
        .find(|s| s["id"] == subject_id)
        .cloned()
        .expect("subject should be listed")
}
