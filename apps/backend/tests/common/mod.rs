//! Common test utilities and fixtures for integration tests.
//!
//! This module provides shared test infrastructure including:
//! - TestContext for setting up test environment with database
//! - Helper functions for creating test data
//! - Authentication helpers
//!
//! # Requirements
//! Integration tests require a PostgreSQL database (set DATABASE_URL env var).

#![allow(dead_code)]

pub mod fixtures;

use std::sync::Arc;

use axum::Router;
use chrono::NaiveDate;
use uuid::Uuid;

use studyflow_backend::db::Database;
use studyflow_backend::AppState;
use studyflow_core::FixedClock;

/// Test context containing database connection and test server.
///
/// The router sees a clock pinned to `today`, so streak assertions do not
/// depend on when the tests run.
pub struct TestContext {
    pub db: Arc<Database>,
    pub today: NaiveDate,
    app: Router,
}

impl TestContext {
    /// Create a new test context pinned to 2024-01-12.
    ///
    /// # Panics
    /// Panics if DATABASE_URL is not set or database connection fails.
    pub async fn new() -> Self {
        Self::at(fixtures::date(2024, 1, 12)).await
    }

    /// Create a new test context whose study day is `today`.
    pub async fn at(today: NaiveDate) -> Self {
        dotenvy::dotenv().ok();

        let database_url =
            std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for integration tests");

        let db = Database::connect(&database_url)
            .await
            .expect("Failed to connect to test database");

        db.run_migrations()
            .await
            .expect("Failed to run migrations");

        let db = Arc::new(db);

        let state = AppState {
            db: db.clone(),
            clock: Arc::new(FixedClock(today)),
        };

        let app = studyflow_backend::router(state);

        Self { db, today, app }
    }

    /// Get the router for use with axum-test.
    pub fn router(&self) -> Router {
        self.app.clone()
    }

    /// Create a test user and return its ID and token.
    pub async fn create_test_user(&self, name: Option<&str>) -> (Uuid, String) {
        let user = self
            .db
            .create_user(name)
            .await
            .expect("Failed to create test user");
        (user.id, user.token)
    }

    /// Format authorization header value.
    pub fn auth_header_value(token: &str) -> String {
        format!("Bearer {}", token)
    }

    /// Clean up test data for a user.
    ///
    /// Subjects, sessions and streak rows cascade from the user.
    pub async fn cleanup_user(&self, user_id: Uuid) {
        let _ = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(self.db.pool())
            .await;
    }
}
