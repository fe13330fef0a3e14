//! Dashboard summary endpoint

use axum::{extract::State, Extension, Json};

use crate::error::Result;
use crate::models::StudySummary;
use crate::routes::auth::AuthenticatedUser;
use crate::services::tracker;
use crate::AppState;

/// GET /api/summary
/// Records today's activity on the login streak, then summarizes
pub async fn get(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
) -> Result<Json<StudySummary>> {
    let summary = tracker::summary(&state.db, state.clock.as_ref(), auth.user_id).await?;
    Ok(Json(summary))
}
