//! Statistics endpoints

use axum::{extract::State, Extension, Json};

use crate::error::Result;
use crate::models::{StreakResponse, SubjectProgressResponse};
use crate::routes::auth::AuthenticatedUser;
use crate::services::tracker;
use crate::AppState;

/// GET /api/stats/subjects
pub async fn subjects(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
) -> Result<Json<SubjectProgressResponse>> {
    let subjects = tracker::progress(&state.db, auth.user_id).await?;
    Ok(Json(SubjectProgressResponse { subjects }))
}

/// GET /api/stats/streak
pub async fn streak(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
) -> Result<Json<StreakResponse>> {
    let streaks = tracker::streaks(&state.db, state.clock.as_ref(), auth.user_id).await?;
    Ok(Json(streaks))
}
