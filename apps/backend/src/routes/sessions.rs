//! Session endpoints

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use studyflow_core::{upcoming_sessions, DEFAULT_UPCOMING_LIMIT};
use uuid::Uuid;

use crate::error::{ApiError, Result};
use crate::models::*;
use crate::routes::auth::AuthenticatedUser;
use crate::AppState;

/// GET /api/sessions
/// Optional `subject_id` and `status` filters
pub async fn list(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Query(query): Query<SessionListQuery>,
) -> Result<Json<SessionListResponse>> {
    let filter = query.to_filter()?;
    let sessions = state.db.list_sessions(auth.user_id, &filter).await?;

    Ok(Json(SessionListResponse {
        sessions: to_core_sessions(&sessions)?,
    }))
}

/// GET /api/sessions/upcoming
/// Pending sessions, earliest first
pub async fn upcoming(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Query(query): Query<UpcomingQuery>,
) -> Result<Json<SessionListResponse>> {
    let filter = SessionFilter {
        subject_id: None,
        status: Some(SessionStatus::Pending),
    };
    let rows = state.db.list_sessions(auth.user_id, &filter).await?;
    let sessions = to_core_sessions(&rows)?;

    let limit = query.limit.unwrap_or(DEFAULT_UPCOMING_LIMIT);

    Ok(Json(SessionListResponse {
        sessions: upcoming_sessions(&sessions, limit)
            .into_iter()
            .cloned()
            .collect(),
    }))
}

/// POST /api/sessions
pub async fn create(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Json(request): Json<NewSession>,
) -> Result<Json<Session>> {
    let subjects: Vec<Subject> = state
        .db
        .get_subject(auth.user_id, request.subject_id)
        .await?
        .iter()
        .map(DbSubject::to_core_subject)
        .collect();
    let valid = request.validate(&subjects)?;

    let session = state.db.create_session(auth.user_id, &valid).await?;

    tracing::info!(
        session_id = %session.id,
        subject_id = %session.subject_id,
        title = %session.title,
        "created session"
    );

    Ok(Json(session.to_core_session()?))
}

/// PUT /api/sessions/:id
/// Edits title, description, duration or date; status has its own endpoint
pub async fn update(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<SessionEdit>,
) -> Result<Json<Session>> {
    let edit = request.validate()?;

    let session = state
        .db
        .edit_session(auth.user_id, session_id, &edit)
        .await?
        .ok_or_else(|| session_not_found(session_id))?;

    Ok(Json(session.to_core_session()?))
}

/// PUT /api/sessions/:id/status
pub async fn update_status(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<UpdateStatusResponse>> {
    let (session, delta) = state
        .db
        .update_session_status(auth.user_id, session_id, request.status)
        .await?
        .ok_or_else(|| session_not_found(session_id))?;

    if !delta.is_zero() {
        tracing::debug!(%session_id, status = %request.status, ?delta, "session status changed");
    }

    Ok(Json(UpdateStatusResponse {
        session: session.to_core_session()?,
        delta,
    }))
}

/// DELETE /api/sessions/:id
pub async fn delete(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<Session>> {
    let session = state
        .db
        .delete_session(auth.user_id, session_id)
        .await?
        .ok_or_else(|| session_not_found(session_id))?;

    Ok(Json(session.to_core_session()?))
}

fn session_not_found(session_id: Uuid) -> ApiError {
    ApiError::NotFound(format!("Session {}", session_id))
}
