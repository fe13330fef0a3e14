//! Subject endpoints

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use studyflow_core::validation::validate_subject_name;
use uuid::Uuid;

use crate::error::{ApiError, Result};
use crate::models::*;
use crate::routes::auth::AuthenticatedUser;
use crate::AppState;

/// GET /api/subjects
pub async fn list(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
) -> Result<Json<SubjectListResponse>> {
    let subjects = state.db.list_subjects(auth.user_id).await?;

    Ok(Json(SubjectListResponse {
        subjects: subjects.iter().map(DbSubject::to_core_subject).collect(),
    }))
}

/// POST /api/subjects
pub async fn create(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Json(request): Json<NewSubject>,
) -> Result<Json<Subject>> {
    let name = validate_subject_name(&request.name)?;
    let subject = state
        .db
        .create_subject(auth.user_id, &name, request.color.trim())
        .await?;

    tracing::info!(subject_id = %subject.id, "created subject");

    Ok(Json(subject.to_core_subject()))
}

/// PUT /api/subjects/:id
pub async fn update(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(subject_id): Path<Uuid>,
    Json(request): Json<SubjectEdit>,
) -> Result<Json<Subject>> {
    let name = request
        .name
        .as_deref()
        .map(validate_subject_name)
        .transpose()?;
    let color = request.color.as_deref().map(str::trim);

    let subject = state
        .db
        .update_subject(auth.user_id, subject_id, name.as_deref(), color)
        .await?
        .ok_or_else(|| subject_not_found(subject_id))?;

    Ok(Json(subject.to_core_subject()))
}

/// DELETE /api/subjects/:id
/// Removes the subject together with all of its sessions
pub async fn delete(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(subject_id): Path<Uuid>,
) -> Result<Json<DeleteSubjectResponse>> {
    let sessions_removed = state
        .db
        .delete_subject(auth.user_id, subject_id)
        .await?
        .ok_or_else(|| subject_not_found(subject_id))?;

    tracing::info!(%subject_id, sessions_removed, "deleted subject");

    Ok(Json(DeleteSubjectResponse {
        deleted: true,
        sessions_removed,
    }))
}

/// POST /api/subjects/:id/reconcile
/// Recomputes the subject's counters from its sessions
pub async fn reconcile(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(subject_id): Path<Uuid>,
) -> Result<Json<ReconcileResponse>> {
    let (subject, drift) = state
        .db
        .reconcile_subject(auth.user_id, subject_id)
        .await?
        .ok_or_else(|| subject_not_found(subject_id))?;

    if let Some(drift) = &drift {
        tracing::warn!(
            %subject_id,
            stored = ?drift.stored,
            actual = ?drift.actual,
            "repaired drifted subject counters"
        );
    }

    Ok(Json(ReconcileResponse {
        subject: subject.to_core_subject(),
        drift,
    }))
}

fn subject_not_found(subject_id: Uuid) -> ApiError {
    ApiError::NotFound(format!("Subject {}", subject_id))
}
