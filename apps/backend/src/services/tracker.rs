//! Statistics and streak orchestration over the database.

use studyflow_core::{
    compute_summary, completion_streak, reconcile_counters, subject_progress, update_streak, Clock,
};
use uuid::Uuid;

use crate::db::Database;
use crate::error::Result;
use crate::models::*;

/// Record activity for `today` on the user's login streak.
///
/// Nothing is written when the user was already active today.
pub async fn touch_streak(db: &Database, clock: &dyn Clock, user_id: Uuid) -> Result<UserStreakState> {
    let current = db.get_streak_state(user_id).await?.unwrap_or_default();
    let updated = update_streak(clock.today(), &current);

    if updated != current {
        db.upsert_streak_state(user_id, &updated).await?;
        tracing::info!(
            %user_id,
            streak = updated.current_streak,
            longest = updated.longest_streak,
            "login streak updated"
        );
    }

    Ok(updated)
}

/// Dashboard summary for one user.
///
/// Touches the login streak first. Subjects whose cached counters have
/// drifted from their sessions are repaired before returning.
pub async fn summary(db: &Database, clock: &dyn Clock, user_id: Uuid) -> Result<StudySummary> {
    let streak = touch_streak(db, clock, user_id).await?;
    let (subjects, sessions) = load_all(db, user_id).await?;

    for drift in reconcile_counters(&subjects, &sessions) {
        tracing::warn!(
            subject_id = %drift.subject_id,
            stored = ?drift.stored,
            actual = ?drift.actual,
            "subject counters drifted, recomputing"
        );
        db.reconcile_subject(user_id, drift.subject_id).await?;
    }

    Ok(compute_summary(&subjects, &sessions, &streak))
}

/// Per-subject progress for one user.
pub async fn progress(db: &Database, user_id: Uuid) -> Result<Vec<SubjectProgress>> {
    let (subjects, sessions) = load_all(db, user_id).await?;
    Ok(subject_progress(&subjects, &sessions))
}

/// Login and completion streaks without recording activity.
pub async fn streaks(db: &Database, clock: &dyn Clock, user_id: Uuid) -> Result<StreakResponse> {
    let login = db.get_streak_state(user_id).await?.unwrap_or_default();
    let rows = db.list_sessions(user_id, &SessionFilter::default()).await?;
    let sessions = to_core_sessions(&rows)?;

    Ok(StreakResponse {
        login,
        completion: completion_streak(&sessions, clock),
    })
}

async fn load_all(db: &Database, user_id: Uuid) -> Result<(Vec<Subject>, Vec<Session>)> {
    let (subjects, sessions) = db.load_snapshot(user_id).await?;

    Ok((
        subjects.iter().map(DbSubject::to_core_subject).collect(),
        to_core_sessions(&sessions)?,
    ))
}
