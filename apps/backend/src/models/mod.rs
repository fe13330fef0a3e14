//! Database models and API types

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::{ApiError, Result};

// Re-export shared types from studyflow-core
pub use studyflow_core::types::{
    CompletionStreak, CounterDelta, CounterDrift, NewSession, NewSubject, Session, SessionEdit,
    SessionStatus, StudySummary, Subject, SubjectCounters, SubjectEdit, SubjectProgress,
    UserStreakState,
};

// === Database Entity Types ===

/// Registered user
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub token: String,
    pub name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
}

/// Subject stored in PostgreSQL
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbSubject {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub color: String,
    pub total_sessions: i32,
    pub completed_sessions: i32,
    pub skipped_sessions: i32,
    pub next_session_number: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DbSubject {
    /// Convert to studyflow-core Subject
    pub fn to_core_subject(&self) -> Subject {
        Subject {
            id: self.id,
            user_id: self.user_id,
            name: self.name.clone(),
            color: self.color.clone(),
            total_sessions: self.total_sessions as u32,
            completed_sessions: self.completed_sessions as u32,
            skipped_sessions: self.skipped_sessions as u32,
            next_session_number: self.next_session_number as u32,
        }
    }

    /// Cached counters as stored
    pub fn counters(&self) -> SubjectCounters {
        self.to_core_subject().counters()
    }
}

/// Session stored in PostgreSQL
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbSession {
    pub id: Uuid,
    pub user_id: Uuid,
    pub subject_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub duration: i32,
    pub status: String,
    pub date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DbSession {
    /// Stored status; an unknown value is a storage fault, not a default.
    pub fn status(&self) -> Result<SessionStatus> {
        self.status.parse().map_err(|_| {
            ApiError::Internal(format!(
                "session {} has unknown status '{}'",
                self.id, self.status
            ))
        })
    }

    /// Convert to studyflow-core Session
    pub fn to_core_session(&self) -> Result<Session> {
        Ok(Session {
            id: self.id,
            user_id: self.user_id,
            subject_id: self.subject_id,
            title: self.title.clone(),
            description: self.description.clone(),
            duration: self.duration as u32,
            status: self.status()?,
            date: self.date,
        })
    }
}

/// Convert a batch of session rows, failing on the first bad row
pub fn to_core_sessions(rows: &[DbSession]) -> Result<Vec<Session>> {
    rows.iter().map(DbSession::to_core_session).collect()
}

/// Login streak row in PostgreSQL
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbUserStats {
    pub user_id: Uuid,
    pub current_streak: i32,
    pub longest_streak: i32,
    pub last_active_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DbUserStats {
    /// Convert to studyflow-core UserStreakState
    pub fn to_core_state(&self) -> UserStreakState {
        UserStreakState {
            current_streak: self.current_streak as u32,
            longest_streak: self.longest_streak as u32,
            last_active_date: self.last_active_date,
        }
    }
}

// === API Request/Response Types ===

#[derive(Debug, Serialize, Deserialize)]
pub struct UserRegisterRequest {
    pub name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserRegisterResponse {
    pub user_id: Uuid,
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserStatusResponse {
    pub user_id: Uuid,
    pub name: Option<String>,
    pub last_seen_at: DateTime<Utc>,
}

// Subject types
#[derive(Debug, Serialize, Deserialize)]
pub struct SubjectListResponse {
    pub subjects: Vec<Subject>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteSubjectResponse {
    pub deleted: bool,
    pub sessions_removed: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReconcileResponse {
    pub subject: Subject,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drift: Option<CounterDrift>,
}

// Session types
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct SessionListQuery {
    pub subject_id: Option<Uuid>,
    pub status: Option<String>,
}

/// Validated session filter
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionFilter {
    pub subject_id: Option<Uuid>,
    pub status: Option<SessionStatus>,
}

impl SessionListQuery {
    pub fn to_filter(&self) -> std::result::Result<SessionFilter, studyflow_core::ValidationError> {
        Ok(SessionFilter {
            subject_id: self.subject_id,
            status: self.status.as_deref().map(str::parse).transpose()?,
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionListResponse {
    pub sessions: Vec<Session>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpcomingQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: SessionStatus,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateStatusResponse {
    pub session: Session,
    pub delta: CounterDelta,
}

// Stats types
#[derive(Debug, Serialize, Deserialize)]
pub struct SubjectProgressResponse {
    pub subjects: Vec<SubjectProgress>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StreakResponse {
    pub login: UserStreakState,
    pub completion: CompletionStreak,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn db_session(status: &str) -> DbSession {
        DbSession {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            subject_id: Uuid::new_v4(),
            title: "S1".to_string(),
            description: None,
            duration: 45,
            status: status.to_string(),
            date: Utc::now(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_session_status_round_trips_from_db() {
        assert_eq!(
            db_session("skipped").to_core_session().unwrap().status,
            SessionStatus::Skipped
        );
        assert_eq!(db_session("completed").to_core_session().unwrap().duration, 45);
    }

    #[test]
    fn test_unknown_db_status_is_internal_error() {
        let row = db_session("archived");
        let err = row.to_core_session().unwrap_err();
        assert!(matches!(&err, ApiError::Internal(msg) if msg.contains("archived")));

        let rows = vec![db_session("pending"), row];
        assert!(matches!(to_core_sessions(&rows), Err(ApiError::Internal(_))));
    }

    #[test]
    fn test_subject_counters_from_db() {
        let subject = DbSubject {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            name: "History".to_string(),
            color: "amber".to_string(),
            total_sessions: 5,
            completed_sessions: 3,
            skipped_sessions: 1,
            next_session_number: 6,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert_eq!(
            subject.counters(),
            SubjectCounters {
                total_sessions: 5,
                completed_sessions: 3,
                skipped_sessions: 1,
            }
        );
        assert_eq!(subject.to_core_subject().next_session_number, 6);
    }

    #[test]
    fn test_list_query_rejects_unknown_status() {
        let query = SessionListQuery {
            subject_id: None,
            status: Some("finished".to_string()),
        };
        assert!(query.to_filter().is_err());
    }

    #[test]
    fn test_list_query_parses_status() {
        let query = SessionListQuery {
            subject_id: None,
            status: Some("pending".to_string()),
        };
        assert_eq!(query.to_filter().unwrap().status, Some(SessionStatus::Pending));
    }
}
