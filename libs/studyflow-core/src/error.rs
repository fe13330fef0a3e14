//! Error types for studyflow-core.

use thiserror::Error;
use uuid::Uuid;

use crate::types::{CounterDelta, SubjectCounters};

/// Result type alias using StudyError.
pub type Result<T> = std::result::Result<T, StudyError>;

/// Malformed input rejected before it reaches the engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("subject name must not be empty")]
    EmptyName,

    #[error("session title must not be empty")]
    EmptyTitle,

    #[error("duration must be a positive number of minutes, got {0}")]
    InvalidDuration(i64),

    #[error("invalid date: {0}")]
    InvalidDate(String),

    #[error("unknown session status: {0}")]
    UnknownStatus(String),

    #[error("subject {0} does not exist")]
    UnknownSubject(Uuid),
}

/// Errors raised by ledger operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StudyError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("subject not found: {0}")]
    SubjectNotFound(Uuid),

    #[error("session not found: {0}")]
    SessionNotFound(Uuid),

    #[error("counter drift detected for subject {subject_id}: cannot apply {delta:?} to {counters:?}")]
    CounterDriftDetected {
        subject_id: Uuid,
        counters: SubjectCounters,
        delta: CounterDelta,
    },
}
