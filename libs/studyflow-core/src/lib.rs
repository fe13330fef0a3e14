//! Core study tracker library used by the backend.
//!
//! Provides:
//! - Shared types (Subject, Session, SessionStatus, StudySummary, etc.)
//! - Input validation for subjects and sessions
//! - Summary and per-subject statistics with counter reconciliation
//! - Login and completion streak calculation
//! - An injectable clock and an in-memory ledger of one user's data

pub mod clock;
pub mod error;
pub mod ledger;
pub mod stats;
pub mod streak;
pub mod types;
pub mod validation;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{Result, StudyError, ValidationError};
pub use ledger::StudyLedger;
pub use stats::{
    apply_status_change, compute_summary, reconcile_counters, recompute_subject_counters,
    subject_progress, upcoming_sessions, DEFAULT_UPCOMING_LIMIT,
};
pub use streak::{completion_streak, update_streak};
pub use types::{
    CompletionStreak, CounterDelta, CounterDrift, NewSession, NewSubject, Session, SessionEdit,
    SessionStatus, StudySummary, Subject, SubjectCounters, SubjectEdit, SubjectProgress,
    UserStreakState,
};
