//! Core types for the study tracker.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

/// Session progress status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    #[default]
    Pending,
    Completed,
    Skipped,
}

impl SessionStatus {
    /// Get the status name as stored and serialized.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Skipped => "skipped",
        }
    }
}

impl FromStr for SessionStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            "skipped" => Ok(Self::Skipped),
            other => Err(ValidationError::UnknownStatus(other.to_string())),
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A subject the user studies, with denormalized session counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub color: String,
    pub total_sessions: u32,
    pub completed_sessions: u32,
    pub skipped_sessions: u32,
    /// Number used for the next auto-titled session ("S{n}").
    pub next_session_number: u32,
}

impl Subject {
    /// Create a subject with zeroed counters.
    pub fn new(user_id: Uuid, name: String, color: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            name,
            color,
            total_sessions: 0,
            completed_sessions: 0,
            skipped_sessions: 0,
            next_session_number: 1,
        }
    }

    /// Cached counters as stored on the subject.
    pub fn counters(&self) -> SubjectCounters {
        SubjectCounters {
            total_sessions: self.total_sessions,
            completed_sessions: self.completed_sessions,
            skipped_sessions: self.skipped_sessions,
        }
    }

    /// Overwrite the cached counters.
    pub fn set_counters(&mut self, counters: SubjectCounters) {
        self.total_sessions = counters.total_sessions;
        self.completed_sessions = counters.completed_sessions;
        self.skipped_sessions = counters.skipped_sessions;
    }
}

/// A logged study session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub user_id: Uuid,
    pub subject_id: Uuid,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Minutes, always positive.
    pub duration: u32,
    pub status: SessionStatus,
    pub date: DateTime<Utc>,
}

/// Session counters of one subject.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectCounters {
    pub total_sessions: u32,
    pub completed_sessions: u32,
    pub skipped_sessions: u32,
}

impl SubjectCounters {
    /// Sessions that are neither completed nor skipped.
    pub fn pending_sessions(&self) -> u32 {
        self.total_sessions
            .saturating_sub(self.completed_sessions)
            .saturating_sub(self.skipped_sessions)
    }

    /// Apply a delta, returning `None` if the result would underflow or
    /// break `completed + skipped <= total`.
    pub fn apply(self, delta: CounterDelta) -> Option<Self> {
        let next = Self {
            total_sessions: self.total_sessions.checked_add_signed(delta.total)?,
            completed_sessions: self.completed_sessions.checked_add_signed(delta.completed)?,
            skipped_sessions: self.skipped_sessions.checked_add_signed(delta.skipped)?,
        };
        let finished = next.completed_sessions.checked_add(next.skipped_sessions)?;
        (finished <= next.total_sessions).then_some(next)
    }
}

/// Signed change to apply to a subject's counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterDelta {
    pub total: i32,
    pub completed: i32,
    pub skipped: i32,
}

impl CounterDelta {
    /// Whether applying this delta changes nothing.
    pub fn is_zero(&self) -> bool {
        self.total == 0 && self.completed == 0 && self.skipped == 0
    }

    /// Delta for a session transitioning from `old` to `new`.
    pub fn status_change(old: SessionStatus, new: SessionStatus) -> Self {
        if old == new {
            return Self::default();
        }
        let leaving = Self::status_weight(old);
        let entering = Self::status_weight(new);
        Self {
            total: 0,
            completed: entering.completed - leaving.completed,
            skipped: entering.skipped - leaving.skipped,
        }
    }

    /// Delta for a newly created session with the given status.
    pub fn created(status: SessionStatus) -> Self {
        Self {
            total: 1,
            ..Self::status_weight(status)
        }
    }

    /// Delta for deleting a session that currently has the given status.
    pub fn deleted(status: SessionStatus) -> Self {
        let weight = Self::status_weight(status);
        Self {
            total: -1,
            completed: -weight.completed,
            skipped: -weight.skipped,
        }
    }

    fn status_weight(status: SessionStatus) -> Self {
        match status {
            SessionStatus::Pending => Self::default(),
            SessionStatus::Completed => Self {
                completed: 1,
                ..Self::default()
            },
            SessionStatus::Skipped => Self {
                skipped: 1,
                ..Self::default()
            },
        }
    }
}

/// Daily login streak, one record per user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStreakState {
    pub current_streak: u32,
    pub longest_streak: u32,
    pub last_active_date: Option<NaiveDate>,
}

/// Streak of consecutive days containing a completed session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionStreak {
    pub current: u32,
    pub longest: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_completed_date: Option<NaiveDate>,
}

/// Aggregate progress over all subjects and sessions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StudySummary {
    pub total_subjects: usize,
    pub total_sessions: usize,
    pub completed_sessions: usize,
    pub skipped_sessions: usize,
    pub pending_sessions: usize,
    /// Minutes.
    pub study_time_completed: u64,
    pub streak: u32,
    pub longest_streak: u32,
    /// Percentage of sessions completed, 0-100.
    pub completion_rate: f64,
}

/// Per-subject breakdown computed from sessions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectProgress {
    pub subject_id: Uuid,
    pub name: String,
    pub color: String,
    pub total_sessions: usize,
    pub completed_sessions: usize,
    pub skipped_sessions: usize,
    pub pending_sessions: usize,
    pub study_time_completed: u64,
    pub completion_rate: f64,
}

/// Disagreement between a subject's cached counters and a full recompute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterDrift {
    pub subject_id: Uuid,
    pub stored: SubjectCounters,
    pub actual: SubjectCounters,
}

/// Subject creation input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSubject {
    pub name: String,
    pub color: String,
}

/// Subject edit input; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubjectEdit {
    pub name: Option<String>,
    pub color: Option<String>,
}

/// Raw session creation input, validated before use.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSession {
    pub subject_id: Uuid,
    /// Free-text title; auto-numbered when absent.
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub duration: i64,
    pub date: String,
    #[serde(default)]
    pub status: Option<SessionStatus>,
}

/// Raw session edit input; `None` leaves a field unchanged and an empty
/// description clears it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionEdit {
    pub title: Option<String>,
    pub description: Option<String>,
    pub duration: Option<i64>,
    pub date: Option<String>,
}
