//! Derived statistics over subjects and sessions.
//!
//! Counters cached on a [`Subject`] are only ever a shortcut: the functions in
//! this module recompute everything from the session list, and
//! [`reconcile_counters`] reports where the cache has drifted from it.

use crate::types::{
    CounterDelta, CounterDrift, Session, SessionStatus, StudySummary, Subject, SubjectCounters,
    SubjectProgress, UserStreakState,
};

/// Number of pending sessions the dashboard shows by default.
pub const DEFAULT_UPCOMING_LIMIT: usize = 5;

#[derive(Debug, Default)]
struct Tally {
    total: usize,
    completed: usize,
    skipped: usize,
    pending: usize,
    study_time_completed: u64,
}

impl Tally {
    fn of<'a>(sessions: impl IntoIterator<Item = &'a Session>) -> Self {
        sessions.into_iter().fold(Self::default(), |mut tally, session| {
            tally.total += 1;
            match session.status {
                SessionStatus::Completed => {
                    tally.completed += 1;
                    tally.study_time_completed += u64::from(session.duration);
                }
                SessionStatus::Skipped => tally.skipped += 1,
                SessionStatus::Pending => tally.pending += 1,
            }
            tally
        })
    }

    fn completion_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.completed as f64 / self.total as f64 * 100.0
        }
    }
}

/// Summarize all subjects and sessions of one user.
///
/// Streak values are copied from `streak` even when there are no sessions.
pub fn compute_summary(
    subjects: &[Subject],
    sessions: &[Session],
    streak: &UserStreakState,
) -> StudySummary {
    let tally = Tally::of(sessions);
    StudySummary {
        total_subjects: subjects.len(),
        total_sessions: tally.total,
        completed_sessions: tally.completed,
        skipped_sessions: tally.skipped,
        pending_sessions: tally.pending,
        study_time_completed: tally.study_time_completed,
        streak: streak.current_streak,
        longest_streak: streak.longest_streak,
        completion_rate: tally.completion_rate(),
    }
}

/// Count a subject's sessions from scratch.
///
/// Sessions belonging to other subjects are ignored, so the full session
/// list may be passed.
pub fn recompute_subject_counters(subject: &Subject, sessions: &[Session]) -> SubjectCounters {
    let tally = Tally::of(sessions.iter().filter(|s| s.subject_id == subject.id));
    SubjectCounters {
        total_sessions: saturating_u32(tally.total),
        completed_sessions: saturating_u32(tally.completed),
        skipped_sessions: saturating_u32(tally.skipped),
    }
}

/// Counter delta for a session moving from `old` to `new`.
///
/// Zero when the status is unchanged; callers should skip the write then.
pub fn apply_status_change(old: SessionStatus, new: SessionStatus) -> CounterDelta {
    CounterDelta::status_change(old, new)
}

/// Per-subject breakdown in subject order.
pub fn subject_progress(subjects: &[Subject], sessions: &[Session]) -> Vec<SubjectProgress> {
    subjects
        .iter()
        .map(|subject| {
            let tally = Tally::of(sessions.iter().filter(|s| s.subject_id == subject.id));
            SubjectProgress {
                subject_id: subject.id,
                name: subject.name.clone(),
                color: subject.color.clone(),
                total_sessions: tally.total,
                completed_sessions: tally.completed,
                skipped_sessions: tally.skipped,
                pending_sessions: tally.pending,
                study_time_completed: tally.study_time_completed,
                completion_rate: tally.completion_rate(),
            }
        })
        .collect()
}

/// Compare every subject's cached counters against a full recompute.
pub fn reconcile_counters(subjects: &[Subject], sessions: &[Session]) -> Vec<CounterDrift> {
    subjects
        .iter()
        .filter_map(|subject| {
            let actual = recompute_subject_counters(subject, sessions);
            let stored = subject.counters();
            (stored != actual).then_some(CounterDrift {
                subject_id: subject.id,
                stored,
                actual,
            })
        })
        .collect()
}

/// Pending sessions ordered by date, earliest first.
pub fn upcoming_sessions(sessions: &[Session], limit: usize) -> Vec<&Session> {
    let mut pending: Vec<&Session> = sessions
        .iter()
        .filter(|s| s.status == SessionStatus::Pending)
        .collect();
    pending.sort_by_key(|s| s.date);
    pending.truncate(limit);
    pending
}

fn saturating_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}
