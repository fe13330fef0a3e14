//! Daily streak calculation.
//!
//! Two streaks are tracked:
//! - the login streak ([`update_streak`]), counting consecutive calendar days
//!   on which the user's data was loaded. This one feeds the study summary.
//! - the completion streak ([`completion_streak`]), counting consecutive
//!   study days that contain at least one completed session.

use std::collections::BTreeSet;

use chrono::NaiveDate;

use crate::clock::Clock;
use crate::types::{CompletionStreak, Session, SessionStatus, UserStreakState};

/// Advance the login streak for activity on `today`.
///
/// Calling this more than once on the same day returns the state unchanged.
/// Any gap (including a `last_active_date` after `today`) restarts the
/// streak at 1.
pub fn update_streak(today: NaiveDate, state: &UserStreakState) -> UserStreakState {
    if state.last_active_date == Some(today) {
        return state.clone();
    }

    let current_streak = match state.last_active_date {
        Some(last) if today.pred_opt() == Some(last) => state.current_streak.saturating_add(1),
        _ => 1,
    };

    UserStreakState {
        current_streak,
        longest_streak: current_streak.max(state.longest_streak),
        last_active_date: Some(today),
    }
}

/// Count consecutive study days with a completed session.
///
/// Sessions are bucketed with [`Clock::day_of`], so they land on the same
/// day as [`Clock::today`]. `current` is 0 unless today itself has a
/// completed session.
pub fn completion_streak(sessions: &[Session], clock: &dyn Clock) -> CompletionStreak {
    let today = clock.today();
    let days: BTreeSet<NaiveDate> = sessions
        .iter()
        .filter(|s| s.status == SessionStatus::Completed)
        .map(|s| clock.day_of(s.date))
        .collect();

    let mut current = 0u32;
    let mut day = Some(today);
    while let Some(d) = day.filter(|d| days.contains(d)) {
        current += 1;
        day = d.pred_opt();
    }

    let mut longest = 0u32;
    let mut run = 0u32;
    let mut previous: Option<NaiveDate> = None;
    for &d in &days {
        run = match previous {
            Some(p) if p.succ_opt() == Some(d) => run + 1,
            _ => 1,
        };
        longest = longest.max(run);
        previous = Some(d);
    }

    CompletionStreak {
        current,
        longest,
        last_completed_date: days.last().copied(),
    }
}
