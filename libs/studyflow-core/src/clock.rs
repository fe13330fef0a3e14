//! Source of "today" for streak calculation.

use chrono::{DateTime, Local, NaiveDate, TimeZone, Timelike, Utc};

/// Supplies the current study day.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;

    /// Study day that the instant `at` belongs to, using the same rule as
    /// [`Clock::today`].
    fn day_of(&self, at: DateTime<Utc>) -> NaiveDate;
}

/// Local wall clock with a configurable daily reset hour.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock {
    /// Hour of day (0-23) when a new study day begins.
    pub daily_reset_hour: u32,
}

impl SystemClock {
    pub fn new(daily_reset_hour: u32) -> Self {
        Self { daily_reset_hour }
    }
}

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        self.day_of(Utc::now())
    }

    fn day_of(&self, at: DateTime<Utc>) -> NaiveDate {
        study_day(at.with_timezone(&Local), self.daily_reset_hour)
    }
}

/// Clock pinned to a single date. Instants are bucketed by their UTC date.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }

    fn day_of(&self, at: DateTime<Utc>) -> NaiveDate {
        at.date_naive()
    }
}

/// Study day for a moment in time.
///
/// Before the reset hour the previous calendar day is returned, so a session
/// late at night counts toward the day it started on.
pub fn study_day<Tz: TimeZone>(now: DateTime<Tz>, daily_reset_hour: u32) -> NaiveDate {
    let date = now.date_naive();
    if now.hour() < daily_reset_hour {
        date.pred_opt().unwrap_or(date)
    } else {
        date
    }
}
