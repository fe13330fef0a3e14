//! Input validation for subjects and sessions.
//!
//! Everything here fails fast with a [`ValidationError`] instead of coercing
//! bad input into something the engine would count.

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::error::ValidationError;
use crate::types::{NewSession, SessionEdit, SessionStatus, Subject};

type Result<T> = std::result::Result<T, ValidationError>;

/// Session creation input after validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidSession {
    pub subject_id: Uuid,
    pub title: Option<String>,
    pub description: Option<String>,
    pub duration: u32,
    pub date: DateTime<Utc>,
    pub status: SessionStatus,
}

/// Session edit input after validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidSessionEdit {
    pub title: Option<String>,
    /// `Some(None)` clears the description.
    pub description: Option<Option<String>>,
    pub duration: Option<u32>,
    pub date: Option<DateTime<Utc>>,
}

/// Trim a subject name and reject it if nothing is left.
pub fn validate_subject_name(name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyName);
    }
    Ok(trimmed.to_string())
}

/// Trim a session title and reject it if nothing is left.
pub fn validate_title(title: &str) -> Result<String> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyTitle);
    }
    Ok(trimmed.to_string())
}

/// Check that a duration is a positive number of minutes that fits in u32.
pub fn validate_duration(minutes: i64) -> Result<u32> {
    if minutes <= 0 {
        return Err(ValidationError::InvalidDuration(minutes));
    }
    u32::try_from(minutes).map_err(|_| ValidationError::InvalidDuration(minutes))
}

/// Parse a `YYYY-MM-DD` calendar date.
pub fn parse_calendar_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| ValidationError::InvalidDate(value.to_string()))
}

/// Parse a session date: RFC 3339 timestamp, or a bare calendar date taken
/// as midnight UTC.
pub fn parse_session_date(value: &str) -> Result<DateTime<Utc>> {
    let trimmed = value.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(ts.with_timezone(&Utc));
    }
    parse_calendar_date(trimmed)?
        .and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc())
        .ok_or_else(|| ValidationError::InvalidDate(value.to_string()))
}

fn normalize_description(description: Option<&str>) -> Option<String> {
    description
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string)
}

impl NewSession {
    /// Validate against the subjects the session may reference.
    pub fn validate(&self, subjects: &[Subject]) -> Result<ValidSession> {
        if !subjects.iter().any(|s| s.id == self.subject_id) {
            return Err(ValidationError::UnknownSubject(self.subject_id));
        }
        let title = self.title.as_deref().map(validate_title).transpose()?;
        Ok(ValidSession {
            subject_id: self.subject_id,
            title,
            description: normalize_description(self.description.as_deref()),
            duration: validate_duration(self.duration)?,
            date: parse_session_date(&self.date)?,
            status: self.status.unwrap_or_default(),
        })
    }
}

impl SessionEdit {
    pub fn validate(&self) -> Result<ValidSessionEdit> {
        Ok(ValidSessionEdit {
            title: self.title.as_deref().map(validate_title).transpose()?,
            description: self
                .description
                .as_deref()
                .map(|d| normalize_description(Some(d))),
            duration: self.duration.map(validate_duration).transpose()?,
            date: self.date.as_deref().map(parse_session_date).transpose()?,
        })
    }
}
