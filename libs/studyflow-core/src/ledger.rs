//! In-memory store of one user's subjects and sessions.
//!
//! Sessions are the source of truth. Subject counters are a cache that every
//! mutation adjusts with a [`CounterDelta`]; [`StudyLedger::reconcile`]
//! rebuilds the cache from the sessions and reports what disagreed.

use uuid::Uuid;

use crate::error::{Result, StudyError};
use crate::stats::{compute_summary, reconcile_counters};
use crate::types::{
    CounterDelta, CounterDrift, NewSession, NewSubject, Session, SessionEdit, SessionStatus,
    StudySummary, Subject, SubjectCounters, SubjectEdit, UserStreakState,
};
use crate::validation::validate_subject_name;

/// Subjects and sessions owned by a single user.
#[derive(Debug, Clone)]
pub struct StudyLedger {
    user_id: Uuid,
    subjects: Vec<Subject>,
    sessions: Vec<Session>,
}

impl StudyLedger {
    pub fn new(user_id: Uuid) -> Self {
        Self {
            user_id,
            subjects: Vec::new(),
            sessions: Vec::new(),
        }
    }

    /// Build a ledger from a storage snapshot, trusting its counters as-is.
    pub fn from_parts(user_id: Uuid, subjects: Vec<Subject>, sessions: Vec<Session>) -> Self {
        Self {
            user_id,
            subjects,
            sessions,
        }
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn subjects(&self) -> &[Subject] {
        &self.subjects
    }

    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    pub fn subject(&self, id: Uuid) -> Option<&Subject> {
        self.subjects.iter().find(|s| s.id == id)
    }

    pub fn session(&self, id: Uuid) -> Option<&Session> {
        self.sessions.iter().find(|s| s.id == id)
    }

    pub fn add_subject(&mut self, input: &NewSubject) -> Result<&Subject> {
        let name = validate_subject_name(&input.name)?;
        let index = self.subjects.len();
        self.subjects
            .push(Subject::new(self.user_id, name, input.color.clone()));
        Ok(&self.subjects[index])
    }

    /// Rename or recolor a subject. Counters are left alone.
    pub fn update_subject(&mut self, id: Uuid, edit: &SubjectEdit) -> Result<&Subject> {
        let name = edit.name.as_deref().map(validate_subject_name).transpose()?;
        let subject = self.subject_mut(id)?;
        if let Some(name) = name {
            subject.name = name;
        }
        if let Some(color) = &edit.color {
            subject.color = color.clone();
        }
        Ok(&*subject)
    }

    /// Delete a subject and every session referencing it.
    ///
    /// Returns the number of sessions removed.
    pub fn delete_subject(&mut self, id: Uuid) -> Result<usize> {
        let index = self
            .subjects
            .iter()
            .position(|s| s.id == id)
            .ok_or(StudyError::SubjectNotFound(id))?;
        self.subjects.remove(index);

        let before = self.sessions.len();
        self.sessions.retain(|s| s.subject_id != id);
        Ok(before - self.sessions.len())
    }

    /// Validate and store a new session, auto-titling it when no title is given.
    pub fn add_session(&mut self, input: &NewSession) -> Result<&Session> {
        let valid = input.validate(&self.subjects)?;
        let delta = CounterDelta::created(valid.status);

        let subject = self.subject_mut(valid.subject_id)?;
        let counters = checked_apply(subject, delta)?;
        let title = valid
            .title
            .unwrap_or_else(|| format!("S{}", subject.next_session_number));
        subject.next_session_number += 1;
        subject.set_counters(counters);

        let index = self.sessions.len();
        self.sessions.push(Session {
            id: Uuid::new_v4(),
            user_id: self.user_id,
            subject_id: valid.subject_id,
            title,
            description: valid.description,
            duration: valid.duration,
            status: valid.status,
            date: valid.date,
        });
        Ok(&self.sessions[index])
    }

    /// Change a session's status, returning the delta applied to its subject.
    pub fn update_session_status(&mut self, id: Uuid, status: SessionStatus) -> Result<CounterDelta> {
        let (subject_id, old) = {
            let session = self.session_ref(id)?;
            (session.subject_id, session.status)
        };
        let delta = CounterDelta::status_change(old, status);
        if delta.is_zero() {
            return Ok(delta);
        }

        self.adjust_counters(subject_id, delta)?;
        self.session_mut(id)?.status = status;
        Ok(delta)
    }

    /// Edit a session's descriptive fields. Status and subject are unchanged.
    pub fn edit_session(&mut self, id: Uuid, edit: &SessionEdit) -> Result<&Session> {
        let valid = edit.validate()?;
        let session = self.session_mut(id)?;
        if let Some(title) = valid.title {
            session.title = title;
        }
        if let Some(description) = valid.description {
            session.description = description;
        }
        if let Some(duration) = valid.duration {
            session.duration = duration;
        }
        if let Some(date) = valid.date {
            session.date = date;
        }
        Ok(&*session)
    }

    /// Remove a session and decrement its subject's counters.
    pub fn delete_session(&mut self, id: Uuid) -> Result<Session> {
        let index = self
            .sessions
            .iter()
            .position(|s| s.id == id)
            .ok_or(StudyError::SessionNotFound(id))?;
        let (subject_id, status) = (self.sessions[index].subject_id, self.sessions[index].status);

        self.adjust_counters(subject_id, CounterDelta::deleted(status))?;
        Ok(self.sessions.remove(index))
    }

    pub fn summary(&self, streak: &UserStreakState) -> StudySummary {
        compute_summary(&self.subjects, &self.sessions, streak)
    }

    /// Rebuild every subject's counters from the sessions.
    ///
    /// Returns the drifts found before they were corrected.
    pub fn reconcile(&mut self) -> Vec<CounterDrift> {
        let drifts = reconcile_counters(&self.subjects, &self.sessions);
        for drift in &drifts {
            if let Some(subject) = self.subjects.iter_mut().find(|s| s.id == drift.subject_id) {
                subject.set_counters(drift.actual);
            }
        }
        drifts
    }

    fn adjust_counters(&mut self, subject_id: Uuid, delta: CounterDelta) -> Result<()> {
        let subject = self.subject_mut(subject_id)?;
        let counters = checked_apply(subject, delta)?;
        subject.set_counters(counters);
        Ok(())
    }

    fn subject_mut(&mut self, id: Uuid) -> Result<&mut Subject> {
        self.subjects
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(StudyError::SubjectNotFound(id))
    }

    fn session_ref(&self, id: Uuid) -> Result<&Session> {
        self.session(id).ok_or(StudyError::SessionNotFound(id))
    }

    fn session_mut(&mut self, id: Uuid) -> Result<&mut Session> {
        self.sessions
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(StudyError::SessionNotFound(id))
    }
}

fn checked_apply(subject: &Subject, delta: CounterDelta) -> Result<SubjectCounters> {
    subject
        .counters()
        .apply(delta)
        .ok_or(StudyError::CounterDriftDetected {
            subject_id: subject.id,
            counters: subject.counters(),
            delta,
        })
}
