//! PostgreSQL database operations
//!
//! Every write that changes a subject's counters runs in a transaction that
//! first locks the subject row, so counter updates for one subject are
//! serialized.

use sqlx::{postgres::PgPoolOptions, PgPool, Postgres, Transaction};
use studyflow_core::stats::recompute_subject_counters;
use studyflow_core::validation::{ValidSession, ValidSessionEdit};
use studyflow_core::{StudyError, ValidationError};
use uuid::Uuid;

use crate::error::{ApiError, Result};
use crate::models::*;

/// Database wrapper with connection pool
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Connect to PostgreSQL and create connection pool
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    /// Run database migrations
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| ApiError::Migration(e.to_string()))?;
        Ok(())
    }

    /// Get the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    // === User Repository ===

    /// Create a new user with generated token
    pub async fn create_user(&self, name: Option<&str>) -> Result<User> {
        let token = Uuid::new_v4().to_string();
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, token, name)
            VALUES ($1, $2, $3)
            RETURNING id, token, name, created_at, last_seen_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&token)
        .bind(name)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    /// Get user by token
    pub async fn get_user_by_token(&self, token: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, token, name, created_at, last_seen_at
            FROM users
            WHERE token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Update user last_seen_at timestamp
    pub async fn update_last_seen(&self, user_id: Uuid) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET last_seen_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // === Subject Repository ===

    /// List a user's subjects, newest first
    pub async fn list_subjects(&self, user_id: Uuid) -> Result<Vec<DbSubject>> {
        let subjects = sqlx::query_as::<_, DbSubject>(
            r#"
            SELECT id, user_id, name, color, total_sessions, completed_sessions,
                   skipped_sessions, next_session_number, created_at, updated_at
            FROM subjects
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(subjects)
    }

    /// Get subject by ID
    pub async fn get_subject(&self, user_id: Uuid, subject_id: Uuid) -> Result<Option<DbSubject>> {
        let subject = sqlx::query_as::<_, DbSubject>(
            r#"
            SELECT id, user_id, name, color, total_sessions, completed_sessions,
                   skipped_sessions, next_session_number, created_at, updated_at
            FROM subjects
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(subject_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(subject)
    }

    /// Create a subject with zeroed counters
    pub async fn create_subject(&self, user_id: Uuid, name: &str, color: &str) -> Result<DbSubject> {
        let subject = sqlx::query_as::<_, DbSubject>(
            r#"
            INSERT INTO subjects (id, user_id, name, color)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, name, color, total_sessions, completed_sessions,
                      skipped_sessions, next_session_number, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(name)
        .bind(color)
        .fetch_one(&self.pool)
        .await?;

        Ok(subject)
    }

    /// Rename or recolor a subject; `None` keeps the current value
    pub async fn update_subject(
        &self,
        user_id: Uuid,
        subject_id: Uuid,
        name: Option<&str>,
        color: Option<&str>,
    ) -> Result<Option<DbSubject>> {
        let subject = sqlx::query_as::<_, DbSubject>(
            r#"
            UPDATE subjects
            SET name = COALESCE($3, name),
                color = COALESCE($4, color),
                updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING id, user_id, name, color, total_sessions, completed_sessions,
                      skipped_sessions, next_session_number, created_at, updated_at
            "#,
        )
        .bind(subject_id)
        .bind(user_id)
        .bind(name)
        .bind(color)
        .fetch_optional(&self.pool)
        .await?;

        Ok(subject)
    }

    /// Delete a subject and its sessions.
    ///
    /// Returns the number of sessions removed, or `None` if the subject does
    /// not exist.
    pub async fn delete_subject(&self, user_id: Uuid, subject_id: Uuid) -> Result<Option<usize>> {
        let mut tx = self.pool.begin().await?;

        if lock_subject(&mut tx, user_id, subject_id).await?.is_none() {
            return Ok(None);
        }

        let removed = sqlx::query("DELETE FROM sessions WHERE subject_id = $1")
            .bind(subject_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        sqlx::query("DELETE FROM subjects WHERE id = $1")
            .bind(subject_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(removed as usize))
    }

    /// Overwrite a subject's cached counters
    pub async fn update_subject_counters(
        &self,
        subject_id: Uuid,
        counters: &SubjectCounters,
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        write_counters(&mut tx, subject_id, counters).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Recompute a subject's counters from its sessions and store them.
    ///
    /// Returns the subject after repair and the drift that was corrected, if
    /// any, or `None` if the subject does not exist.
    pub async fn reconcile_subject(
        &self,
        user_id: Uuid,
        subject_id: Uuid,
    ) -> Result<Option<(DbSubject, Option<CounterDrift>)>> {
        let mut tx = self.pool.begin().await?;

        let Some(mut subject) = lock_subject(&mut tx, user_id, subject_id).await? else {
            return Ok(None);
        };

        let rows = sqlx::query_as::<_, DbSession>(
            r#"
            SELECT id, user_id, subject_id, title, description, duration, status, date,
                   created_at, updated_at
            FROM sessions
            WHERE subject_id = $1
            "#,
        )
        .bind(subject_id)
        .fetch_all(&mut *tx)
        .await?;
        let sessions = to_core_sessions(&rows)?;

        let stored = subject.counters();
        let actual = recompute_subject_counters(&subject.to_core_subject(), &sessions);
        if stored == actual {
            return Ok(Some((subject, None)));
        }

        write_counters(&mut tx, subject_id, &actual).await?;
        tx.commit().await?;

        subject.total_sessions = actual.total_sessions as i32;
        subject.completed_sessions = actual.completed_sessions as i32;
        subject.skipped_sessions = actual.skipped_sessions as i32;

        Ok(Some((
            subject,
            Some(CounterDrift {
                subject_id,
                stored,
                actual,
            }),
        )))
    }

    // === Snapshot ===

    /// Read all of a user's subjects and sessions as one consistent snapshot.
    ///
    /// Both reads run in a single REPEATABLE READ transaction, so a write
    /// committed between them cannot show up in one list but not the other.
    pub async fn load_snapshot(&self, user_id: Uuid) -> Result<(Vec<DbSubject>, Vec<DbSession>)> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await?;

        let subjects = sqlx::query_as::<_, DbSubject>(
            r#"
            SELECT id, user_id, name, color, total_sessions, completed_sessions,
                   skipped_sessions, next_session_number, created_at, updated_at
            FROM subjects
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&mut *tx)
        .await?;

        let sessions = sqlx::query_as::<_, DbSession>(
            r#"
            SELECT id, user_id, subject_id, title, description, duration, status, date,
                   created_at, updated_at
            FROM sessions
            WHERE user_id = $1
            ORDER BY date DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok((subjects, sessions))
    }

    // === Session Repository ===

    /// List a user's sessions, newest first
    pub async fn list_sessions(&self, user_id: Uuid, filter: &SessionFilter) -> Result<Vec<DbSession>> {
        let sessions = sqlx::query_as::<_, DbSession>(
            r#"
            SELECT id, user_id, subject_id, title, description, duration, status, date,
                   created_at, updated_at
            FROM sessions
            WHERE user_id = $1
              AND ($2::UUID IS NULL OR subject_id = $2)
              AND ($3::TEXT IS NULL OR status = $3)
            ORDER BY date DESC
            "#,
        )
        .bind(user_id)
        .bind(filter.subject_id)
        .bind(filter.status.map(|s| s.as_str()))
        .fetch_all(&self.pool)
        .await?;

        Ok(sessions)
    }

    /// Get session by ID
    pub async fn get_session(&self, user_id: Uuid, session_id: Uuid) -> Result<Option<DbSession>> {
        let session = sqlx::query_as::<_, DbSession>(
            r#"
            SELECT id, user_id, subject_id, title, description, duration, status, date,
                   created_at, updated_at
            FROM sessions
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(session_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(session)
    }

    /// Insert a session, auto-titling it from the subject's session number
    /// and adjusting the subject's counters.
    pub async fn create_session(&self, user_id: Uuid, session: &ValidSession) -> Result<DbSession> {
        let mut tx = self.pool.begin().await?;

        let subject = lock_subject(&mut tx, user_id, session.subject_id)
            .await?
            .ok_or(ValidationError::UnknownSubject(session.subject_id))?;

        let counters = apply_delta(&subject, CounterDelta::created(session.status))?;
        let title = session
            .title
            .clone()
            .unwrap_or_else(|| format!("S{}", subject.next_session_number));

        let created = sqlx::query_as::<_, DbSession>(
            r#"
            INSERT INTO sessions (id, user_id, subject_id, title, description, duration, status, date)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, user_id, subject_id, title, description, duration, status, date,
                      created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(session.subject_id)
        .bind(&title)
        .bind(&session.description)
        .bind(duration_column(session.duration)?)
        .bind(session.status.as_str())
        .bind(session.date)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE subjects
            SET next_session_number = next_session_number + 1
            WHERE id = $1
            "#,
        )
        .bind(session.subject_id)
        .execute(&mut *tx)
        .await?;
        write_counters(&mut tx, session.subject_id, &counters).await?;

        tx.commit().await?;
        Ok(created)
    }

    /// Update a session's descriptive fields
    pub async fn edit_session(
        &self,
        user_id: Uuid,
        session_id: Uuid,
        edit: &ValidSessionEdit,
    ) -> Result<Option<DbSession>> {
        let session = sqlx::query_as::<_, DbSession>(
            r#"
            UPDATE sessions
            SET title = COALESCE($3, title),
                description = CASE WHEN $4 THEN $5 ELSE description END,
                duration = COALESCE($6, duration),
                date = COALESCE($7, date),
                updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING id, user_id, subject_id, title, description, duration, status, date,
                      created_at, updated_at
            "#,
        )
        .bind(session_id)
        .bind(user_id)
        .bind(&edit.title)
        .bind(edit.description.is_some())
        .bind(edit.description.clone().flatten())
        .bind(edit.duration.map(duration_column).transpose()?)
        .bind(edit.date)
        .fetch_optional(&self.pool)
        .await?;

        Ok(session)
    }

    /// Change a session's status and apply the counter delta to its subject.
    ///
    /// Returns `None` if the session does not exist.
    pub async fn update_session_status(
        &self,
        user_id: Uuid,
        session_id: Uuid,
        status: SessionStatus,
    ) -> Result<Option<(DbSession, CounterDelta)>> {
        let Some(existing) = self.get_session(user_id, session_id).await? else {
            return Ok(None);
        };

        let mut tx = self.pool.begin().await?;

        let subject = lock_subject(&mut tx, user_id, existing.subject_id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("Subject {}", existing.subject_id)))?;
        let Some(current) = lock_session(&mut tx, user_id, session_id).await? else {
            return Ok(None);
        };

        let delta = CounterDelta::status_change(current.status()?, status);
        if delta.is_zero() {
            return Ok(Some((current, delta)));
        }
        let counters = apply_delta(&subject, delta)?;

        let updated = sqlx::query_as::<_, DbSession>(
            r#"
            UPDATE sessions
            SET status = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, user_id, subject_id, title, description, duration, status, date,
                      created_at, updated_at
            "#,
        )
        .bind(session_id)
        .bind(status.as_str())
        .fetch_one(&mut *tx)
        .await?;
        write_counters(&mut tx, subject.id, &counters).await?;

        tx.commit().await?;
        Ok(Some((updated, delta)))
    }

    /// Delete a session and decrement its subject's counters.
    ///
    /// Returns the deleted session, or `None` if it does not exist.
    pub async fn delete_session(&self, user_id: Uuid, session_id: Uuid) -> Result<Option<DbSession>> {
        let Some(existing) = self.get_session(user_id, session_id).await? else {
            return Ok(None);
        };

        let mut tx = self.pool.begin().await?;

        let subject = lock_subject(&mut tx, user_id, existing.subject_id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("Subject {}", existing.subject_id)))?;
        let Some(current) = lock_session(&mut tx, user_id, session_id).await? else {
            return Ok(None);
        };

        let counters = apply_delta(
            &subject,
            CounterDelta::deleted(current.status()?),
        )?;

        sqlx::query("DELETE FROM sessions WHERE id = $1")
            .bind(session_id)
            .execute(&mut *tx)
            .await?;
        write_counters(&mut tx, subject.id, &counters).await?;

        tx.commit().await?;
        Ok(Some(current))
    }

    // === Streak Repository ===

    /// Get the user's login streak, if any activity was recorded
    pub async fn get_streak_state(&self, user_id: Uuid) -> Result<Option<UserStreakState>> {
        let stats = sqlx::query_as::<_, DbUserStats>(
            r#"
            SELECT user_id, current_streak, longest_streak, last_active_date,
                   created_at, updated_at
            FROM user_stats
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(stats.map(|s| s.to_core_state()))
    }

    /// Insert or replace the user's login streak
    pub async fn upsert_streak_state(&self, user_id: Uuid, state: &UserStreakState) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO user_stats (user_id, current_streak, longest_streak, last_active_date)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id) DO UPDATE SET
                current_streak = EXCLUDED.current_streak,
                longest_streak = EXCLUDED.longest_streak,
                last_active_date = EXCLUDED.last_active_date,
                updated_at = NOW()
            "#,
        )
        .bind(user_id)
        .bind(state.current_streak as i32)
        .bind(state.longest_streak as i32)
        .bind(state.last_active_date)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

async fn lock_subject(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    subject_id: Uuid,
) -> Result<Option<DbSubject>> {
    let subject = sqlx::query_as::<_, DbSubject>(
        r#"
        SELECT id, user_id, name, color, total_sessions, completed_sessions,
               skipped_sessions, next_session_number, created_at, updated_at
        FROM subjects
        WHERE id = $1 AND user_id = $2
        FOR UPDATE
        "#,
    )
    .bind(subject_id)
    .bind(user_id)
    .fetch_optional(&mut **tx)
    .await?;

    Ok(subject)
}

async fn lock_session(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    session_id: Uuid,
) -> Result<Option<DbSession>> {
    let session = sqlx::query_as::<_, DbSession>(
        r#"
        SELECT id, user_id, subject_id, title, description, duration, status, date,
               created_at, updated_at
        FROM sessions
        WHERE id = $1 AND user_id = $2
        FOR UPDATE
        "#,
    )
    .bind(session_id)
    .bind(user_id)
    .fetch_optional(&mut **tx)
    .await?;

    Ok(session)
}

async fn write_counters(
    tx: &mut Transaction<'_, Postgres>,
    subject_id: Uuid,
    counters: &SubjectCounters,
) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE subjects
        SET total_sessions = $2,
            completed_sessions = $3,
            skipped_sessions = $4,
            updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(subject_id)
    .bind(counters.total_sessions as i32)
    .bind(counters.completed_sessions as i32)
    .bind(counters.skipped_sessions as i32)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

fn duration_column(minutes: u32) -> Result<i32> {
    i32::try_from(minutes).map_err(|_| ValidationError::InvalidDuration(i64::from(minutes)).into())
}

fn apply_delta(subject: &DbSubject, delta: CounterDelta) -> Result<SubjectCounters> {
    let counters = subject.counters();
    counters.apply(delta).ok_or_else(|| {
        StudyError::CounterDriftDetected {
            subject_id: subject.id,
            counters,
            delta,
        }
        .into()
    })
}
