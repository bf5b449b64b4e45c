//! Session store: durable log of tracked work sessions.

use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use tracing::warn;
use worklog_models::{Session, SessionDraft, SessionId, UserId};

use crate::atomic::{atomic_write_json, read_json};
use crate::error::{Result, StoreError};

/// Manages persistence of session records.
///
/// Sessions are stored as individual JSON files organized by user:
/// ```text
/// base_path/
/// └── sessions/
///     └── {user_id}/
///         ├── sess-abc123.json
///         └── sess-def456.json
/// ```
///
/// The store is pure persistence. It enforces no policy beyond its
/// query contracts: `find_active` returns at most one record, and
/// `query_range` returns only completed records.
pub struct SessionStore {
    base_path: PathBuf,
}

impl SessionStore {
    /// Creates a new SessionStore rooted at the given base path.
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    /// Returns the path to a user's session directory.
    fn user_dir(&self, user_id: &UserId) -> PathBuf {
        self.base_path.join("sessions").join(user_id.as_str())
    }

    /// Returns the path to a specific session file.
    fn session_path(&self, user_id: &UserId, session_id: &SessionId) -> PathBuf {
        self.user_dir(user_id).join(format!("{}.json", session_id))
    }

    /// Appends a new active session record and returns it.
    pub fn insert(&self, draft: SessionDraft) -> Result<Session> {
        let session = Session::from_draft(draft);
        let path = self.session_path(&session.user_id, &session.id);
        atomic_write_json(&path, &session)?;
        Ok(session)
    }

    /// Sets the terminal fields on exactly one still-active record.
    ///
    /// The end timestamp and duration are written in a single atomic file
    /// replace, so a record is never observed half-completed. Fails with
    /// `NotFound` if the id does not reference an existing, still-active
    /// session.
    pub fn complete(
        &self,
        user_id: &UserId,
        session_id: &SessionId,
        ended_at: DateTime<Utc>,
        notes: Option<String>,
    ) -> Result<Session> {
        let path = self.session_path(user_id, session_id);
        if !path.exists() {
            return Err(StoreError::NotFound {
                kind: "session".to_string(),
                id: session_id.to_string(),
            });
        }

        let mut session: Session = read_json(&path)?;
        if !session.is_active() {
            return Err(StoreError::NotFound {
                kind: "active session".to_string(),
                id: session_id.to_string(),
            });
        }

        session.complete(ended_at, notes);
        atomic_write_json(&path, &session)?;
        Ok(session)
    }

    /// Returns the single active session for a user, or `None`.
    ///
    /// Under correct concurrency control at most one active record can
    /// exist. If the store ever holds more, the most recently started one
    /// (id as tiebreaker) is returned deterministically and the condition
    /// is logged as an integrity warning rather than silently accepted.
    pub fn find_active(&self, user_id: &UserId) -> Result<Option<Session>> {
        let mut active: Vec<Session> = self
            .list_user_sessions(user_id)?
            .into_iter()
            .filter(Session::is_active)
            .collect();

        if active.len() > 1 {
            warn!(
                user_id = %user_id,
                count = active.len(),
                "integrity: multiple active sessions found, using most recent"
            );
        }

        active.sort_by(|a, b| {
            a.started_at
                .cmp(&b.started_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(active.pop())
    }

    /// Returns completed sessions whose start date falls in `[from, to)`.
    ///
    /// Dates are civil dates in the given reporting offset. Records are
    /// ordered by `started_at` ascending.
    pub fn query_range(
        &self,
        user_id: &UserId,
        from: NaiveDate,
        to: NaiveDate,
        offset: FixedOffset,
    ) -> Result<Vec<Session>> {
        let mut sessions: Vec<Session> = self
            .list_user_sessions(user_id)?
            .into_iter()
            .filter(|s| !s.is_active())
            .filter(|s| {
                let date = s.started_at.with_timezone(&offset).date_naive();
                date >= from && date < to
            })
            .collect();

        sessions.sort_by(|a, b| a.started_at.cmp(&b.started_at));
        Ok(sessions)
    }

    /// Loads all of a user's session records.
    ///
    /// Individual unreadable files are skipped with a warning; a missing
    /// user directory is an empty log, not an error.
    fn list_user_sessions(&self, user_id: &UserId) -> Result<Vec<Session>> {
        let dir = self.user_dir(user_id);
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let entries = fs::read_dir(&dir).map_err(|source| StoreError::ReadError {
            path: dir.clone(),
            source,
        })?;

        let mut sessions = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| StoreError::ReadError {
                path: dir.clone(),
                source,
            })?;

            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                match read_json::<Session>(&path) {
                    Ok(session) => sessions.push(session),
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "skipping unreadable session file");
                    }
                }
            }
        }

        Ok(sessions)
    }
}
