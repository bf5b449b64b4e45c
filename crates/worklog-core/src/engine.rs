//! SessionEngine - enforces the one-active-session-per-user invariant.
//!
//! The engine is the sole writer of the session store. Start and stop for
//! a single user are serialized by a per-user lock held across the whole
//! check-then-act sequence; operations for different users never contend.
//! Reads (`status`) take no per-user lock.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::{debug, warn};
use worklog_models::{ActiveSessionInfo, Session, SessionDraft, UserId};
use worklog_persistence::SessionStore;

use crate::clock::Clock;
use crate::error::{EngineError, Result};

/// Runs a storage operation, retrying exactly once on failure.
///
/// A second failure is fatal for this request only; the process keeps
/// serving other requests.
fn retry_once<T>(op: &str, mut f: impl FnMut() -> worklog_persistence::Result<T>) -> Result<T> {
    match f() {
        Ok(value) => Ok(value),
        Err(first) => {
            warn!(op, error = %first, "storage operation failed, retrying once");
            f().map_err(EngineError::Storage)
        }
    }
}

/// The time-tracking session engine.
///
/// Constructed once at process start from an explicit store handle and an
/// injected clock; no global state.
pub struct SessionEngine {
    /// Persistence for session records.
    store: Arc<SessionStore>,
    /// Time source.
    clock: Arc<dyn Clock>,
    /// Per-user write locks (user_id -> lock).
    user_locks: Mutex<HashMap<UserId, Arc<Mutex<()>>>>,
}

impl SessionEngine {
    /// Creates a new engine over the given store and clock.
    pub fn new(store: Arc<SessionStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            user_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the lock serializing writes for one user.
    fn user_lock(&self, user_id: &UserId) -> Result<Arc<Mutex<()>>> {
        let mut locks = self
            .user_locks
            .lock()
            .map_err(|e| EngineError::LockPoisoned(e.to_string()))?;
        Ok(locks.entry(user_id.clone()).or_default().clone())
    }

    /// Starts tracking a task for a user.
    ///
    /// Fails with `AlreadyActive` (carrying the untouched existing
    /// session) if the user already has one running; the caller surfaces
    /// that as "stop first", it is not an error state.
    pub fn start(
        &self,
        user_id: &UserId,
        task_name: &str,
        task_ref: Option<String>,
    ) -> Result<Session> {
        let task_name = task_name.trim();
        if task_name.is_empty() {
            return Err(EngineError::EmptyTaskName);
        }

        let lock = self.user_lock(user_id)?;
        let _guard = lock
            .lock()
            .map_err(|e| EngineError::LockPoisoned(e.to_string()))?;

        if let Some(existing) = retry_once("find_active", || self.store.find_active(user_id))? {
            return Err(EngineError::AlreadyActive(Box::new(existing)));
        }

        let draft = SessionDraft {
            user_id: user_id.clone(),
            task_name: task_name.to_string(),
            task_ref,
            started_at: self.clock.now(),
        };
        let session = retry_once("insert", || self.store.insert(draft.clone()))?;
        debug!(user_id = %user_id, session_id = %session.id, task = %session.task_name, "session started");
        Ok(session)
    }

    /// Stops the user's active session and returns the completed record.
    ///
    /// The duration is computed here once, as whole minutes rounded
    /// half-up, and never recomputed. Fails with `NoActiveSession` if
    /// nothing is running; the store is left unchanged in that case.
    pub fn stop(&self, user_id: &UserId, notes: Option<String>) -> Result<Session> {
        let lock = self.user_lock(user_id)?;
        let _guard = lock
            .lock()
            .map_err(|e| EngineError::LockPoisoned(e.to_string()))?;

        let active = retry_once("find_active", || self.store.find_active(user_id))?
            .ok_or(EngineError::NoActiveSession)?;

        let ended_at = self.clock.now();
        let completed = retry_once("complete", || {
            self.store
                .complete(user_id, &active.id, ended_at, notes.clone())
        })?;
        debug!(
            user_id = %user_id,
            session_id = %completed.id,
            minutes = completed.duration_minutes.unwrap_or(0),
            "session stopped"
        );
        Ok(completed)
    }

    /// Returns the user's active session with live elapsed minutes.
    ///
    /// Read-only; mutates nothing and takes no per-user lock.
    pub fn status(&self, user_id: &UserId) -> Result<Option<ActiveSessionInfo>> {
        let active = retry_once("find_active", || self.store.find_active(user_id))?;
        Ok(active.map(|session| {
            let elapsed_minutes = session.elapsed_minutes(self.clock.now());
            ActiveSessionInfo {
                session,
                elapsed_minutes,
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::manual::ManualClock;
    use crate::clock::SystemClock;
    use chrono::{Duration, TimeZone, Utc};
    use tempfile::tempdir;
    use worklog_persistence::StoreError;

    fn io_failure() -> StoreError {
        StoreError::ReadError {
            path: "/dev/null/sessions".into(),
            source: std::io::Error::new(std::io::ErrorKind::Other, "disk unplugged"),
        }
    }

    #[test]
    fn test_retry_once_recovers_from_transient_failure() {
        let mut calls = 0;
        let value = retry_once("op", || {
            calls += 1;
            if calls == 1 {
                Err(io_failure())
            } else {
                Ok(7)
            }
        })
        .unwrap();

        assert_eq!(value, 7);
        assert_eq!(calls, 2);
    }

    #[test]
    fn test_retry_once_gives_up_after_second_failure() {
        let mut calls = 0;
        let result: Result<i32> = retry_once("op", || {
            calls += 1;
            Err(io_failure())
        });

        // Exactly one retry, then the failure is fatal for this request.
        assert_eq!(calls, 2);
        assert!(matches!(result, Err(EngineError::Storage(_))));
    }

    fn nine_am() -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 11, 9, 0, 0).unwrap()
    }

    fn engine_with_clock(dir: &std::path::Path) -> (SessionEngine, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(nine_am()));
        let store = Arc::new(SessionStore::new(dir));
        (SessionEngine::new(store, clock.clone()), clock)
    }

    #[test]
    fn test_start_creates_active_session() {
        let dir = tempdir().unwrap();
        let (engine, _) = engine_with_clock(dir.path());
        let user = UserId::from("user-anton");

        let session = engine.start(&user, "Report A", None).unwrap();

        assert!(session.is_active());
        assert_eq!(session.started_at, nine_am());
        assert_eq!(session.task_name, "Report A");
    }

    #[test]
    fn test_start_rejects_empty_task_name() {
        let dir = tempdir().unwrap();
        let (engine, _) = engine_with_clock(dir.path());
        let user = UserId::from("user-anton");

        assert!(matches!(
            engine.start(&user, "   ", None),
            Err(EngineError::EmptyTaskName)
        ));
        assert!(engine.status(&user).unwrap().is_none());
    }

    #[test]
    fn test_start_while_active_returns_existing_unmodified() {
        let dir = tempdir().unwrap();
        let (engine, clock) = engine_with_clock(dir.path());
        let user = UserId::from("user-anton");

        let first = engine.start(&user, "Report A", None).unwrap();
        clock.advance(Duration::minutes(5));

        match engine.start(&user, "Report B", None) {
            Err(EngineError::AlreadyActive(existing)) => {
                assert_eq!(existing.id, first.id);
                assert_eq!(existing.started_at, first.started_at);
                assert_eq!(existing.task_name, "Report A");
            }
            other => panic!("expected AlreadyActive, got {:?}", other.map(|s| s.task_name)),
        }

        // The active session is untouched.
        let status = engine.status(&user).unwrap().unwrap();
        assert_eq!(status.session.id, first.id);
        assert_eq!(status.session.started_at, first.started_at);
    }

    #[test]
    fn test_stop_computes_round_half_up_duration() {
        let dir = tempdir().unwrap();
        let (engine, clock) = engine_with_clock(dir.path());
        let user = UserId::from("user-anton");

        engine.start(&user, "Report A", None).unwrap();
        clock.advance(Duration::minutes(45) + Duration::seconds(29));
        let completed = engine.stop(&user, None).unwrap();
        assert_eq!(completed.duration_minutes, Some(45));

        engine.start(&user, "Report B", None).unwrap();
        clock.advance(Duration::minutes(20) + Duration::seconds(30));
        let completed = engine.stop(&user, Some("sent".to_string())).unwrap();
        assert_eq!(completed.duration_minutes, Some(21));
        assert_eq!(completed.notes, Some("sent".to_string()));
    }

    #[test]
    fn test_second_stop_fails_no_active() {
        let dir = tempdir().unwrap();
        let (engine, clock) = engine_with_clock(dir.path());
        let user = UserId::from("user-anton");

        engine.start(&user, "Report A", None).unwrap();
        clock.advance(Duration::minutes(10));
        engine.stop(&user, None).unwrap();

        assert!(matches!(
            engine.stop(&user, None),
            Err(EngineError::NoActiveSession)
        ));
    }

    #[test]
    fn test_stop_without_start_leaves_store_unchanged() {
        let dir = tempdir().unwrap();
        let (engine, _) = engine_with_clock(dir.path());
        let user = UserId::from("user-anton");

        assert!(matches!(
            engine.stop(&user, None),
            Err(EngineError::NoActiveSession)
        ));
        assert!(engine.status(&user).unwrap().is_none());
    }

    #[test]
    fn test_status_elapsed_minutes() {
        let dir = tempdir().unwrap();
        let (engine, clock) = engine_with_clock(dir.path());
        let user = UserId::from("user-anton");

        engine.start(&user, "Report A", None).unwrap();
        clock.advance(Duration::minutes(20) + Duration::seconds(29));

        let info = engine.status(&user).unwrap().unwrap();
        assert_eq!(info.elapsed_minutes, 20);
        assert!(info.session.is_active());

        // status does not mutate
        let again = engine.status(&user).unwrap().unwrap();
        assert_eq!(again.session.id, info.session.id);
    }

    #[test]
    fn test_users_do_not_interfere() {
        let dir = tempdir().unwrap();
        let (engine, _) = engine_with_clock(dir.path());
        let anton = UserId::from("user-anton");
        let andrey = UserId::from("user-andrey");

        engine.start(&anton, "Report A", None).unwrap();
        engine.start(&andrey, "Report B", None).unwrap();

        assert_eq!(
            engine.status(&anton).unwrap().unwrap().session.task_name,
            "Report A"
        );
        assert_eq!(
            engine.status(&andrey).unwrap().unwrap().session.task_name,
            "Report B"
        );
    }

    /// Randomized concurrent interleavings of start/stop must never leave
    /// more than one active session for a user.
    #[test]
    fn test_concurrent_start_stop_keeps_single_active() {
        let dir = tempdir().unwrap();
        let store = Arc::new(SessionStore::new(dir.path()));
        let engine = Arc::new(SessionEngine::new(store.clone(), Arc::new(SystemClock)));
        let user = UserId::from("user-race");

        let mut handles = Vec::new();
        for worker in 0..8 {
            let engine = engine.clone();
            let user = user.clone();
            handles.push(std::thread::spawn(move || {
                for i in 0..25 {
                    match engine.start(&user, &format!("task-{}-{}", worker, i), None) {
                        Ok(_) => {}
                        Err(EngineError::AlreadyActive(_)) => {}
                        Err(e) => panic!("unexpected start error: {}", e),
                    }
                    match engine.stop(&user, None) {
                        Ok(_) => {}
                        Err(EngineError::NoActiveSession) => {}
                        Err(e) => panic!("unexpected stop error: {}", e),
                    }
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        // The store may hold at most one active record: a single further
        // stop must drain it completely. A second lingering active record
        // would survive and fail the final assertion.
        let _ = engine.stop(&user, None);
        assert!(store.find_active(&user).unwrap().is_none());
    }
}
