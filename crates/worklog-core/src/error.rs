//! Error types for engine operations.

use thiserror::Error;
use worklog_models::Session;
use worklog_persistence::StoreError;

/// Errors that can occur during session engine operations.
///
/// `AlreadyActive` and `NoActiveSession` are expected control-flow
/// outcomes: callers always branch on them and surface them as plain user
/// messages, never as logged errors. `Storage` is the fatal path, reached
/// only after the engine's single retry.
#[derive(Error, Debug)]
pub enum EngineError {
    /// A start was issued while a session is already running. Carries the
    /// existing active session so callers can tell the user what to stop.
    #[error("a session is already active for this user: {}", .0.task_name)]
    AlreadyActive(Box<Session>),

    /// A stop or status-dependent operation found no active session.
    #[error("no active session for this user")]
    NoActiveSession,

    /// Start was called with an empty task name.
    #[error("task name must not be empty")]
    EmptyTaskName,

    /// Storage failure, already retried once.
    #[error("storage error: {0}")]
    Storage(#[from] StoreError),

    /// Lock poisoned (thread panicked while holding a user lock).
    #[error("lock poisoned: {0}")]
    LockPoisoned(String),
}

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;
