//! Persistence layer for Worklog.
//!
//! This crate provides crash-safe persistence for the session log using
//! atomic file operations (write to temp file, then rename).
//!
//! # Example
//!
//! ```no_run
//! use worklog_persistence::SessionStore;
//! use worklog_models::{SessionDraft, UserId};
//! use chrono::Utc;
//!
//! let store = SessionStore::new("/home/user/.worklog");
//!
//! let session = store.insert(SessionDraft {
//!     user_id: UserId::from("user-anton"),
//!     task_name: "Drill report".to_string(),
//!     task_ref: None,
//!     started_at: Utc::now(),
//! }).unwrap();
//!
//! let active = store.find_active(&UserId::from("user-anton")).unwrap();
//! assert_eq!(active.unwrap().id, session.id);
//! ```

pub mod atomic;
pub mod error;
pub mod session_store;

pub use error::{Result, StoreError};
pub use session_store::SessionStore;
