//! Core data models for Worklog.
//!
//! This crate provides the fundamental data types used throughout the
//! Worklog system: tracked sessions, report summaries, and external
//! task-provider items.

pub mod ids;
pub mod report;
pub mod session;
pub mod task;

// Re-export main types
pub use ids::{SessionId, UserId};
pub use report::{ActiveSessionInfo, DailySummary, DayMinutes, TaskMinutes, WeeklySummary};
pub use session::{round_half_up_minutes, Session, SessionDraft};
pub use task::ProviderTask;
