//! Read-side summary models produced by the report aggregator.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::session::Session;

/// Minutes accumulated against one task label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskMinutes {
    pub task_name: String,
    pub minutes: i64,
}

/// Minutes accumulated on one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayMinutes {
    pub date: NaiveDate,
    pub minutes: i64,
}

/// One day's completed work for one user.
///
/// An empty day (`total_minutes == 0`, no sessions) is a valid summary,
/// not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailySummary {
    pub date: NaiveDate,
    /// Sum of completed-session durations, in minutes.
    pub total_minutes: i64,
    /// Number of completed sessions.
    pub session_count: u32,
    /// Per-task totals, sorted by minutes descending (name ascending on ties).
    pub per_task: Vec<TaskMinutes>,
}

impl DailySummary {
    /// An empty summary for a day with no completed sessions.
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            total_minutes: 0,
            session_count: 0,
            per_task: Vec::new(),
        }
    }
}

/// A fixed 7-day window of completed work for one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklySummary {
    /// First day of the window; the window is `[from, from + 7 days)`.
    pub from: NaiveDate,
    /// Sum over the whole window, in minutes.
    pub total_minutes: i64,
    /// One entry per day, dates ascending, zero-minute days included.
    pub per_day: Vec<DayMinutes>,
}

/// Snapshot of a user's currently active session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActiveSessionInfo {
    pub session: Session,
    /// Whole minutes since the session started.
    pub elapsed_minutes: i64,
}

/// Formats a minute total as a human-readable duration string.
pub fn format_minutes(minutes: i64) -> String {
    let hours = minutes / 60;
    let rest = minutes % 60;
    if hours > 0 {
        format!("{}h {}m", hours, rest)
    } else {
        format!("{}m", rest)
    }
}
