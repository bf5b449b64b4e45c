//! Tracked work sessions.
//!
//! A session is one contiguous interval of a user working on one named
//! task. A session with `ended_at` absent is *active*; at most one active
//! session may exist per user at any time. Once ended, a session is
//! immutable and retained for reporting.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{SessionId, UserId};

/// Rounds a positive time delta to whole minutes, half-up.
///
/// 29 seconds round down, 30 seconds round up. Negative deltas (clock
/// skew) clamp to zero. This is the single rounding rule for both stored
/// durations and live elapsed values.
pub fn round_half_up_minutes(delta: Duration) -> i64 {
    let secs = delta.num_seconds().max(0);
    (secs + 30) / 60
}

/// Input for creating a new active session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionDraft {
    /// User the session belongs to.
    pub user_id: UserId,

    /// Free-text task label.
    pub task_name: String,

    /// Optional reference into the external task provider.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_ref: Option<String>,

    /// When work started.
    pub started_at: DateTime<Utc>,
}

/// One tracked work interval.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Unique identifier, assigned at creation.
    pub id: SessionId,

    /// User the session belongs to.
    pub user_id: UserId,

    /// Free-text task label.
    pub task_name: String,

    /// Optional reference into the external task provider.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_ref: Option<String>,

    /// When work started. Immutable.
    pub started_at: DateTime<Utc>,

    /// When work ended; `None` while the session is active.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,

    /// Whole minutes worked, computed once at stop time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<i64>,

    /// Free-text notes, set only at stop time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Session {
    /// Creates a new active session from a draft.
    pub fn from_draft(draft: SessionDraft) -> Self {
        Self {
            id: SessionId::new(),
            user_id: draft.user_id,
            task_name: draft.task_name,
            task_ref: draft.task_ref,
            started_at: draft.started_at,
            ended_at: None,
            duration_minutes: None,
            notes: None,
        }
    }

    /// Returns true while the session has no end timestamp.
    pub fn is_active(&self) -> bool {
        self.ended_at.is_none()
    }

    /// Sets the terminal fields.
    ///
    /// `ended_at` is clamped to `started_at` so the invariant
    /// `ended_at >= started_at` holds even if the clock ran backwards.
    /// The duration is computed here, exactly once, and never recomputed.
    pub fn complete(&mut self, ended_at: DateTime<Utc>, notes: Option<String>) {
        let ended_at = ended_at.max(self.started_at);
        self.ended_at = Some(ended_at);
        self.duration_minutes = Some(round_half_up_minutes(ended_at - self.started_at));
        self.notes = notes;
    }

    /// Elapsed whole minutes since start, for an active session.
    pub fn elapsed_minutes(&self, now: DateTime<Utc>) -> i64 {
        round_half_up_minutes(now - self.started_at)
    }
}
