//! Items returned by the external task provider.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A task as reported by the external project-tracking service.
///
/// Only the fields the digest and list commands need; the provider owns
/// everything else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderTask {
    /// Provider-side identifier.
    pub ref_id: String,

    /// Task title.
    pub name: String,

    /// Display name of the assignee, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,

    /// Due date, if set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_on: Option<NaiveDate>,
}

impl ProviderTask {
    /// True if the task has a due date strictly before `today`.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.due_on.is_some_and(|due| due < today)
    }

    /// True if the task is due exactly on `today`.
    pub fn is_due_on(&self, today: NaiveDate) -> bool {
        self.due_on == Some(today)
    }

    /// True if the task is missing a due date or an assignee.
    pub fn is_untriaged(&self) -> bool {
        self.due_on.is_none() || self.assignee.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(due: Option<(i32, u32, u32)>, assignee: Option<&str>) -> ProviderTask {
        ProviderTask {
            ref_id: "123".to_string(),
            name: "Drill report".to_string(),
            assignee: assignee.map(|s| s.to_string()),
            due_on: due.map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).unwrap()),
        }
    }

    #[test]
    fn test_overdue() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 11).unwrap();
        assert!(task(Some((2024, 3, 10)), Some("Anton")).is_overdue(today));
        assert!(!task(Some((2024, 3, 11)), Some("Anton")).is_overdue(today));
        assert!(!task(None, Some("Anton")).is_overdue(today));
    }

    #[test]
    fn test_due_today() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 11).unwrap();
        assert!(task(Some((2024, 3, 11)), None).is_due_on(today));
        assert!(!task(Some((2024, 3, 12)), None).is_due_on(today));
    }

    #[test]
    fn test_untriaged() {
        assert!(task(None, Some("Anton")).is_untriaged());
        assert!(task(Some((2024, 3, 11)), None).is_untriaged());
        assert!(!task(Some((2024, 3, 11)), Some("Anton")).is_untriaged());
    }
}
