//! Team roster: mapping from chat handles to internal user records.
//!
//! Replaces an ad hoc hardcoded lookup table: the roster is a small JSON
//! file loaded once at startup and injected wherever identity resolution
//! is needed.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;
use worklog_models::UserId;

/// Errors loading the roster file.
#[derive(Error, Debug)]
pub enum RosterError {
    #[error("failed to read roster {path}: {source}")]
    ReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse roster: {0}")]
    ParseError(#[from] serde_json::Error),
}

/// One team member.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamMember {
    /// Internal user id the session log is keyed by.
    pub user_id: UserId,

    /// Human-readable name for digests and replies.
    pub display_name: String,

    /// Assignee id in the external task provider, if linked.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_assignee: Option<String>,

    /// Chat id digests are delivered to, once known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chat_id: Option<i64>,
}

/// Mapping from chat handle (with leading `@`) to team member.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Roster {
    members: HashMap<String, TeamMember>,
}

impl Roster {
    /// Loads the roster from a JSON file.
    ///
    /// A missing file is an empty roster, not an error; the bot then
    /// rejects everyone until the file is provisioned.
    pub fn load(path: &Path) -> Result<Self, RosterError> {
        if !path.exists() {
            info!(path = %path.display(), "roster file missing, starting with empty roster");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|source| RosterError::ReadError {
            path: path.display().to_string(),
            source,
        })?;
        let roster: Roster = serde_json::from_str(&content)?;
        info!(count = roster.members.len(), "loaded team roster");
        Ok(roster)
    }

    /// Builds a roster from in-memory entries (tests, fixtures).
    pub fn from_members(members: HashMap<String, TeamMember>) -> Self {
        Self { members }
    }

    /// Looks up a member by chat handle; accepts the handle with or
    /// without its leading `@`.
    pub fn find_by_handle(&self, handle: &str) -> Option<&TeamMember> {
        let normalized = if handle.starts_with('@') {
            handle.to_string()
        } else {
            format!("@{}", handle)
        };
        self.members.get(&normalized)
    }

    /// Iterates over (handle, member) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &TeamMember)> {
        self.members.iter()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample() -> Roster {
        let mut members = HashMap::new();
        members.insert(
            "@antonkamer".to_string(),
            TeamMember {
                user_id: UserId::from("user-anton"),
                display_name: "Anton".to_string(),
                provider_assignee: Some("860693669618957".to_string()),
                chat_id: Some(161261562),
            },
        );
        members.insert(
            "@pandacaffe".to_string(),
            TeamMember {
                user_id: UserId::from("user-andrey"),
                display_name: "Andrey".to_string(),
                provider_assignee: None,
                chat_id: None,
            },
        );
        Roster::from_members(members)
    }

    #[test]
    fn test_find_by_handle_with_and_without_at() {
        let roster = sample();
        assert_eq!(
            roster.find_by_handle("@antonkamer").unwrap().display_name,
            "Anton"
        );
        assert_eq!(
            roster.find_by_handle("antonkamer").unwrap().display_name,
            "Anton"
        );
        assert!(roster.find_by_handle("@stranger").is_none());
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let roster = Roster::load(&dir.path().join("roster.json")).unwrap();
        assert!(roster.is_empty());
    }

    #[test]
    fn test_load_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("roster.json");

        let json = serde_json::to_string_pretty(&sample()).unwrap();
        std::fs::write(&path, json).unwrap();

        let loaded = Roster::load(&path).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(
            loaded.find_by_handle("@pandacaffe").unwrap().user_id,
            UserId::from("user-andrey")
        );
    }

    #[test]
    fn test_load_invalid_json_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("roster.json");
        std::fs::write(&path, "not json").unwrap();

        assert!(matches!(
            Roster::load(&path),
            Err(RosterError::ParseError(_))
        ));
    }
}
