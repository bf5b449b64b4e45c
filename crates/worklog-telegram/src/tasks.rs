//! Task provider client for the external project-tracking service.
//!
//! Speaks the Asana v1 REST shape: open tasks for one project, optional
//! client-side assignee filter, task creation. A missing API token
//! degrades to empty task lists so the bot keeps working without the
//! integration.

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;
use tracing::warn;
use worklog_core::digest::{CollaboratorError, TaskProvider};
use worklog_models::ProviderTask;

use crate::error::BotError;

const API_BASE: &str = "https://app.asana.com/api/1.0";

/// HTTP client for the task provider.
pub struct AsanaTasks {
    client: Client,
    token: Option<String>,
    project: String,
}

#[derive(Debug, Deserialize)]
struct TaskListResponse {
    #[serde(default)]
    data: Vec<RawTask>,
}

#[derive(Debug, Deserialize)]
struct RawTask {
    gid: String,
    name: String,
    due_on: Option<NaiveDate>,
    assignee: Option<RawAssignee>,
}

#[derive(Debug, Deserialize)]
struct RawAssignee {
    gid: String,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CreateResponse {
    data: CreatedTask,
}

#[derive(Debug, Deserialize)]
struct CreatedTask {
    gid: String,
}

impl AsanaTasks {
    /// Builds the client from `ASANA_TOKEN` and `ASANA_PROJECT`.
    pub fn from_env() -> Self {
        let token = std::env::var("ASANA_TOKEN").ok().filter(|t| !t.is_empty());
        if token.is_none() {
            warn!("ASANA_TOKEN not set; task lists will be empty");
        }
        let project = std::env::var("ASANA_PROJECT").unwrap_or_default();

        Self {
            client: Client::new(),
            token,
            project,
        }
    }

    /// Fetches all open tasks for the configured project.
    async fn fetch_open_tasks(&self) -> Result<Vec<RawTask>, BotError> {
        let Some(token) = &self.token else {
            return Ok(Vec::new());
        };

        let url = format!("{}/projects/{}/tasks", API_BASE, self.project);
        let response = self
            .client
            .get(&url)
            .bearer_auth(token)
            .query(&[
                ("opt_fields", "name,due_on,assignee,assignee.name,completed"),
                // Only still-open tasks.
                ("completed_since", "now"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(BotError::Provider(format!(
                "task list request failed with status {}",
                response.status()
            )));
        }

        let body: TaskListResponse = response.json().await?;
        Ok(body.data)
    }
}

/// Keeps only tasks assigned to the given provider assignee id.
fn filter_by_assignee(tasks: Vec<RawTask>, assignee_gid: Option<&str>) -> Vec<RawTask> {
    match assignee_gid {
        None => tasks,
        Some(gid) => tasks
            .into_iter()
            .filter(|t| t.assignee.as_ref().is_some_and(|a| a.gid == gid))
            .collect(),
    }
}

fn to_provider_task(raw: RawTask) -> ProviderTask {
    ProviderTask {
        ref_id: raw.gid,
        name: raw.name,
        assignee: raw.assignee.and_then(|a| a.name),
        due_on: raw.due_on,
    }
}

#[async_trait]
impl TaskProvider for AsanaTasks {
    async fn list_tasks(
        &self,
        assignee: Option<&str>,
    ) -> Result<Vec<ProviderTask>, CollaboratorError> {
        let tasks = self.fetch_open_tasks().await?;
        Ok(filter_by_assignee(tasks, assignee)
            .into_iter()
            .map(to_provider_task)
            .collect())
    }

    async fn search_tasks(&self, query: &str) -> Result<Vec<ProviderTask>, CollaboratorError> {
        let query = query.to_lowercase();
        let tasks = self.fetch_open_tasks().await?;
        Ok(tasks
            .into_iter()
            .filter(|t| t.name.to_lowercase().contains(&query))
            .map(to_provider_task)
            .collect())
    }

    async fn create_task(&self, name: &str) -> Result<String, CollaboratorError> {
        let Some(token) = &self.token else {
            return Err(Box::new(BotError::Provider(
                "cannot create task without ASANA_TOKEN".to_string(),
            )));
        };

        let url = format!("{}/tasks", API_BASE);
        let body = serde_json::json!({
            "data": {
                "name": name,
                "projects": [self.project],
            }
        });

        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .map_err(BotError::Request)?;

        if !response.status().is_success() {
            return Err(Box::new(BotError::Provider(format!(
                "task creation failed with status {}",
                response.status()
            ))));
        }

        let created: CreateResponse = response.json().await.map_err(BotError::Request)?;
        Ok(created.data.gid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(gid: &str, name: &str, assignee: Option<(&str, &str)>) -> RawTask {
        RawTask {
            gid: gid.to_string(),
            name: name.to_string(),
            due_on: None,
            assignee: assignee.map(|(gid, name)| RawAssignee {
                gid: gid.to_string(),
                name: Some(name.to_string()),
            }),
        }
    }

    #[test]
    fn test_parse_task_list_response() {
        let json = r#"{
            "data": [
                {
                    "gid": "120001",
                    "name": "Drill report",
                    "due_on": "2024-03-11",
                    "assignee": {"gid": "860", "name": "Anton"}
                },
                {"gid": "120002", "name": "Site audit", "due_on": null, "assignee": null}
            ]
        }"#;

        let parsed: TaskListResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.data.len(), 2);

        let task = to_provider_task(parsed.data.into_iter().next().unwrap());
        assert_eq!(task.ref_id, "120001");
        assert_eq!(task.name, "Drill report");
        assert_eq!(task.assignee.as_deref(), Some("Anton"));
        assert_eq!(
            task.due_on,
            Some(NaiveDate::from_ymd_opt(2024, 3, 11).unwrap())
        );
    }

    #[test]
    fn test_filter_by_assignee() {
        let tasks = vec![
            raw("1", "A", Some(("860", "Anton"))),
            raw("2", "B", Some(("861", "Andrey"))),
            raw("3", "C", None),
        ];

        let mine = filter_by_assignee(tasks, Some("860"));
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].name, "A");
    }

    #[test]
    fn test_filter_without_assignee_keeps_all() {
        let tasks = vec![raw("1", "A", Some(("860", "Anton"))), raw("2", "B", None)];
        assert_eq!(filter_by_assignee(tasks, None).len(), 2);
    }

    #[test]
    fn test_unassigned_task_maps_to_none() {
        let task = to_provider_task(raw("1", "A", None));
        assert!(task.assignee.is_none());
        assert!(task.is_untriaged());
    }
}
