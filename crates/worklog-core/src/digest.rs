//! Daily digest: per-recipient summary of tracked time and open tasks.
//!
//! The digest is driven by an external timer (the transport crate's
//! scheduler loop); this module only knows how to assemble and deliver
//! one round of digests. Each recipient is handled independently: one
//! failing provider call or delivery never blocks the others.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::{error, info};
use worklog_models::{DailySummary, ProviderTask};

use crate::reports::ReportAggregator;
use crate::roster::Roster;

/// Boxed error for collaborator traits implemented outside this crate.
pub type CollaboratorError = Box<dyn std::error::Error + Send + Sync>;

/// The external project-tracking service.
#[async_trait]
pub trait TaskProvider: Send + Sync {
    /// Lists open tasks, optionally filtered to one provider assignee.
    async fn list_tasks(
        &self,
        assignee: Option<&str>,
    ) -> Result<Vec<ProviderTask>, CollaboratorError>;

    /// Searches open tasks by name.
    async fn search_tasks(&self, query: &str) -> Result<Vec<ProviderTask>, CollaboratorError>;

    /// Creates a task and returns its provider-side id.
    async fn create_task(&self, name: &str) -> Result<String, CollaboratorError>;
}

/// Message delivery to one recipient address.
#[async_trait]
pub trait MessageSink: Send + Sync {
    async fn send(&self, recipient: &str, text: &str) -> Result<(), CollaboratorError>;
}

/// Maximum tasks listed per digest section.
const MAX_SECTION_ITEMS: usize = 10;

/// Escapes free text for sinks that parse HTML (the Telegram sink does).
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Assembles and delivers the daily digest.
pub struct DigestService {
    aggregator: Arc<ReportAggregator>,
    provider: Arc<dyn TaskProvider>,
    sink: Arc<dyn MessageSink>,
    roster: Arc<Roster>,
}

impl DigestService {
    pub fn new(
        aggregator: Arc<ReportAggregator>,
        provider: Arc<dyn TaskProvider>,
        sink: Arc<dyn MessageSink>,
        roster: Arc<Roster>,
    ) -> Self {
        Self {
            aggregator,
            provider,
            sink,
            roster,
        }
    }

    /// Sends the digest for `date` to every recipient handle.
    ///
    /// Returns the number of digests delivered. Failures are logged and
    /// skipped; they never abort the remaining recipients.
    pub async fn run_daily_digest(&self, date: NaiveDate, recipients: &[String]) -> usize {
        let mut delivered = 0;
        for handle in recipients {
            match self.send_one(date, handle).await {
                Ok(()) => delivered += 1,
                Err(e) => {
                    error!(recipient = %handle, error = %e, "digest delivery failed, continuing");
                }
            }
        }
        info!(delivered, total = recipients.len(), %date, "daily digest round finished");
        delivered
    }

    async fn send_one(&self, date: NaiveDate, handle: &str) -> Result<(), CollaboratorError> {
        let member = self
            .roster
            .find_by_handle(handle)
            .ok_or_else(|| format!("recipient {} not in roster", handle))?;

        let summary = self.aggregator.daily_summary(&member.user_id, date)?;
        let tasks = self
            .provider
            .list_tasks(member.provider_assignee.as_deref())
            .await?;

        let text = format_digest(date, &member.display_name, &summary, &tasks);
        self.sink.send(handle, &text).await
    }
}

/// Formats one recipient's digest text.
///
/// Sections mirror the morning plan message: time tracked on `date`,
/// tasks due today, overdue tasks (oldest due date first), and tasks
/// missing a due date or assignee.
pub fn format_digest(
    date: NaiveDate,
    display_name: &str,
    summary: &DailySummary,
    tasks: &[ProviderTask],
) -> String {
    let mut text = format!(
        "Daily plan for {} — {}\n",
        html_escape(display_name),
        date.format("%d.%m")
    );

    if summary.session_count > 0 {
        text.push_str(&format!(
            "\nTracked: {} across {} session(s)\n",
            worklog_models::report::format_minutes(summary.total_minutes),
            summary.session_count
        ));
        for task in &summary.per_task {
            text.push_str(&format!(
                "  - {} — {}\n",
                html_escape(&task.task_name),
                worklog_models::report::format_minutes(task.minutes)
            ));
        }
    } else {
        text.push_str("\nNo time tracked yet today.\n");
    }

    let due_today: Vec<&ProviderTask> = tasks.iter().filter(|t| t.is_due_on(date)).collect();
    if !due_today.is_empty() {
        text.push_str(&format!("\nDue today ({}):\n", due_today.len()));
        for task in due_today.iter().take(MAX_SECTION_ITEMS) {
            text.push_str(&format!(
                "  - {} — {}\n",
                html_escape(&task.name),
                html_escape(task.assignee.as_deref().unwrap_or("unassigned"))
            ));
        }
    }

    let mut overdue: Vec<&ProviderTask> = tasks.iter().filter(|t| t.is_overdue(date)).collect();
    overdue.sort_by_key(|t| t.due_on);
    if !overdue.is_empty() {
        text.push_str(&format!("\nOverdue ({}):\n", overdue.len()));
        for task in overdue.iter().take(MAX_SECTION_ITEMS) {
            let due = task
                .due_on
                .map(|d| d.format("%d.%m").to_string())
                .unwrap_or_default();
            text.push_str(&format!(
                "  - {} — {} — {}\n",
                due,
                html_escape(&task.name),
                html_escape(task.assignee.as_deref().unwrap_or("unassigned"))
            ));
        }
    }

    let untriaged: Vec<&ProviderTask> = tasks.iter().filter(|t| t.is_untriaged()).collect();
    if !untriaged.is_empty() {
        text.push_str(&format!(
            "\nMissing due date or assignee ({}):\n",
            untriaged.len()
        ));
        for task in untriaged.iter().take(MAX_SECTION_ITEMS / 2) {
            text.push_str(&format!("  - {}\n", html_escape(&task.name)));
        }
    }

    text
}
