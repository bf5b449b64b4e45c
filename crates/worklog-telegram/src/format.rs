//! Message formatting for chat replies.
//!
//! Replies go out with HTML parse mode, so every free-text field (task
//! names, notes, provider titles) is escaped before interpolation.

use chrono::NaiveDate;
use teloxide::utils::html::escape;
use worklog_models::report::format_minutes;
use worklog_models::{ActiveSessionInfo, DailySummary, ProviderTask, Session, WeeklySummary};

/// Reply for a freshly started session.
pub fn format_started(session: &Session) -> String {
    format!(
        "▶️ Tracking <b>{}</b>. Send /done when you finish.",
        escape(&session.task_name)
    )
}

/// Reply for a completed session.
pub fn format_stopped(session: &Session) -> String {
    let minutes = session.duration_minutes.unwrap_or(0);
    let mut text = format!(
        "⏹ Stopped <b>{}</b> — {}.",
        escape(&session.task_name),
        format_minutes(minutes)
    );
    if let Some(notes) = &session.notes {
        text.push_str(&format!("\nNotes: {}", escape(notes)));
    }
    text
}

/// Reply for `/status`.
pub fn format_status(info: Option<&ActiveSessionInfo>) -> String {
    match info {
        Some(info) => format!(
            "⏱ Working on <b>{}</b> for {}.",
            escape(&info.session.task_name),
            format_minutes(info.elapsed_minutes)
        ),
        None => "No active session. Start one with /begin &lt;task&gt;.".to_string(),
    }
}

/// Reply for `/today`.
pub fn format_daily(summary: &DailySummary) -> String {
    if summary.session_count == 0 {
        return format!("📭 Nothing tracked on {}.", summary.date);
    }

    let mut text = format!(
        "📊 <b>{}</b>: {} across {} session(s)\n",
        summary.date,
        format_minutes(summary.total_minutes),
        summary.session_count
    );
    for task in &summary.per_task {
        text.push_str(&format!(
            "• {} — {}\n",
            escape(&task.task_name),
            format_minutes(task.minutes)
        ));
    }
    text
}

/// Reply for `/week`.
pub fn format_weekly(summary: &WeeklySummary) -> String {
    let mut text = format!(
        "📅 <b>Week from {}</b>: {}\n",
        summary.from,
        format_minutes(summary.total_minutes)
    );
    for day in &summary.per_day {
        text.push_str(&format!(
            "• {} — {}\n",
            day.date.format("%a %d.%m"),
            format_minutes(day.minutes)
        ));
    }
    text
}

/// Reply for `/tasks` and `/overdue`.
pub fn format_task_list(title: &str, tasks: &[ProviderTask], today: NaiveDate) -> String {
    if tasks.is_empty() {
        return format!("📭 {}: nothing found.", escape(title));
    }

    let mut text = format!("📋 <b>{}</b>:\n", escape(title));
    for task in tasks.iter().take(15) {
        let marker = if task.is_overdue(today) { "⚠️" } else { "📌" };
        let due = task
            .due_on
            .map(|d| d.to_string())
            .unwrap_or_else(|| "no due date".to_string());
        text.push_str(&format!("{} {}\n   📅 {}\n", marker, escape(&task.name), due));
    }
    text
}
