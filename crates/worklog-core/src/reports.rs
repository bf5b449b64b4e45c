//! Report aggregation over the session log.
//!
//! Pure read-side computations: repeated calls with the same arguments and
//! no intervening writes return identical results, and the currently
//! active session is never included (the store's range query only yields
//! completed records).

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, FixedOffset, NaiveDate};
use worklog_models::{DailySummary, DayMinutes, TaskMinutes, UserId, WeeklySummary};
use worklog_persistence::SessionStore;

use crate::error::Result;

/// Length of the weekly report window in days.
const WEEK_DAYS: i64 = 7;

/// Computes daily and weekly summaries for one user at a time.
pub struct ReportAggregator {
    store: Arc<SessionStore>,
    /// Fixed reporting timezone; session start instants are bucketed into
    /// civil dates in this offset.
    offset: FixedOffset,
}

impl ReportAggregator {
    /// Creates an aggregator reading the given store in the given
    /// reporting offset.
    pub fn new(store: Arc<SessionStore>, offset: FixedOffset) -> Self {
        Self { store, offset }
    }

    /// Summarizes one user's completed work on one calendar day.
    ///
    /// Per-task totals are sorted by minutes descending, task name
    /// ascending on ties. A day with no sessions yields the empty summary.
    pub fn daily_summary(&self, user_id: &UserId, date: NaiveDate) -> Result<DailySummary> {
        let sessions = self
            .store
            .query_range(user_id, date, date + Duration::days(1), self.offset)?;

        if sessions.is_empty() {
            return Ok(DailySummary::empty(date));
        }

        let mut total_minutes = 0;
        let mut per_task: HashMap<String, i64> = HashMap::new();
        for session in &sessions {
            let minutes = session.duration_minutes.unwrap_or(0);
            total_minutes += minutes;
            *per_task.entry(session.task_name.clone()).or_insert(0) += minutes;
        }

        let mut per_task: Vec<TaskMinutes> = per_task
            .into_iter()
            .map(|(task_name, minutes)| TaskMinutes { task_name, minutes })
            .collect();
        per_task.sort_by(|a, b| {
            b.minutes
                .cmp(&a.minutes)
                .then_with(|| a.task_name.cmp(&b.task_name))
        });

        Ok(DailySummary {
            date,
            total_minutes,
            session_count: sessions.len() as u32,
            per_task,
        })
    }

    /// Summarizes one user's completed work over `[from, from + 7 days)`.
    ///
    /// Every day of the window appears, zero-minute days included, dates
    /// ascending. The weekly total always equals the sum of the seven
    /// daily totals.
    pub fn weekly_summary(&self, user_id: &UserId, from: NaiveDate) -> Result<WeeklySummary> {
        let sessions =
            self.store
                .query_range(user_id, from, from + Duration::days(WEEK_DAYS), self.offset)?;

        let mut by_day: HashMap<NaiveDate, i64> = HashMap::new();
        for session in &sessions {
            let date = session.started_at.with_timezone(&self.offset).date_naive();
            *by_day.entry(date).or_insert(0) += session.duration_minutes.unwrap_or(0);
        }

        let mut total_minutes = 0;
        let mut per_day = Vec::with_capacity(WEEK_DAYS as usize);
        for day in 0..WEEK_DAYS {
            let date = from + Duration::days(day);
            let minutes = by_day.get(&date).copied().unwrap_or(0);
            total_minutes += minutes;
            per_day.push(DayMinutes { date, minutes });
        }

        Ok(WeeklySummary {
            from,
            total_minutes,
            per_day,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use tempfile::tempdir;
    use worklog_models::SessionDraft;

    fn msk() -> FixedOffset {
        FixedOffset::east_opt(3 * 3600).unwrap()
    }

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    // 2024-03-11 is a Monday; hours are given in the +03:00 reporting zone.
    fn local(d: u32, h: u32, m: u32) -> DateTime<Utc> {
        msk()
            .with_ymd_and_hms(2024, 3, d, h, m, 0)
            .unwrap()
            .with_timezone(&Utc)
    }

    fn record(store: &SessionStore, user: &UserId, task: &str, start: DateTime<Utc>, minutes: i64) {
        let session = store
            .insert(SessionDraft {
                user_id: user.clone(),
                task_name: task.to_string(),
                task_ref: None,
                started_at: start,
            })
            .unwrap();
        store
            .complete(user, &session.id, start + Duration::minutes(minutes), None)
            .unwrap();
    }

    fn aggregator(dir: &std::path::Path) -> (Arc<SessionStore>, ReportAggregator) {
        let store = Arc::new(SessionStore::new(dir));
        let agg = ReportAggregator::new(store.clone(), msk());
        (store, agg)
    }

    #[test]
    fn test_empty_day_is_valid_summary() {
        let dir = tempdir().unwrap();
        let (_, agg) = aggregator(dir.path());
        let user = UserId::from("user-anton");

        let summary = agg.daily_summary(&user, date(11)).unwrap();

        assert_eq!(summary.total_minutes, 0);
        assert_eq!(summary.session_count, 0);
        assert!(summary.per_task.is_empty());
    }

    #[test]
    fn test_daily_summary_two_sessions() {
        let dir = tempdir().unwrap();
        let (store, agg) = aggregator(dir.path());
        let user = UserId::from("user-anton");

        record(&store, &user, "Report A", local(11, 9, 0), 45);
        record(&store, &user, "Report B", local(11, 10, 0), 20);

        let summary = agg.daily_summary(&user, date(11)).unwrap();

        assert_eq!(summary.total_minutes, 65);
        assert_eq!(summary.session_count, 2);
        assert_eq!(
            summary.per_task,
            vec![
                TaskMinutes {
                    task_name: "Report A".to_string(),
                    minutes: 45
                },
                TaskMinutes {
                    task_name: "Report B".to_string(),
                    minutes: 20
                },
            ]
        );
    }

    #[test]
    fn test_daily_summary_groups_repeated_task() {
        let dir = tempdir().unwrap();
        let (store, agg) = aggregator(dir.path());
        let user = UserId::from("user-anton");

        record(&store, &user, "Report A", local(11, 9, 0), 30);
        record(&store, &user, "Report A", local(11, 14, 0), 25);
        record(&store, &user, "Review", local(11, 16, 0), 40);

        let summary = agg.daily_summary(&user, date(11)).unwrap();

        assert_eq!(summary.session_count, 3);
        assert_eq!(summary.per_task.len(), 2);
        assert_eq!(summary.per_task[0].task_name, "Report A");
        assert_eq!(summary.per_task[0].minutes, 55);
        assert_eq!(summary.per_task[1].task_name, "Review");
        assert_eq!(summary.per_task[1].minutes, 40);
    }

    #[test]
    fn test_daily_summary_tie_breaks_by_name() {
        let dir = tempdir().unwrap();
        let (store, agg) = aggregator(dir.path());
        let user = UserId::from("user-anton");

        record(&store, &user, "Zeta", local(11, 9, 0), 30);
        record(&store, &user, "Alpha", local(11, 10, 0), 30);

        let summary = agg.daily_summary(&user, date(11)).unwrap();
        assert_eq!(summary.per_task[0].task_name, "Alpha");
        assert_eq!(summary.per_task[1].task_name, "Zeta");
    }

    #[test]
    fn test_daily_summary_excludes_active_session() {
        let dir = tempdir().unwrap();
        let (store, agg) = aggregator(dir.path());
        let user = UserId::from("user-anton");

        record(&store, &user, "Report A", local(11, 9, 0), 45);
        // Active session on the same day, never included.
        store
            .insert(SessionDraft {
                user_id: user.clone(),
                task_name: "ongoing".to_string(),
                task_ref: None,
                started_at: local(11, 12, 0),
            })
            .unwrap();

        let summary = agg.daily_summary(&user, date(11)).unwrap();
        assert_eq!(summary.session_count, 1);
        assert_eq!(summary.total_minutes, 45);
    }

    #[test]
    fn test_daily_summary_is_idempotent() {
        let dir = tempdir().unwrap();
        let (store, agg) = aggregator(dir.path());
        let user = UserId::from("user-anton");

        record(&store, &user, "Report A", local(11, 9, 0), 45);

        let first = agg.daily_summary(&user, date(11)).unwrap();
        let second = agg.daily_summary(&user, date(11)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_weekly_summary_window_and_order() {
        let dir = tempdir().unwrap();
        let (store, agg) = aggregator(dir.path());
        let user = UserId::from("user-anton");

        record(&store, &user, "Mon", local(11, 9, 0), 60);
        record(&store, &user, "Wed", local(13, 9, 0), 30);
        record(&store, &user, "Sun", local(17, 9, 0), 15);
        // Outside the window.
        record(&store, &user, "next Mon", local(18, 9, 0), 99);

        let summary = agg.weekly_summary(&user, date(11)).unwrap();

        assert_eq!(summary.per_day.len(), 7);
        assert_eq!(summary.total_minutes, 105);
        assert_eq!(summary.per_day[0].date, date(11));
        assert_eq!(summary.per_day[0].minutes, 60);
        assert_eq!(summary.per_day[1].minutes, 0);
        assert_eq!(summary.per_day[2].minutes, 30);
        assert_eq!(summary.per_day[6].date, date(17));
        assert_eq!(summary.per_day[6].minutes, 15);
    }

    #[test]
    fn test_weekly_total_equals_sum_of_daily_totals() {
        let dir = tempdir().unwrap();
        let (store, agg) = aggregator(dir.path());
        let user = UserId::from("user-anton");

        record(&store, &user, "A", local(11, 9, 0), 45);
        record(&store, &user, "B", local(11, 11, 0), 20);
        record(&store, &user, "C", local(14, 9, 0), 90);
        record(&store, &user, "D", local(16, 19, 0), 10);

        let weekly = agg.weekly_summary(&user, date(11)).unwrap();

        let mut daily_sum = 0;
        for day in 0..7 {
            let d = date(11) + Duration::days(day);
            daily_sum += agg.daily_summary(&user, d).unwrap().total_minutes;
        }
        assert_eq!(weekly.total_minutes, daily_sum);
    }
}
