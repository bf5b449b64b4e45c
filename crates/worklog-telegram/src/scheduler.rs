//! Weekday digest scheduler.
//!
//! A plain sleep loop: compute the next HH:MM in the reporting timezone,
//! sleep until then, fire the digest if that day is a weekday. Saturday
//! and Sunday are skipped but still advance the schedule.

use std::sync::Arc;

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, Weekday};
use tracing::{debug, info};
use worklog_core::digest::DigestService;
use worklog_core::{Clock, Config};

/// Returns the delay until the next occurrence of `hour:minute` local time.
///
/// If that time has already passed today (or is exactly now), the next
/// occurrence is tomorrow; the delay is always positive.
pub fn next_fire_delay(now: DateTime<FixedOffset>, hour: u32, minute: u32) -> Duration {
    let today_fire = now
        .date_naive()
        .and_hms_opt(hour, minute, 0)
        .expect("validated digest time")
        .and_local_timezone(now.timezone())
        .single()
        .expect("fixed offsets have no DST gaps");

    let fire_at = if today_fire > now {
        today_fire
    } else {
        today_fire + Duration::days(1)
    };
    fire_at - now
}

/// Monday through Friday.
pub fn is_weekday(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Runs the digest on weekdays at the configured time, forever.
///
/// Spawned as a background task next to the dispatcher.
pub async fn run_digest_scheduler(
    digest: Arc<DigestService>,
    clock: Arc<dyn Clock>,
    config: Config,
) {
    let offset = config.reporting_offset();
    info!(
        hour = config.digest_hour,
        minute = config.digest_minute,
        recipients = config.digest_recipients.len(),
        "digest scheduler started"
    );

    loop {
        let now = clock.now().with_timezone(&offset);
        let delay = next_fire_delay(now, config.digest_hour, config.digest_minute);
        debug!(minutes = delay.num_minutes(), "sleeping until next digest slot");
        tokio::time::sleep(delay.to_std().unwrap_or_default()).await;

        let today = clock.now().with_timezone(&offset).date_naive();
        if !is_weekday(today) {
            debug!(%today, "weekend, digest skipped");
            continue;
        }

        digest
            .run_daily_digest(today, &config.digest_recipients)
            .await;
    }
}
