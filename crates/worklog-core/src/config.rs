//! Runtime configuration.
//!
//! All settings come from the environment with sensible defaults; nothing
//! is read lazily at call sites. The process loads one `Config` at start
//! and passes it down explicitly.

use std::path::PathBuf;

use chrono::FixedOffset;

/// Default reporting offset in hours east of UTC (Moscow time).
const DEFAULT_OFFSET_HOURS: i32 = 3;

/// Default digest firing time, local to the reporting offset.
const DEFAULT_DIGEST_TIME: (u32, u32) = (10, 30);

/// Process-wide configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Root directory for the session store and roster.
    pub state_dir: PathBuf,
    /// Fixed reporting timezone, hours east of UTC.
    pub offset_hours: i32,
    /// Hour of day (reporting time) the daily digest fires.
    pub digest_hour: u32,
    /// Minute of hour the daily digest fires.
    pub digest_minute: u32,
    /// Chat handles that receive the daily digest.
    pub digest_recipients: Vec<String>,
    /// Path to the roster JSON file.
    pub roster_path: PathBuf,
}

impl Config {
    /// Loads configuration from the environment.
    pub fn from_env() -> Self {
        let state_dir = std::env::var("WORKLOG_STATE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_state_dir());

        let offset_hours = std::env::var("WORKLOG_UTC_OFFSET_HOURS")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|h| (-12..=14).contains(h))
            .unwrap_or(DEFAULT_OFFSET_HOURS);

        let (digest_hour, digest_minute) = std::env::var("WORKLOG_DIGEST_TIME")
            .ok()
            .and_then(|v| parse_digest_time(&v))
            .unwrap_or(DEFAULT_DIGEST_TIME);

        let digest_recipients = std::env::var("WORKLOG_DIGEST_RECIPIENTS")
            .map(|v| {
                v.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let roster_path = std::env::var("WORKLOG_ROSTER_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| state_dir.join("roster.json"));

        Self {
            state_dir,
            offset_hours,
            digest_hour,
            digest_minute,
            digest_recipients,
            roster_path,
        }
    }

    /// The fixed reporting offset.
    pub fn reporting_offset(&self) -> FixedOffset {
        // offset_hours is validated into the legal range at load time
        FixedOffset::east_opt(self.offset_hours * 3600)
            .unwrap_or_else(|| FixedOffset::east_opt(0).expect("zero offset is valid"))
    }
}

impl Default for Config {
    fn default() -> Self {
        let state_dir = default_state_dir();
        Self {
            roster_path: state_dir.join("roster.json"),
            state_dir,
            offset_hours: DEFAULT_OFFSET_HOURS,
            digest_hour: DEFAULT_DIGEST_TIME.0,
            digest_minute: DEFAULT_DIGEST_TIME.1,
            digest_recipients: Vec::new(),
        }
    }
}

fn default_state_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".worklog")
}

/// Parses "HH:MM" into (hour, minute).
fn parse_digest_time(value: &str) -> Option<(u32, u32)> {
    let (h, m) = value.split_once(':')?;
    let hour: u32 = h.trim().parse().ok()?;
    let minute: u32 = m.trim().parse().ok()?;
    if hour < 24 && minute < 60 {
        Some((hour, minute))
    } else {
        None
    }
}
