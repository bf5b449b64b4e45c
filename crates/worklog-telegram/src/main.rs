//! Worklog Telegram bot binary.
//!
//! Start the bot with:
//! ```bash
//! TELEGRAM_BOT_TOKEN=xxx cargo run -p worklog-telegram
//! ```

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;
use worklog_core::digest::DigestService;
use worklog_core::{Config, ReportAggregator, Roster, SessionEngine, SystemClock};
use worklog_persistence::SessionStore;
use worklog_telegram::{bot_from_env, AsanaTasks, BotState, TelegramSink, WorklogBot};

/// Worklog bot - track time and get a morning digest from Telegram
#[derive(Parser, Debug)]
#[command(name = "worklog-telegram")]
#[command(about = "Telegram bot for tracking work sessions")]
struct Args {
    /// Verbose logging (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let _ = dotenvy::dotenv();

    let filter = match args.verbose {
        0 => "worklog_telegram=info,worklog_core=info,teloxide=warn",
        1 => "worklog_telegram=debug,worklog_core=debug,teloxide=info",
        2 => "worklog_telegram=trace,worklog_core=trace,teloxide=debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env();
    std::fs::create_dir_all(&config.state_dir)?;

    let clock = Arc::new(SystemClock);
    let store = Arc::new(SessionStore::new(&config.state_dir));
    let engine = SessionEngine::new(store.clone(), clock.clone());
    let aggregator = Arc::new(ReportAggregator::new(store, config.reporting_offset()));
    let roster = Arc::new(Roster::load(&config.roster_path)?);
    let provider = Arc::new(AsanaTasks::from_env());

    tracing::info!(
        state_dir = %config.state_dir.display(),
        members = roster.len(),
        "worklog bot starting"
    );

    let bot = bot_from_env()?;
    let sink = Arc::new(TelegramSink::new(bot.clone(), roster.clone()));
    let digest = Arc::new(DigestService::new(
        aggregator.clone(),
        provider.clone(),
        sink,
        roster.clone(),
    ));
    let state = Arc::new(BotState::new(
        engine, aggregator, provider, roster, config, clock,
    ));

    WorklogBot::new(bot, state, digest).run().await;
    Ok(())
}
