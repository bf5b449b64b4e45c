//! Shared state for the Telegram bot.

use std::sync::Arc;

use chrono::NaiveDate;
use teloxide::types::Message;
use worklog_core::digest::TaskProvider;
use worklog_core::{Clock, Config, ReportAggregator, Roster, SessionEngine, TeamMember};

/// Shared state for the Telegram bot, accessible across all handlers.
///
/// Built once at startup from an explicitly constructed store handle;
/// handlers receive it as `Arc<BotState>` through the dispatcher.
pub struct BotState {
    /// The session engine (sole writer of the session store).
    engine: SessionEngine,
    /// Read-side report aggregation.
    aggregator: Arc<ReportAggregator>,
    /// External task provider.
    provider: Arc<dyn TaskProvider>,
    /// Team roster loaded at startup.
    roster: Arc<Roster>,
    /// Process configuration.
    config: Config,
    /// Time source, shared with the engine.
    clock: Arc<dyn Clock>,
}

impl BotState {
    pub fn new(
        engine: SessionEngine,
        aggregator: Arc<ReportAggregator>,
        provider: Arc<dyn TaskProvider>,
        roster: Arc<Roster>,
        config: Config,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            engine,
            aggregator,
            provider,
            roster,
            config,
            clock,
        }
    }

    pub fn engine(&self) -> &SessionEngine {
        &self.engine
    }

    pub fn aggregator(&self) -> &ReportAggregator {
        &self.aggregator
    }

    pub fn provider(&self) -> &dyn TaskProvider {
        self.provider.as_ref()
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn clock(&self) -> Arc<dyn Clock> {
        self.clock.clone()
    }

    /// Today's civil date in the reporting timezone.
    pub fn today(&self) -> NaiveDate {
        self.clock
            .now()
            .with_timezone(&self.config.reporting_offset())
            .date_naive()
    }

    /// Resolves the message sender to a roster member.
    pub fn member_for(&self, msg: &Message) -> Option<&TeamMember> {
        let username = msg.from.as_ref()?.username.as_deref()?;
        self.roster.find_by_handle(username)
    }
}
