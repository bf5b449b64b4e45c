//! Core business logic for Worklog.
//!
//! Holds the session engine (the one stateful component: at most one
//! active session per user), the report aggregator, the daily digest
//! service, and the collaborator traits the transport layer implements.

pub mod clock;
pub mod config;
pub mod digest;
pub mod engine;
pub mod error;
pub mod reports;
pub mod roster;

pub use clock::{Clock, SystemClock};
pub use config::Config;
pub use digest::{DigestService, MessageSink, TaskProvider};
pub use engine::SessionEngine;
pub use error::{EngineError, Result};
pub use reports::ReportAggregator;
pub use roster::{Roster, TeamMember};
