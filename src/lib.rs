//! Counts unacknowledged bot and app notifications per Slack channel and
//! reports them to Google Chat and a DuckDB-backed history table.
//!
//! ```text
//! Scheduler ─▶ ReportAggregator ─▶ ChannelAggregator ─▶ MessageSource (Slack)
//!                     │                    └─ classify::is_pending
//!                     ▼
//!                  Report ─▶ ReportSink (chat card, sheet + pivot)
//! ```

pub mod aggregate;
pub mod classify;
pub mod cli;
pub mod config;
pub mod scheduler;
pub mod sink;
pub mod source;

pub use aggregate::{Channel, ChannelStat, Report, ReportAggregator, TimeWindow};
pub use classify::{has_reactions, is_notification, is_pending};
pub use source::{Message, MessageSource, Reaction, SourceError};
pub use sink::{ReportSink, SinkError};
