use crate::aggregate::report::ReportAggregator;
use crate::aggregate::stat::{Channel, Report};
use crate::config::types::Config;
use crate::sink::chat::ChatSink;
use crate::sink::sheet::SheetSink;
use crate::sink::traits::{ReportSink, SinkError};
use crate::source::slack::SlackClient;
use crate::source::traits::{MessageSource, SourceError};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("failed to create message source: {0}")]
    Source(#[from] SourceError),

    #[error("failed to create sink: {0}")]
    Sink(#[from] SinkError),
}

/// Result of one cycle. Failures inside a cycle are reported here, never raised.
#[derive(Debug)]
pub enum CycleOutcome {
    /// No channels are configured; nothing was fetched or published.
    NothingToReport,
    /// Another cycle was still running, so this one did not start.
    Skipped,
    /// The report could not be assembled at all.
    Aborted { reason: String },
    Published {
        report: Report,
        sink_failures: Vec<SinkFailure>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkFailure {
    pub sink: String,
    pub error: String,
}

/// Collects one report and hands it to every sink.
pub struct CycleRunner {
    aggregator: ReportAggregator,
    channels: Vec<Channel>,
    sinks: Vec<Arc<dyn ReportSink>>,
    // Held for the duration of a cycle so sink writes never interleave.
    cycle_lock: Mutex<()>,
}

impl CycleRunner {
    pub fn new(
        aggregator: ReportAggregator,
        channels: Vec<Channel>,
        sinks: Vec<Arc<dyn ReportSink>>,
    ) -> Self {
        Self {
            aggregator,
            channels,
            sinks,
            cycle_lock: Mutex::new(()),
        }
    }

    /// Wire up the Slack source and the configured sinks.
    pub fn from_config(config: &Config, with_sinks: bool) -> Result<Self, BuildError> {
        let source: Arc<dyn MessageSource> = Arc::new(SlackClient::new(
            &config.slack,
            config.aggregation.fetch_timeout,
        )?);
        let aggregator = ReportAggregator::new(source, &config.aggregation);

        let mut sinks: Vec<Arc<dyn ReportSink>> = Vec::new();
        if with_sinks {
            if let Some(chat) = &config.sinks.chat {
                sinks.push(Arc::new(ChatSink::new(chat)?));
            }
            if let Some(sheet) = &config.sinks.sheet {
                info!(path = %sheet.path.display(), "Opening sheet history");
                sinks.push(Arc::new(SheetSink::open(&sheet.path)?));
            }
        }

        Ok(Self::new(aggregator, config.channels.clone(), sinks))
    }

    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    pub fn sink_names(&self) -> Vec<&str> {
        self.sinks.iter().map(|s| s.name()).collect()
    }

    pub async fn run_cycle(&self, now: DateTime<Utc>) -> CycleOutcome {
        if self.channels.is_empty() {
            info!("No channels configured, nothing to report");
            return CycleOutcome::NothingToReport;
        }

        let Ok(_guard) = self.cycle_lock.try_lock() else {
            warn!("Previous cycle still running, skipping this one");
            return CycleOutcome::Skipped;
        };

        let report = match self.aggregator.collect(&self.channels, now).await {
            Ok(report) => report,
            Err(e) => {
                error!(error = %e, "Could not build report window");
                return CycleOutcome::Aborted {
                    reason: e.to_string(),
                };
            }
        };

        info!(
            channels = report.len(),
            pending = report.total_pending(),
            failed_channels = report.errors().count(),
            "Report collected"
        );

        let mut sink_failures = Vec::new();
        for sink in &self.sinks {
            if let Err(e) = sink.publish(&report).await {
                error!(sink = sink.name(), error = %e, "Failed to publish report");
                sink_failures.push(SinkFailure {
                    sink: sink.name().to_string(),
                    error: e.to_string(),
                });
            }
        }

        CycleOutcome::Published {
            report,
            sink_failures,
        }
    }
}
