use super::channel::ChannelAggregator;
use super::stat::{Channel, ChannelStat, Report};
use super::window::{TimeWindow, WindowError};
use crate::config::types::AggregationConfig;
use crate::source::traits::MessageSource;
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

/// Runs the channel aggregator over every configured channel and assembles
/// the results in configuration order.
pub struct ReportAggregator {
    channel: ChannelAggregator,
    lookback: Duration,
    max_concurrent_fetches: usize,
}

impl ReportAggregator {
    pub fn new(source: Arc<dyn MessageSource>, config: &AggregationConfig) -> Self {
        Self {
            channel: ChannelAggregator::new(source, config.fetch_timeout),
            lookback: config.lookback,
            max_concurrent_fetches: config.max_concurrent_fetches.max(1),
        }
    }

    pub fn window_ending_at(&self, now: DateTime<Utc>) -> Result<TimeWindow, WindowError> {
        TimeWindow::ending_at(now, self.lookback)
    }

    /// Aggregate all channels over the lookback window ending at `now`.
    ///
    /// Individual channel failures, including a panicking source, are folded
    /// into the report as error-tagged stats. The only error is a window that
    /// cannot be built from the configured lookback.
    pub async fn collect(
        &self,
        channels: &[Channel],
        now: DateTime<Utc>,
    ) -> Result<Report, WindowError> {
        let window = self.window_ending_at(now)?;

        info!(
            channels = channels.len(),
            oldest = window.oldest(),
            latest = window.latest(),
            "Collecting channel stats"
        );

        // `buffered` yields in input order, whatever order the fetches finish in.
        let stats: Vec<ChannelStat> = stream::iter(channels.iter().cloned())
            .map(|channel| {
                let aggregator = self.channel.clone();
                async move {
                    let name = channel.name.clone();
                    let task =
                        tokio::spawn(async move { aggregator.aggregate(&channel, window).await });
                    match task.await {
                        Ok(stat) => stat,
                        Err(e) => {
                            error!(channel = %name, error = %e, "Channel task failed");
                            ChannelStat::failed(name, format!("channel task failed: {e}"))
                        }
                    }
                }
            })
            .buffered(self.max_concurrent_fetches)
            .collect()
            .await;

        Ok(Report {
            generated_at: now,
            window,
            stats,
        })
    }
}
