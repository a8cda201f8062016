use super::stat::{Channel, ChannelStat};
use super::window::TimeWindow;
use crate::source::message::Message;
use crate::source::traits::{MessageSource, SourceError};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Produces the stat for a single channel. A failed fetch never propagates;
/// it becomes a zero-count stat with the error attached.
#[derive(Clone)]
pub struct ChannelAggregator {
    source: Arc<dyn MessageSource>,
    fetch_timeout: Duration,
}

impl ChannelAggregator {
    pub fn new(source: Arc<dyn MessageSource>, fetch_timeout: Duration) -> Self {
        Self {
            source,
            fetch_timeout,
        }
    }

    pub async fn aggregate(&self, channel: &Channel, window: TimeWindow) -> ChannelStat {
        match self.fetch(channel, window).await {
            Ok(messages) => {
                let stat = ChannelStat::from_messages(&channel.name, &messages);
                debug!(
                    channel = %channel.name,
                    pending = stat.notification_count,
                    total = stat.total_messages,
                    "Channel aggregated"
                );
                stat
            }
            Err(e) => {
                warn!(
                    channel = %channel.name,
                    channel_id = %channel.id,
                    error = %e,
                    "Failed to fetch channel messages"
                );
                ChannelStat::failed(&channel.name, e)
            }
        }
    }

    async fn fetch(
        &self,
        channel: &Channel,
        window: TimeWindow,
    ) -> Result<Vec<Message>, SourceError> {
        tokio::time::timeout(
            self.fetch_timeout,
            self.source.fetch_messages(&channel.id, window),
        )
        .await
        .map_err(|_| SourceError::Timeout(self.fetch_timeout))?
    }
}
