use crate::aggregate::window::TimeWindow;
use crate::source::message::Message;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Lists messages of one channel within a time window.
#[async_trait]
pub trait MessageSource: Send + Sync {
    async fn fetch_messages(
        &self,
        channel_id: &str,
        window: TimeWindow,
    ) -> Result<Vec<Message>, SourceError>;
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("source returned error status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("source API error: {0}")]
    Api(String),

    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("fetch timed out after {0:?}")]
    Timeout(Duration),
}
