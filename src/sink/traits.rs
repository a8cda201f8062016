use crate::aggregate::stat::Report;
use async_trait::async_trait;
use thiserror::Error;

/// Destination for a finished report.
#[async_trait]
pub trait ReportSink: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    async fn publish(&self, report: &Report) -> Result<(), SinkError>;
}

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("sink returned error status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("storage error: {0}")]
    Storage(#[from] duckdb::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid stored value: {0}")]
    InvalidData(String),

    #[error("storage connection lock poisoned")]
    Poisoned,

    #[error("sink task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
