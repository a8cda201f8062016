use super::message::Message;
use super::traits::{MessageSource, SourceError};
use crate::aggregate::window::TimeWindow;
use crate::config::types::SlackConfig;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

/// Page size requested from `conversations.history`. Only one page is fetched
/// per channel per cycle; anything beyond it is dropped.
pub const HISTORY_PAGE_LIMIT: usize = 1000;

pub type Result<T> = std::result::Result<T, SourceError>;

/// Slack Web API client for reading channel history.
pub struct SlackClient {
    base_url: String,
    token: String,
    client: reqwest::Client,
}

impl SlackClient {
    pub fn new(config: &SlackConfig, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            base_url: config.api_base.trim_end_matches('/').to_string(),
            token: config.token.clone(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch a single page of channel history for the window.
    pub async fn conversations_history(
        &self,
        channel_id: &str,
        window: TimeWindow,
    ) -> Result<HistoryResponse> {
        let url = format!("{}/conversations.history", self.base_url);
        let query = [
            ("channel", channel_id.to_string()),
            ("oldest", window.oldest().to_string()),
            ("latest", window.latest().to_string()),
            ("inclusive", "true".to_string()),
            ("limit", HISTORY_PAGE_LIMIT.to_string()),
        ];

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .query(&query)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SourceError::Status {
                status: response.status().as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        let body = response.text().await?;
        parse_history_response(&body)
    }
}

#[async_trait]
impl MessageSource for SlackClient {
    async fn fetch_messages(&self, channel_id: &str, window: TimeWindow) -> Result<Vec<Message>> {
        let history = self.conversations_history(channel_id, window).await?;

        if history.has_more {
            tracing::warn!(
                channel_id = %channel_id,
                limit = HISTORY_PAGE_LIMIT,
                "Channel history truncated at page limit"
            );
        }

        // `inclusive` makes both bounds closed upstream; trim to [oldest, latest).
        Ok(history
            .messages
            .into_iter()
            .filter(|m| m.posted_at_secs().map_or(true, |ts| window.contains(ts)))
            .collect())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct HistoryResponse {
    pub ok: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default)]
    pub has_more: bool,
}

/// Decode a `conversations.history` body, turning `ok: false` into an error.
pub fn parse_history_response(body: &str) -> Result<HistoryResponse> {
    let history: HistoryResponse = serde_json::from_str(body)?;

    if !history.ok {
        let code = history
            .error
            .unwrap_or_else(|| "unknown_error".to_string());
        return Err(SourceError::Api(code));
    }

    Ok(history)
}
