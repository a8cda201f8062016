use super::window::TimeWindow;
use crate::source::message::Message;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A channel to inspect, as listed in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub id: String,
    pub name: String,
}

impl Channel {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Aggregate counts for one channel over one window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelStat {
    pub channel_name: String,
    /// Notifications without any reaction.
    pub notification_count: u64,
    pub total_messages: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ChannelStat {
    pub fn from_messages(channel_name: impl Into<String>, messages: &[Message]) -> Self {
        let notification_count = messages.iter().filter(|m| m.is_pending()).count() as u64;

        Self {
            channel_name: channel_name.into(),
            notification_count,
            total_messages: messages.len() as u64,
            error: None,
        }
    }

    /// Zero-count stat carrying the reason the channel could not be read.
    pub fn failed(channel_name: impl Into<String>, error: impl ToString) -> Self {
        Self {
            channel_name: channel_name.into(),
            notification_count: 0,
            total_messages: 0,
            error: Some(error.to_string()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Per-channel results of one aggregation cycle, in configuration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub generated_at: DateTime<Utc>,
    pub window: TimeWindow,
    pub stats: Vec<ChannelStat>,
}

impl Report {
    pub fn is_empty(&self) -> bool {
        self.stats.is_empty()
    }

    pub fn len(&self) -> usize {
        self.stats.len()
    }

    pub fn has_errors(&self) -> bool {
        self.stats.iter().any(ChannelStat::is_error)
    }

    pub fn errors(&self) -> impl Iterator<Item = &ChannelStat> {
        self.stats.iter().filter(|s| s.is_error())
    }

    pub fn total_pending(&self) -> u64 {
        self.stats.iter().map(|s| s.notification_count).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::message::Reaction;

    #[test]
    fn test_stat_counts_pending_only() {
        let messages = vec![
            Message {
                bot_id: Some("B1".to_string()),
                ..Default::default()
            },
            Message {
                bot_id: Some("B1".to_string()),
                reactions: Some(vec![Reaction::named("eyes")]),
                ..Default::default()
            },
            Message {
                subtype: Some("channel_join".to_string()),
                bot_id: Some("B1".to_string()),
                ..Default::default()
            },
            Message {
                user: Some("U1".to_string()),
                ..Default::default()
            },
        ];

        let stat = ChannelStat::from_messages("alerts", &messages);
        assert_eq!(stat.notification_count, 1);
        assert_eq!(stat.total_messages, 4);
        assert!(stat.notification_count <= stat.total_messages);
        assert!(!stat.is_error());
    }

    #[test]
    fn test_failed_stat() {
        let stat = ChannelStat::failed("alerts", "channel_not_found");
        assert_eq!(stat.notification_count, 0);
        assert_eq!(stat.total_messages, 0);
        assert_eq!(stat.error.as_deref(), Some("channel_not_found"));
    }

    #[test]
    fn test_report_errors() {
        let report = Report {
            generated_at: Utc::now(),
            window: TimeWindow::new(0, 3600).unwrap(),
            stats: vec![
                ChannelStat::from_messages("general", &[]),
                ChannelStat::failed("random", "timeout"),
            ],
        };
        assert!(report.has_errors());
        let names: Vec<_> = report.errors().map(|s| s.channel_name.as_str()).collect();
        assert_eq!(names, vec!["random"]);
    }
}
