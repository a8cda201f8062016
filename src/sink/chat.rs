//! Google Chat incoming-webhook sink.
//!
//! Each report is posted as a single card: a header with the collection time,
//! one line per channel, and an error section when any channel failed.

use super::traits::{ReportSink, SinkError};
use crate::aggregate::stat::{ChannelStat, Report};
use crate::config::types::ChatSinkConfig;
use async_trait::async_trait;
use chrono::Local;
use serde::Serialize;

const CARD_TITLE: &str = "Slack通知集計レポート";
const STATS_LABEL: &str = "チャンネル別集計";
const ERROR_HEADING: &str = "⚠️ エラー情報:";
const TIMESTAMP_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub cards: Vec<Card>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Card {
    pub header: CardHeader,
    pub sections: Vec<Section>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CardHeader {
    pub title: String,
    pub subtitle: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Section {
    pub widgets: Vec<Widget>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Widget {
    TextParagraph {
        text: String,
    },
    KeyValue {
        #[serde(rename = "topLabel")]
        top_label: String,
        content: String,
    },
}

/// `"<channel>: <pending>件 / 総数<total>件"`
pub fn stat_line(stat: &ChannelStat) -> String {
    format!(
        "{}: {}件 / 総数{}件",
        stat.channel_name, stat.notification_count, stat.total_messages
    )
}

fn window_label(window_secs: i64) -> String {
    if window_secs > 0 && window_secs % 3600 == 0 {
        format!("過去{}時間の未対応通知数", window_secs / 3600)
    } else {
        format!("過去{}分の未対応通知数", window_secs / 60)
    }
}

/// Build the card for a report. `collected_at` is shown as the subtitle.
pub fn build_card(report: &Report, collected_at: &str) -> ChatMessage {
    let stats_text = report
        .stats
        .iter()
        .map(stat_line)
        .collect::<Vec<_>>()
        .join("\n");

    let mut sections = vec![
        Section {
            widgets: vec![Widget::TextParagraph {
                text: window_label(report.window.duration_secs()),
            }],
        },
        Section {
            widgets: vec![Widget::KeyValue {
                top_label: STATS_LABEL.to_string(),
                content: stats_text,
            }],
        },
    ];

    if report.has_errors() {
        let lines: Vec<String> = report
            .errors()
            .map(|stat| {
                format!(
                    "{}: {}",
                    stat.channel_name,
                    stat.error.as_deref().unwrap_or_default()
                )
            })
            .collect();

        sections.push(Section {
            widgets: vec![Widget::TextParagraph {
                text: format!("{}\n{}", ERROR_HEADING, lines.join("\n")),
            }],
        });
    }

    ChatMessage {
        cards: vec![Card {
            header: CardHeader {
                title: CARD_TITLE.to_string(),
                subtitle: format!("集計時間: {}", collected_at),
            },
            sections,
        }],
    }
}

pub struct ChatSink {
    webhook_url: String,
    client: reqwest::Client,
}

impl ChatSink {
    pub fn new(config: &ChatSinkConfig) -> Result<Self, SinkError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            webhook_url: config.webhook_url.clone(),
            client,
        })
    }
}

#[async_trait]
impl ReportSink for ChatSink {
    fn name(&self) -> &str {
        "chat"
    }

    async fn publish(&self, report: &Report) -> Result<(), SinkError> {
        let collected_at = report
            .generated_at
            .with_timezone(&Local)
            .format(TIMESTAMP_FORMAT)
            .to_string();
        let message = build_card(report, &collected_at);

        let response = self
            .client
            .post(&self.webhook_url)
            .json(&message)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SinkError::Status {
                status: response.status().as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        tracing::info!(channels = report.len(), "Posted report card to chat");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::window::TimeWindow;
    use chrono::Utc;

    fn report(stats: Vec<ChannelStat>) -> Report {
        Report {
            generated_at: Utc::now(),
            window: TimeWindow::new(0, 3600).unwrap(),
            stats,
        }
    }

    fn stat(name: &str, pending: u64, total: u64) -> ChannelStat {
        ChannelStat {
            channel_name: name.to_string(),
            notification_count: pending,
            total_messages: total,
            error: None,
        }
    }

    #[test]
    fn test_stat_line_format() {
        assert_eq!(stat_line(&stat("general", 1, 3)), "general: 1件 / 総数3件");
    }

    #[test]
    fn test_card_without_errors() {
        let card = build_card(
            &report(vec![stat("general", 1, 3), stat("random", 0, 0)]),
            "2026/10/19 09:00:00",
        );
        let card = &card.cards[0];

        assert_eq!(card.header.title, "Slack通知集計レポート");
        assert_eq!(card.header.subtitle, "集計時間: 2026/10/19 09:00:00");
        assert_eq!(card.sections.len(), 2);
        assert_eq!(
            card.sections[0].widgets[0],
            Widget::TextParagraph {
                text: "過去1時間の未対応通知数".to_string()
            }
        );
        assert_eq!(
            card.sections[1].widgets[0],
            Widget::KeyValue {
                top_label: "チャンネル別集計".to_string(),
                content: "general: 1件 / 総数3件\nrandom: 0件 / 総数0件".to_string(),
            }
        );
    }

    #[test]
    fn test_card_error_section() {
        let card = build_card(
            &report(vec![
                stat("general", 2, 5),
                ChannelStat::failed("random", "channel_not_found"),
            ]),
            "now",
        );
        let sections = &card.cards[0].sections;

        assert_eq!(sections.len(), 3);
        assert_eq!(
            sections[2].widgets[0],
            Widget::TextParagraph {
                text: "⚠️ エラー情報:\nrandom: channel_not_found".to_string()
            }
        );
    }

    #[test]
    fn test_card_json_shape() {
        let card = build_card(&report(vec![stat("general", 1, 3)]), "now");
        let json = serde_json::to_value(&card).unwrap();

        assert_eq!(
            json["cards"][0]["sections"][1]["widgets"][0]["keyValue"]["topLabel"],
            "チャンネル別集計"
        );
        assert_eq!(
            json["cards"][0]["sections"][0]["widgets"][0]["textParagraph"]["text"],
            "過去1時間の未対応通知数"
        );
    }

    #[test]
    fn test_window_label_minutes() {
        assert_eq!(window_label(1800), "過去30分の未対応通知数");
        assert_eq!(window_label(7200), "過去2時間の未対応通知数");
    }
}
