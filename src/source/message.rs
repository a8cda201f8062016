use serde::{Deserialize, Serialize};

/// A single channel message as returned by the message source.
///
/// Only the fields that drive classification are modelled; every other field in
/// the upstream payload is ignored on deserialization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Slack uses the message timestamp (`ts`) as its identifier within a channel.
    #[serde(rename = "ts", default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bot_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reactions: Option<Vec<Reaction>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl Message {
    /// Whole seconds of the `ts` identifier, if it is a Slack timestamp.
    pub fn posted_at_secs(&self) -> Option<i64> {
        self.id.split('.').next()?.parse().ok()
    }
}

/// Reaction marker. Classification only looks at whether any are present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reaction {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
}

impl Reaction {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            count: Some(1),
        }
    }
}
