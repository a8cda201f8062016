use crate::aggregate::stat::Channel;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_SLACK_API_BASE: &str = "https://slack.com/api";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub slack: SlackConfig,
    /// Channels to inspect. Report order follows this list.
    #[serde(default)]
    pub channels: Vec<Channel>,
    #[serde(default)]
    pub aggregation: AggregationConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub sinks: SinksConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlackConfig {
    pub token: String,
    #[serde(default = "default_api_base")]
    pub api_base: String,
}

fn default_api_base() -> String {
    DEFAULT_SLACK_API_BASE.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregationConfig {
    #[serde(with = "duration_format", default = "default_lookback")]
    pub lookback: Duration,
    #[serde(with = "duration_format", default = "default_fetch_timeout")]
    pub fetch_timeout: Duration,
    #[serde(default = "default_max_concurrent_fetches")]
    pub max_concurrent_fetches: usize,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            lookback: default_lookback(),
            fetch_timeout: default_fetch_timeout(),
            max_concurrent_fetches: default_max_concurrent_fetches(),
        }
    }
}

fn default_lookback() -> Duration {
    Duration::from_secs(3600)
}

fn default_fetch_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_max_concurrent_fetches() -> usize {
    4
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    #[serde(with = "duration_format", default = "default_interval")]
    pub interval: Duration,
    #[serde(default = "default_run_on_start")]
    pub run_on_start: bool,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval: default_interval(),
            run_on_start: default_run_on_start(),
        }
    }
}

fn default_interval() -> Duration {
    Duration::from_secs(3600)
}

fn default_run_on_start() -> bool {
    true
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SinksConfig {
    pub chat: Option<ChatSinkConfig>,
    pub sheet: Option<SheetSinkConfig>,
}

impl SinksConfig {
    pub fn is_empty(&self) -> bool {
        self.chat.is_none() && self.sheet.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSinkConfig {
    pub webhook_url: String,
    #[serde(with = "duration_format", default = "default_sink_timeout")]
    pub timeout: Duration,
}

fn default_sink_timeout() -> Duration {
    Duration::from_secs(10)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetSinkConfig {
    pub path: PathBuf,
}

// Durations are written as "500ms", "30s", "5m" or "1h"
pub(crate) mod duration_format {
    use serde::{self, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format_duration(*duration))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse_duration(&s).map_err(serde::de::Error::custom)
    }

    pub fn parse_duration(s: &str) -> Result<Duration, String> {
        let s = s.trim();
        if s.is_empty() {
            return Err("empty duration string".to_string());
        }

        let (value_str, unit) = if let Some(v) = s.strip_suffix("ms") {
            (v, "ms")
        } else if let Some(v) = s.strip_suffix('s') {
            (v, "s")
        } else if let Some(v) = s.strip_suffix('m') {
            (v, "m")
        } else if let Some(v) = s.strip_suffix('h') {
            (v, "h")
        } else {
            return Err(format!("invalid duration format: {}", s));
        };

        let value: u64 = value_str
            .trim()
            .parse()
            .map_err(|_| format!("invalid numeric value: {}", value_str))?;

        let secs = match unit {
            "ms" => return Ok(Duration::from_millis(value)),
            "s" => Some(value),
            "m" => value.checked_mul(60),
            _ => value.checked_mul(3600),
        };

        secs.map(Duration::from_secs)
            .ok_or_else(|| format!("duration out of range: {}", s))
    }

    pub fn format_duration(d: Duration) -> String {
        let secs = d.as_secs();
        if d.subsec_millis() != 0 || secs == 0 {
            format!("{}ms", d.as_millis())
        } else if secs % 3600 == 0 {
            format!("{}h", secs / 3600)
        } else if secs % 60 == 0 {
            format!("{}m", secs / 60)
        } else {
            format!("{}s", secs)
        }
    }

}
