use super::types::*;
use crate::config::{env_var_pattern, expand_env_vars, expand_tilde};
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("validation failed:\n{}", .0.join("\n"))]
    ValidationList(Vec<String>),

    #[error("validation failed: {0}")]
    Validation(String),
}

pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let yaml_string = std::fs::read_to_string(path).map_err(|e| {
        ConfigError::Io(std::io::Error::new(
            e.kind(),
            format!("failed to read config file '{}': {}", path.display(), e),
        ))
    })?;

    parse_config(&yaml_string)
}

/// Parse and validate a config document. `$env{VAR}` references are expanded
/// before parsing and `~` is expanded in paths afterwards.
pub fn parse_config(yaml: &str) -> Result<Config, ConfigError> {
    let yaml_string = expand_env_vars(yaml);
    check_unexpanded_vars(&yaml_string)?;

    let mut config: Config = serde_yaml::from_str(&yaml_string)?;
    expand_paths(&mut config);
    validate_config(&config)?;

    Ok(config)
}

/// Checks for unexpanded environment variables and returns a helpful error.
/// Comment lines are ignored.
fn check_unexpanded_vars(yaml_string: &str) -> Result<(), ConfigError> {
    let mut unexpanded_vars: Vec<String> = yaml_string
        .lines()
        .filter(|line| !line.trim_start().starts_with('#'))
        .flat_map(|line| env_var_pattern().captures_iter(line))
        .map(|cap| cap[1].to_string())
        .collect();

    if unexpanded_vars.is_empty() {
        return Ok(());
    }

    unexpanded_vars.sort();
    unexpanded_vars.dedup();

    let error_msg = if unexpanded_vars.len() == 1 {
        format!(
            "Environment variable $env{{{0}}} is not set.\n\
             \n\
             To fix this, either:\n\
             1. Set the environment variable: export {0}=...\n\
             2. Replace $env{{{0}}} in the config file with the actual value",
            unexpanded_vars[0]
        )
    } else {
        format!(
            "Environment variables are not set: {}\n\
             \n\
             To fix this, either:\n\
             1. Set the environment variables (e.g., export SLACK_TOKEN=xoxb-...)\n\
             2. Replace the variables in the config file with actual values",
            unexpanded_vars.join(", ")
        )
    };

    Err(ConfigError::Validation(error_msg))
}

fn expand_paths(config: &mut Config) {
    if let Some(sheet) = config.sinks.sheet.as_mut() {
        sheet.path = expand_tilde(&sheet.path);
    }
}

fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let mut errors = Vec::new();

    validate_slack(&config.slack, &mut errors);
    validate_channels(config, &mut errors);
    validate_timing(config, &mut errors);
    validate_sinks(&config.sinks, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationList(errors))
    }
}

fn validate_slack(slack: &SlackConfig, errors: &mut Vec<String>) {
    if slack.token.trim().is_empty() {
        errors.push("slack.token cannot be empty".to_string());
    }
    if !is_http_url(&slack.api_base) {
        errors.push(format!(
            "slack.api_base must be an http(s) URL, got '{}'",
            slack.api_base
        ));
    }
}

// An empty channel list is allowed: every cycle ends with nothing to report.
fn validate_channels(config: &Config, errors: &mut Vec<String>) {
    let mut seen_ids = HashSet::new();

    for (i, channel) in config.channels.iter().enumerate() {
        if channel.id.trim().is_empty() {
            errors.push(format!("channels[{}]: id cannot be empty", i));
        } else if !seen_ids.insert(channel.id.as_str()) {
            errors.push(format!(
                "channels[{}]: duplicate channel id '{}'",
                i, channel.id
            ));
        }

        if channel.name.trim().is_empty() {
            errors.push(format!("channels[{}]: name cannot be empty", i));
        }
    }
}

fn validate_timing(config: &Config, errors: &mut Vec<String>) {
    let aggregation = &config.aggregation;

    if aggregation.lookback.as_secs() == 0 {
        errors.push("aggregation.lookback must be at least 1s".to_string());
    }
    if aggregation.fetch_timeout.is_zero() {
        errors.push("aggregation.fetch_timeout must be greater than zero".to_string());
    }
    if aggregation.max_concurrent_fetches == 0 {
        errors.push("aggregation.max_concurrent_fetches must be at least 1".to_string());
    }
    if config.schedule.interval.is_zero() {
        errors.push("schedule.interval must be greater than zero".to_string());
    }
}

fn validate_sinks(sinks: &SinksConfig, errors: &mut Vec<String>) {
    if let Some(chat) = &sinks.chat {
        if !is_http_url(&chat.webhook_url) {
            errors.push(format!(
                "sinks.chat.webhook_url must be an http(s) URL, got '{}'",
                chat.webhook_url
            ));
        }
        if chat.timeout.is_zero() {
            errors.push("sinks.chat.timeout must be greater than zero".to_string());
        }
    }

    if let Some(sheet) = &sinks.sheet {
        if sheet.path.as_os_str().is_empty() {
            errors.push("sinks.sheet.path cannot be empty".to_string());
        }
    }
}

fn is_http_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    const MINIMAL: &str = r#"
slack:
  token: xoxb-test
channels:
  - id: C0001
    name: general
"#;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = parse_config(MINIMAL).unwrap();
        assert_eq!(config.slack.api_base, DEFAULT_SLACK_API_BASE);
        assert_eq!(config.aggregation.lookback, Duration::from_secs(3600));
        assert_eq!(config.aggregation.fetch_timeout, Duration::from_secs(30));
        assert_eq!(config.aggregation.max_concurrent_fetches, 4);
        assert_eq!(config.schedule.interval, Duration::from_secs(3600));
        assert!(config.schedule.run_on_start);
        assert!(config.sinks.is_empty());
    }

    #[test]
    fn test_validation_collects_all_errors() {
        let yaml = r#"
slack:
  token: ""
  api_base: slack.com
channels:
  - id: C1
    name: general
  - id: C1
    name: ""
aggregation:
  lookback: 0s
  max_concurrent_fetches: 0
sinks:
  chat:
    webhook_url: not-a-url
"#;
        let err = parse_config(yaml).unwrap_err();
        let errors = match err {
            ConfigError::ValidationList(errors) => errors,
            other => panic!("expected validation list, got {other}"),
        };

        assert!(errors.iter().any(|e| e.contains("slack.token")));
        assert!(errors.iter().any(|e| e.contains("slack.api_base")));
        assert!(errors.iter().any(|e| e.contains("duplicate channel id 'C1'")));
        assert!(errors.iter().any(|e| e.contains("channels[1]: name")));
        assert!(errors.iter().any(|e| e.contains("aggregation.lookback")));
        assert!(errors.iter().any(|e| e.contains("max_concurrent_fetches")));
        assert!(errors.iter().any(|e| e.contains("sinks.chat.webhook_url")));
    }

    #[test]
    fn test_empty_channel_list_is_valid() {
        let config = parse_config("slack:\n  token: xoxb-test\n").unwrap();
        assert!(config.channels.is_empty());
    }

    #[test]
    fn test_unset_env_var_is_reported() {
        let yaml = "slack:\n  token: $env{NT_DEFINITELY_UNSET_TOKEN}\n";
        let err = parse_config(yaml).unwrap_err();
        assert!(err.to_string().contains("NT_DEFINITELY_UNSET_TOKEN"));
    }

    #[test]
    fn test_env_var_in_comment_is_ignored() {
        let yaml = "# token: $env{NT_ONLY_IN_COMMENT}\nslack:\n  token: xoxb-literal\n";
        let config = parse_config(yaml).unwrap();
        assert_eq!(config.slack.token, "xoxb-literal");
    }

    #[test]
    fn test_env_var_token() {
        std::env::set_var("NT_PARSE_TEST_TOKEN", "xoxb-from-env");
        let config = parse_config("slack:\n  token: $env{NT_PARSE_TEST_TOKEN}\n").unwrap();
        assert_eq!(config.slack.token, "xoxb-from-env");
        std::env::remove_var("NT_PARSE_TEST_TOKEN");
    }
}
