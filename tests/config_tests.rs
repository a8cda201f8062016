use notify_tally::config::generate::generate_starter_config;
use notify_tally::config::{load_config, ConfigError};
use std::fs;
use std::time::Duration;
use tempfile::TempDir;

#[test]
fn test_load_config_from_file() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("config.yml");

    fs::write(
        &config_path,
        r#"
slack:
  token: xoxb-file
channels:
  - id: C0001
    name: deploys
  - id: C0002
    name: alerts
aggregation:
  lookback: 30m
  fetch_timeout: 10s
  max_concurrent_fetches: 2
schedule:
  interval: 15m
  run_on_start: false
sinks:
  sheet:
    path: /tmp/notify-tally-test.duckdb
"#,
    )
    .unwrap();

    let config = load_config(&config_path).expect("config should be valid");

    let names: Vec<_> = config.channels.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["deploys", "alerts"]);
    assert_eq!(config.aggregation.lookback, Duration::from_secs(1800));
    assert_eq!(config.aggregation.fetch_timeout, Duration::from_secs(10));
    assert_eq!(config.aggregation.max_concurrent_fetches, 2);
    assert_eq!(config.schedule.interval, Duration::from_secs(900));
    assert!(!config.schedule.run_on_start);
    assert!(config.sinks.chat.is_none());
    assert!(config.sinks.sheet.is_some());
}

#[test]
fn test_missing_file() {
    let temp_dir = TempDir::new().unwrap();
    let err = load_config(&temp_dir.path().join("absent.yml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io(_)));
    assert!(err.to_string().contains("absent.yml"));
}

#[test]
fn test_invalid_yaml() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("config.yml");
    fs::write(&config_path, "slack: [unclosed").unwrap();

    let err = load_config(&config_path).unwrap_err();
    assert!(matches!(err, ConfigError::YamlParse(_)));
}

#[test]
fn test_missing_slack_section() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("config.yml");
    fs::write(&config_path, "channels: []\n").unwrap();

    assert!(load_config(&config_path).is_err());
}

#[test]
fn test_bad_duration() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("config.yml");
    fs::write(
        &config_path,
        "slack:\n  token: x\naggregation:\n  lookback: an hour\n",
    )
    .unwrap();

    let err = load_config(&config_path).unwrap_err();
    assert!(err.to_string().contains("invalid"));
}

#[test]
fn test_generated_config_is_valid() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("config.yml");
    // written exactly as `config init` writes it
    fs::write(&config_path, generate_starter_config()).unwrap();

    std::env::set_var("SLACK_TOKEN", "xoxb-generated");
    let result = load_config(&config_path);
    std::env::remove_var("SLACK_TOKEN");

    let config = result.expect("generated config should be valid");
    assert_eq!(config.slack.token, "xoxb-generated");
    assert_eq!(config.channels.len(), 2);
    assert_eq!(config.aggregation.lookback, Duration::from_secs(3600));
    assert_eq!(config.schedule.interval, Duration::from_secs(3600));
    assert!(config.sinks.chat.is_some());
}
