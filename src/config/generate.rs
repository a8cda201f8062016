pub fn generate_starter_config() -> String {
    r#"# =============================================================================
# NOTIFY-TALLY CONFIGURATION
# =============================================================================
# Counts bot and app notifications that nobody has reacted to yet, per Slack
# channel, and reports the counts to Google Chat and/or a local history table.
#
# Values of the form $env{VAR_NAME} are replaced with environment variables
# before the file is parsed.
#
# Config file locations (in order of precedence):
#   1. Path specified via --config argument
#   2. ~/.config/notify-tally/config.yml
#   3. /etc/notify-tally/config.yml

# =============================================================================
# SLACK
# =============================================================================
# Bot token with channels:history (and groups:history for private channels).

slack:
  token: $env{SLACK_TOKEN}
  api_base: https://slack.com/api

# =============================================================================
# CHANNELS
# =============================================================================
# Channels are reported in the order listed here. The name is only used for
# display; the id is what Slack is queried with.

channels:
  - id: C0000000001
    name: general
  - id: C0000000002
    name: random

# =============================================================================
# AGGREGATION
# =============================================================================

aggregation:
  # How far back each cycle looks. Only the first 1000 messages are counted.
  lookback: 1h
  # Upper bound for a single channel fetch
  fetch_timeout: 30s
  # Channels fetched in parallel
  max_concurrent_fetches: 4

# =============================================================================
# SCHEDULE
# =============================================================================

schedule:
  interval: 1h
  # Run a cycle immediately at startup instead of waiting one interval
  run_on_start: true

# =============================================================================
# SINKS
# =============================================================================
# Both sinks are optional. With none configured, cycles only log their results.

sinks:
  chat:
    webhook_url: https://chat.googleapis.com/v1/spaces/SPACE_ID/messages?key=KEY&token=TOKEN
    timeout: 10s
  sheet:
    path: ~/.local/share/notify-tally/history.duckdb
"#
    .to_string()
}
