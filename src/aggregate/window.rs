use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WindowError {
    #[error("window is empty: oldest ({oldest}) must be before latest ({latest})")]
    Empty { oldest: i64, latest: i64 },

    #[error("lookback {0:?} cannot be represented as a window")]
    Lookback(Duration),
}

/// Half-open range `[oldest, latest)` in unix seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct TimeWindow {
    oldest: i64,
    latest: i64,
}

impl TimeWindow {
    pub fn new(oldest: i64, latest: i64) -> Result<Self, WindowError> {
        if oldest >= latest {
            return Err(WindowError::Empty { oldest, latest });
        }
        Ok(Self { oldest, latest })
    }

    /// Window of `lookback` length ending at `now`, truncated to whole seconds.
    pub fn ending_at(now: DateTime<Utc>, lookback: Duration) -> Result<Self, WindowError> {
        let lookback_secs =
            i64::try_from(lookback.as_secs()).map_err(|_| WindowError::Lookback(lookback))?;
        let latest = now.timestamp();
        let oldest = latest
            .checked_sub(lookback_secs)
            .ok_or(WindowError::Lookback(lookback))?;
        Self::new(oldest, latest)
    }

    pub fn oldest(&self) -> i64 {
        self.oldest
    }

    pub fn latest(&self) -> i64 {
        self.latest
    }

    pub fn contains(&self, timestamp: i64) -> bool {
        timestamp >= self.oldest && timestamp < self.latest
    }

    pub fn duration_secs(&self) -> i64 {
        self.latest - self.oldest
    }
}
