//! Fixed-interval execution of report cycles.

pub mod cycle;

pub use cycle::{BuildError, CycleOutcome, CycleRunner, SinkFailure};

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{error, info};

/// Repeats cycles every `interval` until shutdown is signalled.
///
/// Each tick spawns its cycle; the runner's own lock turns an overlapping tick
/// into a skipped cycle. Shutdown waits for every spawned cycle to finish.
pub struct Scheduler {
    runner: Arc<CycleRunner>,
    interval: Duration,
    run_on_start: bool,
}

impl Scheduler {
    pub fn new(runner: Arc<CycleRunner>, interval: Duration, run_on_start: bool) -> Self {
        Self {
            runner,
            interval,
            run_on_start,
        }
    }

    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let first_tick = if self.run_on_start {
            Instant::now()
        } else {
            Instant::now() + self.interval
        };
        let mut ticker = tokio::time::interval_at(first_tick, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            interval_secs = self.interval.as_secs(),
            run_on_start = self.run_on_start,
            "Scheduler started"
        );

        let mut cycles: JoinSet<CycleOutcome> = JoinSet::new();

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let runner = self.runner.clone();
                    cycles.spawn(async move {
                        let outcome = runner.run_cycle(Utc::now()).await;
                        log_outcome(&outcome);
                        outcome
                    });
                }
                Some(joined) = cycles.join_next(), if !cycles.is_empty() => {
                    if let Err(e) = joined {
                        error!(error = %e, "Cycle task join error");
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        if !cycles.is_empty() {
            info!(cycles = cycles.len(), "Waiting for in-flight cycles to finish");
        }
        while let Some(joined) = cycles.join_next().await {
            if let Err(e) = joined {
                error!(error = %e, "Cycle task join error");
            }
        }

        info!("Scheduler stopped");
    }
}

pub fn log_outcome(outcome: &CycleOutcome) {
    match outcome {
        CycleOutcome::NothingToReport => info!("Cycle finished: nothing to report"),
        CycleOutcome::Skipped => info!("Cycle skipped"),
        CycleOutcome::Aborted { reason } => error!(reason = %reason, "Cycle aborted"),
        CycleOutcome::Published {
            report,
            sink_failures,
        } => info!(
            channels = report.len(),
            pending = report.total_pending(),
            sink_failures = sink_failures.len(),
            "Cycle finished"
        ),
    }
}
