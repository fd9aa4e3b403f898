//! Periodic tick source.

use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use crate::poller::{Poller, TickOutcome};

/// Fires [`Poller::tick`] every `interval`, starting immediately.
///
/// Each tick runs on its own task, so a slow cycle never delays the next
/// tick; overlapping ticks are turned away by the poller itself.
pub struct Scheduler {
    poller: Poller,
    interval: Duration,
}

impl Scheduler {
    pub fn new(poller: Poller, interval: Duration) -> Self {
        Self { poller, interval }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run forever.
    pub async fn run(self) {
        info!("Starting BACnet scheduler (interval: {:?})", self.interval);

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            let poller = self.poller.clone();
            tokio::spawn(async move { handle_tick(&poller).await });
        }
    }
}

async fn handle_tick(poller: &Poller) {
    match poller.tick().await {
        Ok(TickOutcome::Completed(report)) => info!(
            "Cycle complete: {} points ({} errors), {} published, {} failed, in {:?}",
            report.points,
            report.errors,
            report.published.success,
            report.published.failed,
            report.elapsed
        ),
        Ok(TickOutcome::Skipped) => warn!("Tick skipped: previous cycle still running"),
        Err(e) => error!("Tick failed: {}", e),
    }
}
