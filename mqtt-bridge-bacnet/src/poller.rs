//! BACnet polling cycle and telemetry publishing.
//!
//! A tick fetches the point set, then (unless a cycle is already running)
//! reads every point strictly one at a time in point-set order and finally
//! publishes one message per point, in the same order.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info, warn};

use fieldsight_bridge_framework::{
    BridgeError, CredentialMinter, PublishStats, TelemetryMessage, TelemetrySink, TelemetryValue,
};

use crate::bacnet::datatype;
use crate::points::{Point, PointSet};
use crate::source::{PointSource, SourceError};
use crate::transport::{ReadAck, ReadRequest, Transport, TransportError};

/// Error type for polling operations.
#[derive(Debug, thiserror::Error)]
pub enum PollerError {
    #[error("Credential minting failed: {0}")]
    Credential(#[source] BridgeError),
    #[error("Point set fetch failed: {0}")]
    Fetch(#[from] SourceError),
}

/// Result of reading one point.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Value(TelemetryValue),
    /// Diagnostic text describing why no value was obtained.
    Error(String),
}

impl Outcome {
    pub fn from_read(result: Result<ReadAck, TransportError>) -> Self {
        let value = result
            .map_err(|e| e.to_string())
            .and_then(|ack| datatype::resolve(ack).map_err(|e| e.to_string()));
        match value {
            Ok(value) => Outcome::Value(value),
            Err(diagnostic) => Outcome::Error(diagnostic),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Outcome::Error(_))
    }

    /// The value to publish; errors travel as their diagnostic text.
    pub fn into_value(self) -> TelemetryValue {
        match self {
            Outcome::Value(value) => value,
            Outcome::Error(diagnostic) => TelemetryValue::Text(diagnostic),
        }
    }
}

/// Whether a cycle is in progress. Clones share the flag.
#[derive(Debug, Clone, Default)]
pub struct CycleState {
    running: Arc<AtomicBool>,
}

impl CycleState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the cycle, or `None` if one is already running.
    pub fn try_begin(&self) -> Option<CycleGuard> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| CycleGuard {
                running: self.running.clone(),
            })
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}

/// Marks a cycle as running until dropped.
#[derive(Debug)]
pub struct CycleGuard {
    running: Arc<AtomicBool>,
}

impl Drop for CycleGuard {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Release);
    }
}

/// Summary of one completed cycle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CycleReport {
    /// Points read.
    pub points: usize,
    /// Points whose read produced an error diagnostic.
    pub errors: usize,
    pub published: PublishStats,
    pub elapsed: Duration,
}

/// What a tick did.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// A previous cycle was still running; nothing was read or published.
    Skipped,
    Completed(CycleReport),
}

/// Runs polling cycles against one transport.
///
/// Cloning is cheap; clones share the cycle state, so at most one cycle runs
/// across all of them.
#[derive(Clone)]
pub struct Poller {
    source: Arc<dyn PointSource>,
    transport: Arc<dyn Transport>,
    sink: Arc<dyn TelemetrySink>,
    minter: Arc<dyn CredentialMinter>,
    state: CycleState,
}

impl Poller {
    pub fn new(
        source: Arc<dyn PointSource>,
        transport: Arc<dyn Transport>,
        sink: Arc<dyn TelemetrySink>,
        minter: Arc<dyn CredentialMinter>,
    ) -> Self {
        Self {
            source,
            transport,
            sink,
            minter,
            state: CycleState::new(),
        }
    }

    pub fn state(&self) -> &CycleState {
        &self.state
    }

    /// Handle one scheduler tick.
    ///
    /// The point set is fetched on every tick, even when the tick is then
    /// skipped because a cycle is still running.
    pub async fn tick(&self) -> Result<TickOutcome, PollerError> {
        let credential = self.minter.mint().map_err(PollerError::Credential)?;
        let points = self.source.fetch(&credential).await?;
        drop(credential);

        let Some(guard) = self.state.try_begin() else {
            debug!("Previous cycle still running, skipping tick ({} points fetched)", points.len());
            return Ok(TickOutcome::Skipped);
        };

        Ok(TickOutcome::Completed(self.run_cycle(points, guard).await))
    }

    async fn run_cycle(&self, points: PointSet, _guard: CycleGuard) -> CycleReport {
        let started = Instant::now();
        let mut pending = points.into_queue();
        let results = self.drain(&mut pending).await;

        let errors = results.iter().filter(|(_, o)| o.is_error()).count();
        let points = results.len();
        let published = self.finish(results).await;

        CycleReport {
            points,
            errors,
            published,
            elapsed: started.elapsed(),
        }
    }

    /// Read each pending point in turn; the next request is issued only after
    /// the previous one resolved.
    async fn drain(&self, pending: &mut VecDeque<Point>) -> Vec<(Point, Outcome)> {
        let mut results = Vec::with_capacity(pending.len());

        while let Some(point) = pending.pop_front() {
            let request = ReadRequest::for_point(&point);
            let outcome = Outcome::from_read(self.transport.read_property(&request).await);

            match &outcome {
                Outcome::Value(value) => debug!(
                    "Point '{}' ({} {}): {:?}",
                    point.id, point.object, point.property, value
                ),
                Outcome::Error(diagnostic) => warn!(
                    "Point '{}' ({} {} @ {}): {}",
                    point.id, point.object, point.property, point.address, diagnostic
                ),
            }

            results.push((point, outcome));
        }

        results
    }

    /// Publish one message per result, in order, each under a fresh credential.
    async fn finish(&self, results: Vec<(Point, Outcome)>) -> PublishStats {
        let mut stats = PublishStats::default();

        for (point, outcome) in results {
            let credential = match self.minter.mint() {
                Ok(credential) => credential,
                Err(e) => {
                    warn!("Point '{}': credential minting failed: {}", point.id, e);
                    stats.failed += 1;
                    continue;
                }
            };

            let message = TelemetryMessage::new(point.id, outcome.into_value());
            match self.sink.publish(&message, &credential).await {
                Ok(()) => stats.success += 1,
                Err(e) => {
                    warn!("Point '{}': publish failed: {}", message.measurement, e);
                    stats.failed += 1;
                }
            }
        }

        if stats.failed > 0 {
            info!(
                "Published {}/{} messages ({:.1}%)",
                stats.success,
                stats.total(),
                stats.success_rate()
            );
        }

        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_guard_releases_on_drop() {
        let state = CycleState::new();
        let guard = state.try_begin().expect("first claim succeeds");
        assert!(state.is_running());
        assert!(state.try_begin().is_none());

        drop(guard);
        assert!(!state.is_running());
        assert!(state.try_begin().is_some());
    }

    #[test]
    fn test_clones_share_state() {
        let state = CycleState::new();
        let other = state.clone();
        let _guard = state.try_begin().unwrap();
        assert!(other.is_running());
        assert!(other.try_begin().is_none());
    }

    #[test]
    fn test_outcome_from_transport_error() {
        let outcome = Outcome::from_read(Err(TransportError::Timeout(Duration::from_secs(3))));
        assert_eq!(outcome, Outcome::Error("no response within 3s".into()));
        assert_eq!(
            outcome.into_value(),
            TelemetryValue::Text("no response within 3s".into())
        );
    }
}
