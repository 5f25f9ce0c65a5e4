//! Rate Integrator
//!
//! The 1-second tick that turns raw spike counts into published firing
//! rates. Each tick atomically snapshots-and-resets both counters under
//! their locks, publishes the values, and pushes a [`RateSnapshot`] to the
//! persistence sink.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::state::{RatePair, ShutdownFlag, Side, SpikeCounters, StimulusQueue};

/// Fixed integration period of the firing-rate window
pub const INTEGRATION_PERIOD: Duration = Duration::from_secs(1);

/// One tick's worth of persisted state: the rate pair plus the pending
/// stimulus pair, as four integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateSnapshot {
    pub left_rate: u32,
    pub right_rate: u32,
    pub pending_left: u32,
    pub pending_right: u32,
}

/// Periodic task integrating spike counts into firing rates.
pub struct RateIntegrator {
    counters: Arc<SpikeCounters>,
    rates: Arc<RatePair>,
    stimuli: Arc<StimulusQueue>,
}

impl RateIntegrator {
    pub fn new(
        counters: Arc<SpikeCounters>,
        rates: Arc<RatePair>,
        stimuli: Arc<StimulusQueue>,
    ) -> Self {
        Self {
            counters,
            rates,
            stimuli,
        }
    }

    /// Run the tick loop until the shutdown flag is raised.
    ///
    /// Snapshots are pushed non-blocking; a full or closed sink drops the
    /// snapshot rather than stalling the tick.
    pub async fn run(self, shutdown: Arc<ShutdownFlag>, sink: mpsc::Sender<RateSnapshot>) {
        let mut ticker = tokio::time::interval(INTEGRATION_PERIOD);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        // interval fires immediately; consume the zeroth tick so the first
        // published rate covers a full period.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            if shutdown.is_set() {
                break;
            }

            let left = self.counters.snapshot_and_reset(Side::Left);
            let right = self.counters.snapshot_and_reset(Side::Right);
            self.rates.set(Side::Left, left);
            self.rates.set(Side::Right, right);

            debug!("L = {} | R = {}", left, right);

            let snapshot = RateSnapshot {
                left_rate: left,
                right_rate: right,
                pending_left: self.stimuli.pending(Side::Left),
                pending_right: self.stimuli.pending(Side::Right),
            };
            let _ = sink.try_send(snapshot);
        }

        info!("Rate integrator stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parts() -> (
        Arc<SpikeCounters>,
        Arc<RatePair>,
        Arc<StimulusQueue>,
        Arc<ShutdownFlag>,
    ) {
        (
            Arc::new(SpikeCounters::default()),
            Arc::new(RatePair::default()),
            Arc::new(StimulusQueue::default()),
            Arc::new(ShutdownFlag::default()),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_tick_captures_increments_exactly_once() {
        let (counters, rates, stimuli, shutdown) = parts();
        let (tx, mut rx) = mpsc::channel(8);
        let integrator =
            RateIntegrator::new(counters.clone(), rates.clone(), stimuli.clone());
        let task = tokio::spawn(integrator.run(shutdown.clone(), tx));

        counters.record(Side::Left);
        counters.record(Side::Left);
        counters.record(Side::Left);
        counters.record(Side::Right);

        let first = rx.recv().await.unwrap();
        assert_eq!(first.left_rate, 3);
        assert_eq!(first.right_rate, 1);
        assert_eq!(rates.get(Side::Left), 3);
        // Counters were reset under the lock at the tick.
        assert_eq!(counters.value(Side::Left), 0);
        assert_eq!(counters.value(Side::Right), 0);

        // Increments strictly between tick 1 and tick 2 appear exactly once.
        counters.record(Side::Right);
        counters.record(Side::Right);
        let second = rx.recv().await.unwrap();
        assert_eq!(second.left_rate, 0);
        assert_eq!(second.right_rate, 2);

        shutdown.trigger();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_snapshot_carries_pending_stimuli() {
        let (counters, rates, stimuli, shutdown) = parts();
        let (tx, mut rx) = mpsc::channel(8);
        stimuli.raise(Side::Left);
        stimuli.raise(Side::Left);
        stimuli.raise(Side::Right);

        let integrator =
            RateIntegrator::new(counters.clone(), rates.clone(), stimuli.clone());
        let task = tokio::spawn(integrator.run(shutdown.clone(), tx));

        let snap = rx.recv().await.unwrap();
        assert_eq!(snap.pending_left, 2);
        assert_eq!(snap.pending_right, 1);

        shutdown.trigger();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_stops_within_one_tick_of_shutdown() {
        let (counters, rates, stimuli, shutdown) = parts();
        let (tx, mut rx) = mpsc::channel(8);
        let integrator = RateIntegrator::new(counters, rates, stimuli);
        let task = tokio::spawn(integrator.run(shutdown.clone(), tx));

        shutdown.trigger();
        // Next tick observes the flag and exits without publishing.
        assert!(rx.recv().await.is_none());
        task.await.unwrap();
    }
}
