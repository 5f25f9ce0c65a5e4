//! Shared State Primitives
//!
//! Every field is owned jointly by a node's task set and guarded by its own
//! lock. Counters are unsigned, so "never negative" holds by construction;
//! the queue's settle path additionally guards against underflow.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};

/// Recording channel / wheel side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Left => write!(f, "LEFT"),
            Side::Right => write!(f, "RIGHT"),
        }
    }
}

fn locked<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Per-side spike counters.
///
/// Incremented by the spike feed, snapshot-and-reset by the integrator tick;
/// both operations hold the side's lock, so no increment is lost or counted
/// twice across a tick boundary.
#[derive(Debug, Default)]
pub struct SpikeCounters {
    left: Mutex<u32>,
    right: Mutex<u32>,
}

impl SpikeCounters {
    fn side(&self, side: Side) -> &Mutex<u32> {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }

    /// Record one spike on the given channel.
    pub fn record(&self, side: Side) {
        *locked(self.side(side)) += 1;
    }

    /// Atomically read the counter and reset it to zero.
    pub fn snapshot_and_reset(&self, side: Side) -> u32 {
        let mut count = locked(self.side(side));
        std::mem::take(&mut *count)
    }

    /// Current counter value (diagnostics only).
    pub fn value(&self, side: Side) -> u32 {
        *locked(self.side(side))
    }
}

/// Published firing rates, one per side.
///
/// Written once per integration tick on the signal node, once per received
/// rate frame on the control node; read continuously by the send loop and
/// the decoder.
#[derive(Debug, Default)]
pub struct RatePair {
    left: Mutex<u32>,
    right: Mutex<u32>,
}

impl RatePair {
    fn side(&self, side: Side) -> &Mutex<u32> {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }

    pub fn set(&self, side: Side, rate: u32) {
        *locked(self.side(side)) = rate;
    }

    pub fn get(&self, side: Side) -> u32 {
        *locked(self.side(side))
    }
}

/// Pending obstacle-triggered stimulation events, one counter per side.
///
/// Raised by sensing (control node) or by received stimulus frames (signal
/// node); settled one at a time by the corresponding drain loop, only after
/// the event has actually been delivered.
#[derive(Debug, Default)]
pub struct StimulusQueue {
    left: Mutex<u32>,
    right: Mutex<u32>,
}

impl StimulusQueue {
    fn side(&self, side: Side) -> &Mutex<u32> {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }

    /// Queue one stimulation event (no upper bound).
    pub fn raise(&self, side: Side) {
        *locked(self.side(side)) += 1;
    }

    /// Number of events still pending on the given side.
    pub fn pending(&self, side: Side) -> u32 {
        *locked(self.side(side))
    }

    /// Mark one event delivered. Returns `false` (and changes nothing)
    /// if no event was pending.
    pub fn settle_one(&self, side: Side) -> bool {
        let mut pending = locked(self.side(side));
        if *pending == 0 {
            return false;
        }
        *pending -= 1;
        true
    }
}

/// Process-wide shutdown flag: monotonic false → true, never reset.
///
/// Every worker loop observes it once per iteration; whichever failure or
/// close path fires first wins, later triggers are no-ops.
#[derive(Debug, Default)]
pub struct ShutdownFlag {
    raised: AtomicBool,
}

impl ShutdownFlag {
    /// Raise the flag. Returns `true` only for the first transition.
    pub fn trigger(&self) -> bool {
        !self.raised.swap(true, Ordering::AcqRel)
    }

    pub fn is_set(&self) -> bool {
        self.raised.load(Ordering::Acquire)
    }
}

/// Operator run gate (started/stopped), toggled over the wire or locally.
#[derive(Debug, Default)]
pub struct RunGate {
    running: AtomicBool,
}

impl RunGate {
    /// Flip the gate, returning the new state.
    pub fn toggle(&self) -> bool {
        !self.running.fetch_xor(true, Ordering::AcqRel)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}

/// Decoded wheel speeds, one lock per wheel.
#[derive(Debug, Default)]
pub struct WheelPair {
    left: Mutex<f32>,
    right: Mutex<f32>,
}

impl WheelPair {
    fn side(&self, side: Side) -> &Mutex<f32> {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }

    pub fn set(&self, side: Side, speed: f32) {
        *locked(self.side(side)) = speed;
    }

    pub fn get(&self, side: Side) -> f32 {
        *locked(self.side(side))
    }

    /// Read both wheels (two lock acquisitions, left then right).
    pub fn snapshot(&self) -> (f32, f32) {
        (self.get(Side::Left), self.get(Side::Right))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_counter_snapshot_resets() {
        let counters = SpikeCounters::default();
        counters.record(Side::Left);
        counters.record(Side::Left);
        counters.record(Side::Right);

        assert_eq!(counters.snapshot_and_reset(Side::Left), 2);
        assert_eq!(counters.snapshot_and_reset(Side::Left), 0);
        assert_eq!(counters.snapshot_and_reset(Side::Right), 1);
    }

    #[test]
    fn test_concurrent_increments_all_counted() {
        let counters = Arc::new(SpikeCounters::default());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let counters = counters.clone();
            handles.push(std::thread::spawn(move || {
                for _ in 0..1000 {
                    counters.record(Side::Left);
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(counters.snapshot_and_reset(Side::Left), 8000);
    }

    #[test]
    fn test_stimulus_queue_never_underflows() {
        let queue = StimulusQueue::default();
        assert!(!queue.settle_one(Side::Left));
        assert_eq!(queue.pending(Side::Left), 0);

        queue.raise(Side::Left);
        queue.raise(Side::Left);
        assert!(queue.settle_one(Side::Left));
        assert!(queue.settle_one(Side::Left));
        assert!(!queue.settle_one(Side::Left));
        assert_eq!(queue.pending(Side::Left), 0);
    }

    #[test]
    fn test_stimulus_queue_concurrent_interleavings() {
        let queue = Arc::new(StimulusQueue::default());
        let mut raisers = Vec::new();
        let mut settlers = Vec::new();
        for _ in 0..4 {
            let queue = queue.clone();
            raisers.push(std::thread::spawn(move || {
                for _ in 0..500 {
                    queue.raise(Side::Right);
                }
            }));
        }
        for _ in 0..4 {
            let queue = queue.clone();
            settlers.push(std::thread::spawn(move || {
                let mut settled = 0u32;
                for _ in 0..500 {
                    if queue.settle_one(Side::Right) {
                        settled += 1;
                    }
                }
                settled
            }));
        }
        for handle in raisers {
            handle.join().unwrap();
        }
        let settled_total: u32 = settlers.into_iter().map(|h| h.join().unwrap()).sum();
        // Everything still pending plus everything settled is exactly
        // what was raised; the counter can never have gone negative.
        assert_eq!(queue.pending(Side::Right) + settled_total, 2000);
    }

    #[test]
    fn test_shutdown_flag_is_monotonic() {
        let flag = ShutdownFlag::default();
        assert!(!flag.is_set());
        assert!(flag.trigger());
        assert!(!flag.trigger());
        assert!(flag.is_set());
    }

    #[test]
    fn test_run_gate_toggles() {
        let gate = RunGate::default();
        assert!(!gate.is_running());
        assert!(gate.toggle());
        assert!(gate.is_running());
        assert!(!gate.toggle());
        assert!(!gate.is_running());
    }
}
