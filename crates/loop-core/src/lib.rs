//! Closed-Loop Runtime Core
//!
//! The cross-thread mutable state shared by the worker tasks of both nodes:
//! mutex-guarded spike counters, published firing rates, the stimulus queue,
//! wheel speeds, the run gate, and the monotonic shutdown flag. Each field
//! carries its own lock, scoped to the smallest read-modify-write region.
//!
//! Also hosts the [`RateIntegrator`], the 1-second tick that turns counter
//! values into published rates.

mod integrator;
mod state;

pub use integrator::{RateIntegrator, RateSnapshot, INTEGRATION_PERIOD};
pub use state::{RatePair, RunGate, ShutdownFlag, Side, SpikeCounters, StimulusQueue, WheelPair};
