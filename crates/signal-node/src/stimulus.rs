//! Stimulation Delivery
//!
//! Drains the pending stimulus counters one event at a time through the
//! [`StimulusSink`] collaborator. The counter is only decremented after a
//! successful delivery, so nothing pending is ever lost.

use std::sync::Arc;
use std::time::Duration;

use loop_core::Side;
use tracing::{info, warn};

use crate::SignalState;

/// Pause between drain passes when the queue is idle.
const DRAIN_PAUSE_MS: u64 = 20;

/// Collaborator that performs one stimulation on the preparation.
///
/// The production implementation talks to the stimulator hardware; this
/// node ships a logging stand-in.
pub trait StimulusSink: Send + Sync {
    fn deliver(&self, side: Side) -> std::io::Result<()>;
}

/// Default sink: records the delivery on the console.
pub struct LoggingStimulusSink;

impl StimulusSink for LoggingStimulusSink {
    fn deliver(&self, side: Side) -> std::io::Result<()> {
        info!("{} sensor detected obstacle! Stimulus delivered to MEA.", side);
        Ok(())
    }
}

/// Drain loop: left side first, then right, one delivery per side per pass.
pub async fn drain_loop(sink: Arc<dyn StimulusSink>, state: SignalState) {
    loop {
        for side in [Side::Left, Side::Right] {
            if state.stimuli.pending(side) > 0 {
                match sink.deliver(side) {
                    Ok(()) => {
                        state.stimuli.settle_one(side);
                    }
                    Err(err) => warn!("Stimulus delivery on {} failed: {}", side, err),
                }
            }
        }

        if state.shutdown.is_set() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(DRAIN_PAUSE_MS)).await;
    }
    info!("Stimulus delivery stopped");
}
