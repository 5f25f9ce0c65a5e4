//! Decoder Loop

use std::sync::Arc;
use std::time::Duration;

use loop_core::{RatePair, ShutdownFlag, Side, WheelPair};
use tokio::time::sleep;
use tracing::info;

use crate::config::{DecoderConfig, DecodingPolicy};
use crate::discrete::plan;
use crate::wta::WtaState;

/// Pause applied to iterations that held no turn window, so the decoder
/// does not spin against the rate locks.
const DECODE_PAUSE_MS: u64 = 10;

/// Continuous loop reading the published firing rates and writing wheel
/// speeds under the active policy.
pub struct SpeedDecoder {
    config: DecoderConfig,
    rates: Arc<RatePair>,
    wheels: Arc<WheelPair>,
    shutdown: Arc<ShutdownFlag>,
}

impl SpeedDecoder {
    pub fn new(
        config: DecoderConfig,
        rates: Arc<RatePair>,
        wheels: Arc<WheelPair>,
        shutdown: Arc<ShutdownFlag>,
    ) -> Self {
        Self {
            config,
            rates,
            wheels,
            shutdown,
        }
    }

    pub async fn run(self) {
        info!("Speed decoder started ({:?})", self.config.policy);
        match self.config.policy {
            DecodingPolicy::Discrete => self.run_discrete().await,
            DecodingPolicy::WinnerTakesAll { c_left, c_right } => {
                self.run_wta(c_left, c_right).await
            }
        }
        info!("Speed decoder stopped");
    }

    async fn run_discrete(self) {
        loop {
            let left_rate = self.rates.get(Side::Left);
            let right_rate = self.rates.get(Side::Right);

            let mut held = false;
            for step in plan(left_rate, right_rate, self.config.max_speed) {
                self.wheels.set(Side::Left, step.left);
                self.wheels.set(Side::Right, step.right);
                if step.hold_ms > 0 {
                    sleep(Duration::from_millis(step.hold_ms)).await;
                    held = true;
                }
            }

            if self.shutdown.is_set() {
                break;
            }
            if !held {
                sleep(Duration::from_millis(DECODE_PAUSE_MS)).await;
            }
        }
    }

    async fn run_wta(self, c_left: f32, c_right: f32) {
        let mut state = WtaState::new(self.config.max_speed);
        loop {
            let (w_l, w_r) = state.step(
                self.rates.get(Side::Left),
                self.rates.get(Side::Right),
                self.config.max_speed,
                c_left,
                c_right,
                self.config.brake_speed,
            );
            self.wheels.set(Side::Left, w_l);
            self.wheels.set(Side::Right, w_r);

            if self.shutdown.is_set() {
                break;
            }
            sleep(Duration::from_millis(DECODE_PAUSE_MS)).await;
        }
    }
}
