//! Obstacle Scanner Loop

use std::sync::Arc;
use std::time::Duration;

use loop_core::{RunGate, ShutdownFlag, Side, StimulusQueue};
use sim_client::{ObjectHandle, RobotInterface, SimError};
use tokio::time::sleep;
use tracing::{debug, info};

use crate::channel::SensorChannel;
use crate::config::ScanConfig;
use crate::zone::{classify, Zone};

/// Number of directional proximity sensors
pub const SENSOR_COUNT: usize = 5;

/// Pause applied to iterations that took no stimulation sleep, so an idle
/// scanner does not spin.
const SCAN_PAUSE_MS: u64 = 20;

/// Polls the proximity sensor array and queues stimulation events.
pub struct ObstacleScanner {
    robot: Arc<dyn RobotInterface>,
    config: ScanConfig,
    stimuli: Arc<StimulusQueue>,
    run: Arc<RunGate>,
    shutdown: Arc<ShutdownFlag>,
}

impl ObstacleScanner {
    pub fn new(
        robot: Arc<dyn RobotInterface>,
        config: ScanConfig,
        stimuli: Arc<StimulusQueue>,
        run: Arc<RunGate>,
        shutdown: Arc<ShutdownFlag>,
    ) -> Self {
        Self {
            robot,
            config,
            stimuli,
            run,
            shutdown,
        }
    }

    fn resolve_sensors(&self) -> Result<Vec<ObjectHandle>, SimError> {
        (1..=SENSOR_COUNT)
            .map(|n| self.robot.object_handle(&format!("KJunior_proxSensor{}", n)))
            .collect()
    }

    /// Run the scan loop until shutdown or loss of the simulation link.
    ///
    /// A failed sensor read is skipped for that pass; the sensor keeps its
    /// previous trigger state. In proportional mode the loop sleeps the
    /// fired zone's minimum period; in binary mode it sleeps the fixed
    /// period every pass, whatever the zone outcome.
    pub async fn run(self) -> Result<(), SimError> {
        let handles = self.resolve_sensors()?;
        let mut channels: [SensorChannel; SENSOR_COUNT] =
            std::array::from_fn(|_| SensorChannel::default());
        let mut triggered = [false; SENSOR_COUNT];

        info!("Obstacle scanner started ({:?} coding)", self.config.coding);

        while self.robot.connected() {
            let mut slept = false;

            if self.run.is_running() {
                for i in 0..SENSOR_COUNT {
                    channels[i].begin_pass();
                    if let Ok(reading) = self.robot.read_proximity(handles[i]) {
                        triggered[i] = reading.triggered;
                        if reading.triggered && !self.config.is_binary() {
                            channels[i].observe(reading.distance_mm, &self.config);
                        }
                    }
                }

                match classify(&triggered) {
                    Some(Zone::Center) => {
                        info!("CENTER sensor detected obstacle!");
                        if !self.config.is_binary() {
                            let period = channels
                                .iter()
                                .map(SensorChannel::period_ms)
                                .min()
                                .unwrap_or(self.config.max_period_ms);
                            debug!("Period stimulation: {}ms", period);
                            sleep(Duration::from_millis(period)).await;
                            slept = true;
                        }
                    }
                    Some(Zone::Left) => {
                        self.stimuli.raise(Side::Left);
                        info!("LEFT sensor detected obstacle!");
                        if !self.config.is_binary() {
                            let period = channels[0].period_ms().min(channels[1].period_ms());
                            debug!("Period stimulation: {}ms", period);
                            sleep(Duration::from_millis(period)).await;
                            slept = true;
                        }
                    }
                    Some(Zone::Right) => {
                        self.stimuli.raise(Side::Right);
                        info!("RIGHT sensor detected obstacle!");
                        if !self.config.is_binary() {
                            let period = channels[3].period_ms().min(channels[4].period_ms());
                            debug!("Period stimulation: {}ms", period);
                            sleep(Duration::from_millis(period)).await;
                            slept = true;
                        }
                    }
                    None => {}
                }

                if self.config.is_binary() {
                    sleep(Duration::from_millis(self.config.binary_period_ms)).await;
                    slept = true;
                }
            }

            if self.shutdown.is_set() {
                break;
            }
            if !slept {
                sleep(Duration::from_millis(SCAN_PAUSE_MS)).await;
            }
        }

        info!("Obstacle scanner stopped");
        Ok(())
    }
}
