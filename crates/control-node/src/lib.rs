//! Robot Control Node
//!
//! The robot-side peer of the closed loop. Accepts the signal node's
//! connection, decodes streamed firing rates into wheel speeds, drives the
//! actuators, scans the proximity sensors, and reports obstacle-triggered
//! stimulation requests back over the wire.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use loop_core::{RatePair, RunGate, ShutdownFlag, StimulusQueue, WheelPair};
use motor_decoder::SpeedDecoder;
use proximity_scan::ObstacleScanner;
use sim_client::{RobotInterface, VirtualRobot};
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

pub mod config;
pub mod input;
pub mod menu;
pub mod tasks;

pub use config::ControlConfig;

/// Shared state owned by the node's task set
#[derive(Clone)]
pub struct ControlState {
    pub rates: Arc<RatePair>,
    pub stimuli: Arc<StimulusQueue>,
    pub wheels: Arc<WheelPair>,
    pub run_gate: Arc<RunGate>,
    pub shutdown: Arc<ShutdownFlag>,
    /// One ToggleRun frame owed to the signal node
    toggle_pending: Arc<AtomicBool>,
    /// Operator asked for a reverse burst (honored only while stopped)
    reverse_pending: Arc<AtomicBool>,
}

impl ControlState {
    pub fn new() -> Self {
        Self {
            rates: Arc::new(RatePair::default()),
            stimuli: Arc::new(StimulusQueue::default()),
            wheels: Arc::new(WheelPair::default()),
            run_gate: Arc::new(RunGate::default()),
            shutdown: Arc::new(ShutdownFlag::default()),
            toggle_pending: Arc::new(AtomicBool::new(false)),
            reverse_pending: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Queue one ToggleRun frame for the send loop.
    pub fn request_toggle(&self) {
        self.toggle_pending.store(true, Ordering::Release);
    }

    pub fn toggle_requested(&self) -> bool {
        self.toggle_pending.load(Ordering::Acquire)
    }

    /// Mark the queued ToggleRun frame as sent.
    pub fn clear_toggle(&self) {
        self.toggle_pending.store(false, Ordering::Release);
    }

    pub fn request_reverse(&self) {
        self.reverse_pending.store(true, Ordering::Release);
    }

    pub fn reverse_requested(&self) -> bool {
        self.reverse_pending.load(Ordering::Acquire)
    }

    pub fn clear_reverse(&self) {
        self.reverse_pending.store(false, Ordering::Release);
    }
}

impl Default for ControlState {
    fn default() -> Self {
        Self::new()
    }
}

/// Initialize console logging
pub fn init_logging() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");
}

/// Run the control node until the loop terminates.
///
/// Attaches the robot capability, accepts the single signal-node client,
/// starts the worker task set, and joins every worker except the operator
/// input reader, whose blocking read only ends with the process.
pub async fn run(config: ControlConfig) -> anyhow::Result<()> {
    let state = ControlState::new();

    let robot = Arc::new(VirtualRobot::connect(config.sim_port));
    let robot_iface: Arc<dyn RobotInterface> = robot.clone();

    let (stream, _peer) = mea_protocol::accept_one(&config.listen_addr).await?;
    info!("Type start to run the robot.");
    let (reader, writer) = mea_protocol::split(stream);

    let receive_task = tokio::spawn(tasks::receive_loop(reader, state.clone()));
    let send_task = tokio::spawn(tasks::send_loop(writer, state.clone()));

    let drive_state = state.clone();
    let drive_robot = robot_iface.clone();
    let reverse_speed = config.reverse_speed;
    let drive_task = tokio::spawn(async move {
        if let Err(err) = tasks::drive_loop(drive_robot, drive_state.clone(), reverse_speed).await
        {
            error!("Actuator drive failed: {}", err);
            drive_state.shutdown.trigger();
        }
    });

    let scanner = ObstacleScanner::new(
        robot_iface.clone(),
        config.scan.clone(),
        state.stimuli.clone(),
        state.run_gate.clone(),
        state.shutdown.clone(),
    );
    let scan_state = state.clone();
    let scan_task = tokio::spawn(async move {
        if let Err(err) = scanner.run().await {
            error!("Sensor scan failed: {}", err);
            scan_state.shutdown.trigger();
        }
    });

    let decoder = SpeedDecoder::new(
        config.decoder,
        state.rates.clone(),
        state.wheels.clone(),
        state.shutdown.clone(),
    );
    let decoder_task = tokio::spawn(decoder.run());

    let input_task = input::spawn_operator_input(state.clone());

    let ctrl_c_state = state.clone();
    let ctrl_c_task = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Closing control node, please wait...");
            ctrl_c_state.shutdown.trigger();
        }
    });

    // Join set: all workers except the operator input reader. A receive
    // blocked on a half-open peer can stall this indefinitely.
    receive_task.await?;
    send_task.await?;
    drive_task.await?;
    scan_task.await?;
    decoder_task.await?;

    ctrl_c_task.abort();
    input_task.abort();
    robot.disconnect();

    info!("Control node successfully finished");
    Ok(())
}
