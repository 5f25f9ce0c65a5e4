//! MEA Signal Node
//!
//! The recording-side peer of the closed loop. Consumes spike events from
//! the detection collaborator, integrates them into per-second firing
//! rates, streams the rates to the control node, and turns received
//! stimulus frames into stimulation deliveries.

use std::sync::Arc;

use loop_core::{RateIntegrator, RatePair, RunGate, ShutdownFlag, SpikeCounters, StimulusQueue};
use tokio::sync::mpsc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

pub mod config;
pub mod menu;
pub mod rate_log;
pub mod stimulus;
pub mod tasks;

pub use config::SignalConfig;

/// Shared state owned by the node's task set
#[derive(Clone)]
pub struct SignalState {
    pub counters: Arc<SpikeCounters>,
    pub rates: Arc<RatePair>,
    pub stimuli: Arc<StimulusQueue>,
    pub run_gate: Arc<RunGate>,
    pub shutdown: Arc<ShutdownFlag>,
}

impl SignalState {
    pub fn new() -> Self {
        Self {
            counters: Arc::new(SpikeCounters::default()),
            rates: Arc::new(RatePair::default()),
            stimuli: Arc::new(StimulusQueue::default()),
            run_gate: Arc::new(RunGate::default()),
            shutdown: Arc::new(ShutdownFlag::default()),
        }
    }
}

impl Default for SignalState {
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

/// Run the signal node until the loop terminates.
///
/// Connects to the control node (bounded retry), starts the worker task
/// set, and joins every worker except the stdin spike producer, whose
/// blocking read only ends with the process.
pub async fn run(config: SignalConfig) -> anyhow::Result<()> {
    let state = SignalState::new();

    let stream = mea_protocol::connect(&config.peer_addr).await?;
    let (reader, writer) = mea_protocol::split(stream);

    let (snapshot_tx, snapshot_rx) = mpsc::channel(16);
    let (spike_tx, spike_rx) = mpsc::channel(64);

    let integrator = RateIntegrator::new(
        state.counters.clone(),
        state.rates.clone(),
        state.stimuli.clone(),
    );

    let integrator_task = tokio::spawn(integrator.run(state.shutdown.clone(), snapshot_tx));
    let log_task = tokio::spawn(rate_log::writer(config.rate_log_path.clone(), snapshot_rx));
    let receive_task = tokio::spawn(tasks::receive_loop(reader, state.clone()));
    let send_task = tokio::spawn(tasks::send_loop(writer, state.clone()));
    let feed_task = tokio::spawn(tasks::spike_feed(spike_rx, state.clone()));
    let drain_task = tokio::spawn(stimulus::drain_loop(
        Arc::new(stimulus::LoggingStimulusSink),
        state.clone(),
    ));
    let stdin_task = tasks::spawn_stdin_spike_source(spike_tx);

    // Host close signal funnels into the same shutdown flag as every
    // failure path.
    let ctrl_c_state = state.clone();
    let ctrl_c_task = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Closing signal node, please wait...");
            ctrl_c_state.shutdown.trigger();
        }
    });

    // Join set: all workers except the stdin producer. A receive blocked
    // on a half-open peer can stall this indefinitely.
    receive_task.await?;
    send_task.await?;
    feed_task.await?;
    drain_task.await?;
    integrator_task.await?;
    log_task.await?;

    ctrl_c_task.abort();
    stdin_task.abort();

    info!("Signal node successfully finished");
    Ok(())
}
