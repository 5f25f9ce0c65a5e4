//! Operator Input
//!
//! Line-oriented command reader: `start`, `stop`, `back`. Each start/stop
//! also queues one ToggleRun frame so the signal node mirrors the gate.
//! The blocking stdin read cannot be cancelled; the supervisor leaves this
//! task out of the join set and aborts it at exit.

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::ControlState;

pub fn spawn_operator_input(state: ControlState) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            handle_command(&state, line.trim());
            if state.shutdown.is_set() {
                break;
            }
        }
    })
}

pub(crate) fn handle_command(state: &ControlState, command: &str) {
    match command.to_ascii_lowercase().as_str() {
        "start" => {
            let (w_l, w_r) = state.wheels.snapshot();
            debug!("W_L = {} | W_R = {}", w_l, w_r);

            if !state.run_gate.is_running() && !state.reverse_requested() {
                state.run_gate.toggle();
                state.request_toggle();
                info!("Robot started by operator. Type stop to halt it.");
            }
        }
        "stop" => {
            if state.run_gate.is_running() {
                state.run_gate.toggle();
                state.request_toggle();
                info!("Robot stopped by operator. start: restart | back: go backwards");
            }
        }
        "back" => {
            if !state.run_gate.is_running() && !state.reverse_requested() {
                state.request_reverse();
                info!("Robot going backwards. start: restart | back: go back again");
            }
        }
        "" => {}
        other => info!("Unknown command {:?} (start | stop | back)", other),
    }
}
