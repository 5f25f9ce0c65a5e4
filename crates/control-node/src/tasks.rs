//! Worker Loops
//!
//! Wire-facing loops (receive rates, send stimuli/toggles) and the actuator
//! drive loop. Every loop observes the shutdown flag once per iteration.

use std::sync::Arc;
use std::time::Duration;

use loop_core::Side;
use mea_protocol::{Frame, FrameReader, FrameWriter, WireError};
use sim_client::{RobotInterface, SimError};
use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::ControlState;

/// Pause between send/drive passes, so idle loops do not spin
const LOOP_PAUSE_MS: u64 = 20;

/// Duration of the operator-commanded reverse burst
const REVERSE_BURST_MS: u64 = 2000;

/// Grace period after asking the simulator to stop
const SIM_STOP_GRACE_MS: u64 = 1000;

/// Receive loop: rate frames update the published pair.
pub async fn receive_loop(mut reader: FrameReader, state: ControlState) {
    loop {
        match reader.recv().await {
            Ok(Some(Frame::LeftRate(rate))) => state.rates.set(Side::Left, rate as u32),
            Ok(Some(Frame::RightRate(rate))) => state.rates.set(Side::Right, rate as u32),
            Ok(Some(frame)) => warn!("Unexpected frame from signal node: {:?}", frame),
            Ok(None) => {
                info!("Signal node has closed.");
                state.shutdown.trigger();
                break;
            }
            Err(err) if err.is_malformed_frame() => {
                warn!("Skipping malformed frame: {}", err);
            }
            Err(err) => {
                error!("Error during data reception: {}", err);
                state.shutdown.trigger();
                break;
            }
        }

        if state.shutdown.is_set() {
            break;
        }
    }
}

/// Send loop: drains the stimulus queue (left first, then right, one frame
/// per side per pass) and any queued ToggleRun.
///
/// A pending counter is only decremented after its frame went out; a peer
/// reset is left for the receive loop to classify.
pub async fn send_loop(mut writer: FrameWriter, state: ControlState) {
    loop {
        let mut failed = false;

        for (side, frame) in [
            (Side::Left, Frame::StimulusLeft),
            (Side::Right, Frame::StimulusRight),
        ] {
            if state.stimuli.pending(side) > 0 {
                match writer.send(&frame).await {
                    Ok(()) => {
                        state.stimuli.settle_one(side);
                    }
                    Err(WireError::PeerClosed) => {}
                    Err(err) => {
                        error!("Error during data sending: {}", err);
                        state.shutdown.trigger();
                        failed = true;
                        break;
                    }
                }
            }
        }

        if !failed && state.toggle_requested() {
            match writer.send(&Frame::ToggleRun).await {
                Ok(()) => state.clear_toggle(),
                Err(WireError::PeerClosed) => {}
                Err(err) => {
                    error!("Error during data sending: {}", err);
                    state.shutdown.trigger();
                    failed = true;
                }
            }
        }

        if failed || state.shutdown.is_set() {
            break;
        }
        sleep(Duration::from_millis(LOOP_PAUSE_MS)).await;
    }
}

/// Drive loop: forwards decoded wheel speeds to the motors while running,
/// holds the robot still while stopped, and executes the 2-second reverse
/// burst on request. On shutdown it asks the simulator to stop once.
pub async fn drive_loop(
    robot: Arc<dyn RobotInterface>,
    state: ControlState,
    reverse_speed: f32,
) -> Result<(), SimError> {
    let left_motor = robot.object_handle("KJunior_motorLeft")?;
    let right_motor = robot.object_handle("KJunior_motorRight")?;

    while robot.connected() {
        if state.run_gate.is_running() {
            let (left, right) = state.wheels.snapshot();
            let _ = robot.set_target_velocity(left_motor, left);
            let _ = robot.set_target_velocity(right_motor, right);
        } else if state.reverse_requested() {
            let deadline = tokio::time::Instant::now() + Duration::from_millis(REVERSE_BURST_MS);
            while tokio::time::Instant::now() < deadline {
                let _ = robot.set_target_velocity(left_motor, -reverse_speed);
                let _ = robot.set_target_velocity(right_motor, -reverse_speed);
                sleep(Duration::from_millis(LOOP_PAUSE_MS)).await;
            }
            state.clear_reverse();
        } else {
            let _ = robot.set_target_velocity(left_motor, 0.0);
            let _ = robot.set_target_velocity(right_motor, 0.0);
        }

        if state.shutdown.is_set() {
            let _ = robot.stop_simulation();
            sleep(Duration::from_millis(SIM_STOP_GRACE_MS)).await;
            break;
        }
        sleep(Duration::from_millis(LOOP_PAUSE_MS)).await;
    }

    info!("Actuator drive stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sim_client::VirtualRobot;
    use tokio::net::{TcpListener, TcpStream};

    async fn wire_pair() -> (FrameReader, FrameWriter, FrameReader, FrameWriter) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let client = TcpStream::connect(addr).await.unwrap();
        let (server, _) = listener.accept().await.unwrap();
        let (node_rx, node_tx) = mea_protocol::split(server);
        let (peer_rx, peer_tx) = mea_protocol::split(client);
        (node_rx, node_tx, peer_rx, peer_tx)
    }

    #[tokio::test]
    async fn test_receive_loop_publishes_rates() {
        let (node_rx, _node_tx, _peer_rx, mut peer_tx) = wire_pair().await;
        let state = ControlState::new();
        let task = tokio::spawn(receive_loop(node_rx, state.clone()));

        peer_tx.send(&Frame::LeftRate(42)).await.unwrap();
        peer_tx.send(&Frame::RightRate(7)).await.unwrap();

        while state.rates.get(Side::Right) != 7 {
            sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(state.rates.get(Side::Left), 42);

        drop(peer_tx);
        task.await.unwrap();
        assert!(state.shutdown.is_set());
    }

    #[tokio::test]
    async fn test_send_loop_drains_stimuli_on_success_only() {
        let (_node_rx, node_tx, mut peer_rx, _peer_tx) = wire_pair().await;
        let state = ControlState::new();
        state.stimuli.raise(Side::Left);
        state.stimuli.raise(Side::Right);
        state.stimuli.raise(Side::Right);

        let task = tokio::spawn(send_loop(node_tx, state.clone()));

        let mut received = Vec::new();
        for _ in 0..3 {
            received.push(peer_rx.recv().await.unwrap().unwrap());
        }
        assert_eq!(
            received,
            vec![Frame::StimulusLeft, Frame::StimulusRight, Frame::StimulusRight]
        );

        while state.stimuli.pending(Side::Right) > 0 {
            sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(state.stimuli.pending(Side::Left), 0);

        state.shutdown.trigger();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_send_loop_flushes_queued_toggle() {
        let (_node_rx, node_tx, mut peer_rx, _peer_tx) = wire_pair().await;
        let state = ControlState::new();
        state.request_toggle();

        let task = tokio::spawn(send_loop(node_tx, state.clone()));
        assert_eq!(peer_rx.recv().await.unwrap(), Some(Frame::ToggleRun));

        while state.toggle_requested() {
            sleep(Duration::from_millis(5)).await;
        }
        state.shutdown.trigger();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_drive_loop_forwards_wheel_speeds_while_running() {
        let robot = Arc::new(VirtualRobot::connect(19997));
        let state = ControlState::new();
        state.run_gate.toggle();
        state.wheels.set(Side::Left, 3.5);
        state.wheels.set(Side::Right, -1.0);

        let task = tokio::spawn(drive_loop(robot.clone(), state.clone(), 10.0));

        let left = robot.object_handle("KJunior_motorLeft").unwrap();
        let right = robot.object_handle("KJunior_motorRight").unwrap();
        while robot.last_velocity(right).is_none() {
            sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(robot.last_velocity(left), Some(3.5));
        assert_eq!(robot.last_velocity(right), Some(-1.0));

        state.shutdown.trigger();
        task.await.unwrap().unwrap();
        // Shutdown asked the simulator to stop exactly once.
        assert_eq!(robot.stop_requests(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drive_loop_reverse_burst_then_idle() {
        let robot = Arc::new(VirtualRobot::connect(19997));
        let state = ControlState::new();
        state.request_reverse();

        let task = tokio::spawn(drive_loop(robot.clone(), state.clone(), 10.0));

        let left = robot.object_handle("KJunior_motorLeft").unwrap();
        while state.reverse_requested() {
            sleep(Duration::from_millis(5)).await;
        }
        let commands = robot.commands_for(left);
        assert!(commands.contains(&-10.0));

        // After the burst the stopped robot is commanded to zero.
        while robot.last_velocity(left) != Some(0.0) {
            sleep(Duration::from_millis(5)).await;
        }

        state.shutdown.trigger();
        task.await.unwrap().unwrap();
    }
}
