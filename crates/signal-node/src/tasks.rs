//! Worker Loops
//!
//! The node's wire-facing loops (receive, send) and the spike feed that
//! turns detection events into counter increments. Every loop observes the
//! shutdown flag once per iteration.

use std::time::Duration;

use loop_core::Side;
use mea_protocol::{Frame, FrameReader, FrameWriter, WireError, MAX_RATE};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::SignalState;

/// Pacing of the rate send loop
const RATE_SEND_PERIOD_MS: u64 = 100;

/// How often the spike feed re-checks the shutdown flag while idle
const FEED_POLL_MS: u64 = 100;

/// Receive loop: stimulus frames raise the queue, ToggleRun flips the run
/// gate. A closed peer is a normal termination trigger.
pub async fn receive_loop(mut reader: FrameReader, state: SignalState) {
    loop {
        match reader.recv().await {
            Ok(Some(Frame::StimulusLeft)) => state.stimuli.raise(Side::Left),
            Ok(Some(Frame::StimulusRight)) => state.stimuli.raise(Side::Right),
            Ok(Some(Frame::ToggleRun)) => {
                if state.run_gate.toggle() {
                    info!("Robot started by the control operator.");
                } else {
                    info!("Robot stopped by the control operator.");
                }
            }
            Ok(Some(frame)) => warn!("Unexpected frame from control node: {:?}", frame),
            Ok(None) => {
                info!("Control node has closed.");
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

/// Send loop: while the run gate is open, stream the current rate pair.
///
/// A peer reset is left for the receive loop to classify; any other send
/// failure raises the shutdown flag. A rate beyond the 3-digit field is a
/// broken spike source and is treated as fatal rather than truncated.
pub async fn send_loop(mut writer: FrameWriter, state: SignalState) {
    loop {
        if state.run_gate.is_running() {
            let pairs = [
                (Side::Left, state.rates.get(Side::Left)),
                (Side::Right, state.rates.get(Side::Right)),
            ];
            let mut failed = false;
            for (side, rate) in pairs {
                if rate > MAX_RATE as u32 {
                    error!("{} rate {} exceeds the wire format", side, rate);
                    state.shutdown.trigger();
                    failed = true;
                    break;
                }
                let frame = match side {
                    Side::Left => Frame::LeftRate(rate as u16),
                    Side::Right => Frame::RightRate(rate as u16),
                };
                match writer.send(&frame).await {
                    Ok(()) => {}
                    // The receive loop reports the close; keep looping
                    // until the flag is raised there.
                    Err(WireError::PeerClosed) => {}
                    Err(err) => {
                        error!("Error during data sending: {}", err);
                        state.shutdown.trigger();
                        failed = true;
                        break;
                    }
                }
            }
            if failed {
                break;
            }
        }

        if state.shutdown.is_set() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(RATE_SEND_PERIOD_MS)).await;
    }
}

/// Spike feed: each event increments its side's counter while the run gate
/// is open; events arriving while stopped are discarded.
pub async fn spike_feed(mut events: mpsc::Receiver<Side>, state: SignalState) {
    loop {
        if state.shutdown.is_set() {
            break;
        }
        match tokio::time::timeout(Duration::from_millis(FEED_POLL_MS), events.recv()).await {
            Ok(Some(side)) => {
                if state.run_gate.is_running() {
                    state.counters.record(side);
                    debug!("Spike detected on the {} channel", side);
                }
            }
            Ok(None) => break,
            Err(_) => {} // idle; re-check the flag
        }
    }
}

/// Stand-in spike source: lines `l` / `r` on stdin produce one spike each.
///
/// The blocking stdin read cannot be cancelled; the supervisor leaves this
/// task out of the join set and aborts it at exit.
pub fn spawn_stdin_spike_source(events: mpsc::Sender<Side>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            let side = match line.trim() {
                "l" | "L" => Side::Left,
                "r" | "R" => Side::Right,
                _ => continue,
            };
            if events.send(side).await.is_err() {
                break;
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::{TcpListener, TcpStream};

    async fn wire_pair() -> (FrameReader, FrameWriter, FrameReader, FrameWriter) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let client = TcpStream::connect(addr).await.unwrap();
        let (server, _) = listener.accept().await.unwrap();
        let (node_rx, node_tx) = mea_protocol::split(client);
        let (peer_rx, peer_tx) = mea_protocol::split(server);
        (node_rx, node_tx, peer_rx, peer_tx)
    }

    #[tokio::test]
    async fn test_receive_loop_queues_stimuli_and_toggles_gate() {
        let (node_rx, _node_tx, _peer_rx, mut peer_tx) = wire_pair().await;
        let state = SignalState::new();
        let task = tokio::spawn(receive_loop(node_rx, state.clone()));

        peer_tx.send(&Frame::StimulusLeft).await.unwrap();
        peer_tx.send(&Frame::StimulusLeft).await.unwrap();
        peer_tx.send(&Frame::StimulusRight).await.unwrap();
        peer_tx.send(&Frame::ToggleRun).await.unwrap();

        while state.stimuli.pending(Side::Right) < 1 || !state.run_gate.is_running() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(state.stimuli.pending(Side::Left), 2);

        // Peer close ends the loop cleanly and raises the flag.
        drop(peer_tx);
        task.await.unwrap();
        assert!(state.shutdown.is_set());
    }

    #[tokio::test]
    async fn test_send_loop_streams_rate_pairs_while_running() {
        let (_node_rx, node_tx, mut peer_rx, _peer_tx) = wire_pair().await;
        let state = SignalState::new();
        state.run_gate.toggle();
        state.rates.set(Side::Left, 4);
        state.rates.set(Side::Right, 7);

        let task = tokio::spawn(send_loop(node_tx, state.clone()));

        assert_eq!(peer_rx.recv().await.unwrap(), Some(Frame::LeftRate(4)));
        assert_eq!(peer_rx.recv().await.unwrap(), Some(Frame::RightRate(7)));

        state.shutdown.trigger();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_send_loop_rejects_unrepresentable_rate() {
        let (_node_rx, node_tx, _peer_rx, _peer_tx) = wire_pair().await;
        let state = SignalState::new();
        state.run_gate.toggle();
        state.rates.set(Side::Left, 1000);

        tokio::spawn(send_loop(node_tx, state.clone()))
            .await
            .unwrap();
        assert!(state.shutdown.is_set());
    }

    #[tokio::test]
    async fn test_spike_feed_respects_run_gate() {
        let state = SignalState::new();
        let (tx, rx) = mpsc::channel(8);
        let task = tokio::spawn(spike_feed(rx, state.clone()));

        // Gate closed: the event is discarded.
        tx.send(Side::Left).await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(state.counters.value(Side::Left), 0);

        state.run_gate.toggle();
        tx.send(Side::Left).await.unwrap();
        tx.send(Side::Right).await.unwrap();
        while state.counters.value(Side::Right) == 0 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(state.counters.value(Side::Left), 1);

        state.shutdown.trigger();
        task.await.unwrap();
    }
}
