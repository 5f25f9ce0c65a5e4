//! Firing-Rate Log
//!
//! One line per integration tick, four space-separated integers: left rate,
//! right rate, pending left stimuli, pending right stimuli. The format is
//! consumed by offline analysis tooling.

use loop_core::RateSnapshot;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Append snapshots to the log until the integrator closes the channel.
///
/// A write failure disables the log for the rest of the session but does
/// not touch the loop itself.
pub async fn writer(path: String, mut snapshots: mpsc::Receiver<RateSnapshot>) {
    let mut file = match File::create(&path).await {
        Ok(file) => file,
        Err(err) => {
            warn!("Could not create rate log {}: {}", path, err);
            // Drain the channel so the integrator's sink never fills.
            while snapshots.recv().await.is_some() {}
            return;
        }
    };

    while let Some(snapshot) = snapshots.recv().await {
        let line = format!(
            "{} {} {} {}\n",
            snapshot.left_rate,
            snapshot.right_rate,
            snapshot.pending_left,
            snapshot.pending_right
        );
        if let Err(err) = file.write_all(line.as_bytes()).await {
            warn!("Rate log write failed: {}", err);
            while snapshots.recv().await.is_some() {}
            return;
        }
    }

    if let Err(err) = file.flush().await {
        warn!("Rate log flush failed: {}", err);
    }
    info!("Rate log closed");
}
