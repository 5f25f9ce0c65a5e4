//! Persistent Link Between the Two Nodes
//!
//! The control node is the server (binds once, accepts exactly one client);
//! the signal node is the client (connects with a fixed 1-second backoff).
//! Once established, the connection is split into a [`FrameReader`] and a
//! [`FrameWriter`] so the receive and send loops can run as independent
//! tasks.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tracing::{info, warn};

use crate::error::WireError;
use crate::frame::{Frame, FRAME_LEN};

/// Standard port of the control-node listener
pub const DEFAULT_PORT: u16 = 5480;

/// Send timeout; receives block indefinitely
const SEND_TIMEOUT_MS: u64 = 2000;

/// Fixed backoff between connection attempts
const RETRY_DELAY: Duration = Duration::from_secs(1);

/// Connection attempts before giving up
const MAX_CONNECT_ATTEMPTS: u32 = 16;

/// Connect to the control node, retrying with a 1-second backoff.
///
/// Progress is reported on attempts 1, 6 and 11; the 16th consecutive
/// failure is fatal and returns [`WireError::ConnectFailed`].
pub async fn connect(addr: &str) -> Result<TcpStream, WireError> {
    for attempt in 1..=MAX_CONNECT_ATTEMPTS {
        match attempt {
            1 => info!("Connecting to {}...", addr),
            6 => info!("Connecting (2nd attempt)..."),
            11 => info!("Connecting (3rd attempt)..."),
            _ => {}
        }

        match TcpStream::connect(addr).await {
            Ok(stream) => {
                info!("Connected.");
                return Ok(stream);
            }
            Err(err) if attempt == MAX_CONNECT_ATTEMPTS => {
                warn!("Connection attempt {} failed: {}", attempt, err);
                return Err(WireError::ConnectFailed {
                    addr: addr.to_string(),
                    attempts: MAX_CONNECT_ATTEMPTS,
                });
            }
            Err(_) => tokio::time::sleep(RETRY_DELAY).await,
        }
    }
    unreachable!("connect loop returns on the final attempt")
}

/// Bind the listener and accept exactly one peer.
///
/// The listener is dropped after the accept; there is no second client.
pub async fn accept_one(bind_addr: &str) -> Result<(TcpStream, SocketAddr), WireError> {
    let listener = TcpListener::bind(bind_addr).await.map_err(|err| {
        // Most likely a second control node holding the port.
        warn!("bind({}) failed: {}", bind_addr, err);
        WireError::from(err)
    })?;

    info!("Waiting for connection request on {}...", bind_addr);
    let (stream, peer) = listener.accept().await?;
    info!("Connected to {}.", peer);
    Ok((stream, peer))
}

/// Split an established connection into its receive and send halves.
pub fn split(stream: TcpStream) -> (FrameReader, FrameWriter) {
    let (rx, tx) = stream.into_split();
    (FrameReader { inner: rx }, FrameWriter { inner: tx })
}

/// Receiving half of the link.
///
/// [`recv`](FrameReader::recv) blocks without a deadline; a half-open peer
/// therefore stalls the owning task until the OS tears the socket down.
pub struct FrameReader {
    inner: OwnedReadHalf,
}

impl FrameReader {
    /// Receive the next frame.
    ///
    /// Returns `Ok(None)` when the peer closed or reset the connection
    /// (normal termination, not an error). Malformed frames surface as
    /// errors with [`WireError::is_malformed_frame`] set; fixed-size
    /// framing keeps the stream aligned, so callers may skip them.
    pub async fn recv(&mut self) -> Result<Option<Frame>, WireError> {
        let mut buf = [0u8; FRAME_LEN];
        match self.inner.read_exact(&mut buf).await {
            Ok(_) => Frame::decode(&buf).map(Some),
            Err(err) => match WireError::from(err) {
                WireError::PeerClosed => Ok(None),
                other => Err(other),
            },
        }
    }
}

/// Sending half of the link.
pub struct FrameWriter {
    inner: OwnedWriteHalf,
}

impl FrameWriter {
    /// Send one frame, blocking at most the 2-second send timeout.
    pub async fn send(&mut self, frame: &Frame) -> Result<(), WireError> {
        let buf = frame.encode()?;
        match tokio::time::timeout(
            Duration::from_millis(SEND_TIMEOUT_MS),
            self.inner.write_all(&buf),
        )
        .await
        {
            Ok(Ok(())) => Ok(()),
            Ok(Err(err)) => Err(err.into()),
            Err(_) => Err(WireError::SendTimeout(SEND_TIMEOUT_MS)),
        }
    }
}
