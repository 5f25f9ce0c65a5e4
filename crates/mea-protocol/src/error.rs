//! Wire Protocol Error Types

use thiserror::Error;

/// Errors that can occur on the link between the two nodes
#[derive(Debug, Error)]
pub enum WireError {
    /// Connection could not be established within the retry budget
    #[error("No connection has been made to {addr} after {attempts} attempts")]
    ConnectFailed { addr: String, attempts: u32 },

    /// The remote peer closed or reset the connection
    #[error("Remote peer has closed the connection")]
    PeerClosed,

    /// Send did not complete within the configured timeout
    #[error("Send timed out after {0}ms")]
    SendTimeout(u64),

    /// Any other socket error, with the platform error code when available
    #[error("Transport error (code {code:?}): {source}")]
    Transport {
        code: Option<i32>,
        source: std::io::Error,
    },

    /// Received frame carries a tag outside the protocol
    #[error("Unknown frame tag 0x{0:02X}")]
    UnknownTag(u8),

    /// Received frame's value field is not three ASCII digits
    #[error("Malformed digit field {0:?}")]
    BadDigits([u8; 3]),

    /// Received frame is missing its NUL terminator
    #[error("Frame missing NUL terminator, got 0x{0:02X}")]
    BadTerminator(u8),

    /// A rate of 1000 or more cannot be represented in the 3-digit field
    #[error("Rate {0} does not fit the 3-digit wire field (max {max})", max = crate::MAX_RATE)]
    RateOutOfRange(u32),
}

impl WireError {
    /// Whether this error came from decoding a single bad frame.
    ///
    /// Fixed-size framing keeps the stream aligned, so a receive loop may
    /// log and skip these rather than tear the link down.
    pub fn is_malformed_frame(&self) -> bool {
        matches!(
            self,
            WireError::UnknownTag(_) | WireError::BadDigits(_) | WireError::BadTerminator(_)
        )
    }

    /// Whether the peer ended the connection (normal termination trigger,
    /// not a fault)
    pub fn is_peer_closed(&self) -> bool {
        matches!(self, WireError::PeerClosed)
    }
}

impl From<std::io::Error> for WireError {
    fn from(err: std::io::Error) -> Self {
        use std::io::ErrorKind;
        match err.kind() {
            ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::BrokenPipe
            | ErrorKind::UnexpectedEof => WireError::PeerClosed,
            _ => WireError::Transport {
                code: err.raw_os_error(),
                source: err,
            },
        }
    }
}
