//! MEA Wire Protocol Implementation
//!
//! This crate provides the fixed-frame TCP protocol spoken between the
//! signal node (MEA side, client) and the control node (robot side, server).
//! Frames are 5 ASCII bytes: one tag, a zero-padded 3-digit value, and a
//! NUL terminator. The protocol has exactly two peers and five frame kinds.

mod error;
mod frame;
mod link;

pub use error::WireError;
pub use frame::{Frame, FRAME_LEN, MAX_RATE};
pub use link::{accept_one, connect, split, FrameReader, FrameWriter, DEFAULT_PORT};
