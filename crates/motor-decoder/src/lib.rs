//! Speed Decoding
//!
//! Translates the published per-second firing rates into wheel velocities.
//! Two selectable policies: discrete turn commands, and the competitive
//! Winner-Takes-All dynamic in which the currently faster wheel keeps
//! following its rate-scaled target while the slower wheel is driven to a
//! fixed brake speed.

mod config;
mod decoder;
mod discrete;
mod wta;

pub use config::{DecoderConfig, DecodingPolicy};
pub use decoder::SpeedDecoder;
pub use discrete::{plan, DriveStep, TURN_HOLD_MS};
pub use wta::WtaState;
