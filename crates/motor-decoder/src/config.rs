//! Decoder configuration

use serde::{Deserialize, Serialize};

/// Selectable decoding policy
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecodingPolicy {
    /// Discrete turn commands (left/right) with a fixed hold window
    Discrete,
    /// Winner-Takes-All with per-wheel rate coefficients
    WinnerTakesAll { c_left: f32, c_right: f32 },
}

/// Decoder configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DecoderConfig {
    /// Active policy
    pub policy: DecodingPolicy,

    /// Maximum angular speed w0 (rad/s); also the straight-ahead speed
    pub max_speed: f32,

    /// Brake/reverse constant w_b (rad/s) applied to the losing wheel
    pub brake_speed: f32,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            policy: DecodingPolicy::Discrete,
            max_speed: 10.0,
            brake_speed: 1.0,
        }
    }
}

impl DecoderConfig {
    /// Default Winner-Takes-All setup with the standard coefficients.
    pub fn winner_takes_all() -> Self {
        Self {
            policy: DecodingPolicy::WinnerTakesAll {
                c_left: 5.0,
                c_right: 5.0,
            },
            ..Self::default()
        }
    }
}
