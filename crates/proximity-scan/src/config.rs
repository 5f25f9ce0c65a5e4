//! Scanner configuration

use serde::{Deserialize, Serialize};

/// How sensed distance maps onto the stimulation period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CodingPattern {
    /// Period varies linearly with distance between the configured bounds
    #[default]
    Proportional,
    /// Fixed period regardless of distance
    Binary,
}

/// Scanner configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Active coding pattern
    pub coding: CodingPattern,

    /// Minimum stimulation period, proportional coding (ms)
    pub min_period_ms: u64,

    /// Maximum stimulation period, proportional coding (ms)
    pub max_period_ms: u64,

    /// Fixed stimulation period, binary coding (ms)
    pub binary_period_ms: u64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            coding: CodingPattern::Proportional,
            min_period_ms: 500,
            max_period_ms: 2000,
            binary_period_ms: 1000,
        }
    }
}

impl ScanConfig {
    pub fn is_binary(&self) -> bool {
        self.coding == CodingPattern::Binary
    }
}
