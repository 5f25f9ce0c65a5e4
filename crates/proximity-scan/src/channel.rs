//! Per-Sensor Channel State
//!
//! Each sensor tracks the running maximum and minimum distance it has ever
//! observed while triggered, and maps the current distance linearly into a
//! stimulation period within the configured bounds.

use crate::config::ScanConfig;

/// Placeholder period for sensors that produced no reading this iteration;
/// high enough to never win a minimum against a computed period.
pub const IDLE_PERIOD_MS: u64 = 10_000;

/// Seed for the running maximum, below any real distance.
const SEED_MAX_MM: i64 = -1;

/// Seed for the running minimum: distance when the robot is right in front
/// of a wall.
const SEED_MIN_MM: i64 = 40;

/// Distance statistics and current period for one sensor.
#[derive(Debug, Clone)]
pub struct SensorChannel {
    max_seen_mm: i64,
    min_seen_mm: i64,
    period_ms: u64,
}

impl Default for SensorChannel {
    fn default() -> Self {
        Self {
            max_seen_mm: SEED_MAX_MM,
            min_seen_mm: SEED_MIN_MM,
            period_ms: IDLE_PERIOD_MS,
        }
    }
}

impl SensorChannel {
    /// Reset the period to the idle placeholder at the top of a scan pass.
    pub fn begin_pass(&mut self) {
        self.period_ms = IDLE_PERIOD_MS;
    }

    /// Fold in a triggered reading and compute this pass's period.
    ///
    /// The mapping is linear between the running extremes: the running
    /// minimum distance maps to `min_period_ms`, the running maximum to
    /// `max_period_ms`, clamped at both ends. While the extremes coincide
    /// there is no usable range yet, so the maximum period is emitted.
    pub fn observe(&mut self, distance_mm: u32, config: &ScanConfig) -> u64 {
        let point = distance_mm as i64;
        if point > self.max_seen_mm {
            self.max_seen_mm = point;
        }
        if point < self.min_seen_mm {
            self.min_seen_mm = point;
        }

        let (min_p, max_p) = (config.min_period_ms as i64, config.max_period_ms as i64);
        self.period_ms = if self.max_seen_mm == self.min_seen_mm {
            max_p as u64
        } else {
            let period = ((max_p - min_p) * point + min_p * self.max_seen_mm
                - max_p * self.min_seen_mm)
                / (self.max_seen_mm - self.min_seen_mm);
            period.clamp(min_p, max_p) as u64
        };
        self.period_ms
    }

    /// Period computed in the current pass, or the idle placeholder.
    pub fn period_ms(&self) -> u64 {
        self.period_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_degenerate_range_emits_max_period() {
        let config = ScanConfig::default();
        let mut channel = SensorChannel::default();
        // First reading collapses both extremes onto the same value.
        assert_eq!(channel.observe(30, &config), 2000);
    }

    #[test]
    fn test_linear_mapping_between_extremes() {
        let config = ScanConfig::default();
        let mut channel = SensorChannel::default();
        channel.observe(30, &config);
        // Range is now [10, 30].
        assert_eq!(channel.observe(10, &config), 500);
        assert_eq!(channel.observe(30, &config), 2000);
        assert_eq!(channel.observe(20, &config), 1250);
    }

    #[test]
    fn test_period_is_clamped_at_both_ends() {
        let config = ScanConfig::default();
        let mut channel = SensorChannel::default();
        channel.observe(30, &config);
        channel.observe(10, &config);
        // 50 extends the running max; the raw mapping for the new top of
        // range lands exactly on the cap.
        assert_eq!(channel.observe(50, &config), 2000);
        // A new running minimum maps to the floor.
        assert_eq!(channel.observe(9, &config), 500);
    }

    #[test]
    fn test_begin_pass_restores_idle_period() {
        let config = ScanConfig::default();
        let mut channel = SensorChannel::default();
        channel.observe(25, &config);
        assert_ne!(channel.period_ms(), IDLE_PERIOD_MS);
        channel.begin_pass();
        assert_eq!(channel.period_ms(), IDLE_PERIOD_MS);
    }
}
