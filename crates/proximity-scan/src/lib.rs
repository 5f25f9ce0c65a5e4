//! Obstacle Sensor Scanning
//!
//! Polls the robot's five directional proximity sensors, classifies the
//! trigger pattern into an obstacle zone, and queues stimulation events for
//! the wire link. The stimulation period is either proportional to the
//! sensed distance (closer obstacle, faster stimulation) or a fixed binary
//! period.

mod channel;
mod config;
mod scanner;
mod zone;

pub use channel::{SensorChannel, IDLE_PERIOD_MS};
pub use config::{CodingPattern, ScanConfig};
pub use scanner::{ObstacleScanner, SENSOR_COUNT};
pub use zone::{classify, Zone};
