//! Robot Simulation Capability Interface
//!
//! The control node consumes the simulator through the [`RobotInterface`]
//! capability: object-handle lookup, target-velocity commands, proximity
//! reads, and a connection-status probe. The transport to an external
//! physics simulator is intentionally not part of this system; the crate
//! ships [`VirtualRobot`], an in-process deterministic implementation of
//! the same surface, used by the control node and by tests.

mod robot;

pub use robot::VirtualRobot;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Simulation error types
#[derive(Debug, Clone, Error)]
pub enum SimError {
    /// Simulation connection has been closed
    #[error("Simulation is not connected")]
    NotConnected,

    /// A sensor read did not complete
    #[error("Sensor read failed: {0}")]
    ReadFailed(String),
}

/// Opaque handle to a named scene object (motor or sensor)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectHandle(pub u32);

/// One proximity sensor sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProximityReading {
    /// Whether the sensor currently detects an obstacle
    pub triggered: bool,
    /// Distance to the detected point in millimetres (meaningful only
    /// when triggered)
    pub distance_mm: u32,
}

impl ProximityReading {
    /// No obstacle in range.
    pub fn clear() -> Self {
        Self {
            triggered: false,
            distance_mm: 0,
        }
    }

    /// Obstacle detected at the given distance.
    pub fn obstacle(distance_mm: u32) -> Self {
        Self {
            triggered: true,
            distance_mm,
        }
    }
}

/// Capability contract of the actuator/sensor collaborator.
pub trait RobotInterface: Send + Sync {
    /// Resolve a scene object by name.
    fn object_handle(&self, name: &str) -> Result<ObjectHandle, SimError>;

    /// Command a joint's target velocity.
    fn set_target_velocity(&self, handle: ObjectHandle, velocity: f32) -> Result<(), SimError>;

    /// Read a proximity sensor.
    fn read_proximity(&self, handle: ObjectHandle) -> Result<ProximityReading, SimError>;

    /// Whether the simulation connection is still up.
    fn connected(&self) -> bool;

    /// Ask the simulator to stop the running simulation.
    fn stop_simulation(&self) -> Result<(), SimError>;
}
