//! In-Process Virtual Robot
//!
//! Deterministic stand-in for the external simulator, mirroring the shape
//! of a remote-API client: handles are allocated per object name, velocity
//! commands are recorded, and proximity reads pop from per-sensor scripts
//! (an exhausted script reads as "no obstacle").

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, PoisonError};

use tracing::{debug, info};

use crate::{ObjectHandle, ProximityReading, RobotInterface, SimError};

#[derive(Default)]
struct World {
    handles: HashMap<String, ObjectHandle>,
    next_handle: u32,
    velocities: Vec<(ObjectHandle, f32)>,
    scripts: HashMap<ObjectHandle, VecDeque<Result<ProximityReading, SimError>>>,
    connected: bool,
    stop_requests: u32,
}

/// Virtual robot implementing the full [`RobotInterface`] surface.
pub struct VirtualRobot {
    world: Mutex<World>,
}

impl VirtualRobot {
    /// Attach to the simulation on the given port.
    ///
    /// The port is accepted for interface parity with a remote simulator;
    /// the virtual robot always connects on the first attempt.
    pub fn connect(port: u16) -> Self {
        info!("Connected with simulation (port {}).", port);
        Self {
            world: Mutex::new(World {
                connected: true,
                ..World::default()
            }),
        }
    }

    fn world(&self) -> std::sync::MutexGuard<'_, World> {
        self.world.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue proximity readings for one sensor; reads consume them in order.
    pub fn script_readings(
        &self,
        handle: ObjectHandle,
        readings: impl IntoIterator<Item = Result<ProximityReading, SimError>>,
    ) {
        self.world()
            .scripts
            .entry(handle)
            .or_default()
            .extend(readings);
    }

    /// Every velocity command issued to the given joint, oldest first.
    pub fn commands_for(&self, handle: ObjectHandle) -> Vec<f32> {
        self.world()
            .velocities
            .iter()
            .filter(|(h, _)| *h == handle)
            .map(|(_, v)| *v)
            .collect()
    }

    /// Most recent velocity command for the given joint.
    pub fn last_velocity(&self, handle: ObjectHandle) -> Option<f32> {
        self.commands_for(handle).last().copied()
    }

    /// How many times the simulation stop command was issued.
    pub fn stop_requests(&self) -> u32 {
        self.world().stop_requests
    }

    /// Drop the simulation connection.
    pub fn disconnect(&self) {
        self.world().connected = false;
        info!("Simulation connection closed.");
    }
}

impl RobotInterface for VirtualRobot {
    fn object_handle(&self, name: &str) -> Result<ObjectHandle, SimError> {
        let mut world = self.world();
        if !world.connected {
            return Err(SimError::NotConnected);
        }
        if let Some(handle) = world.handles.get(name) {
            return Ok(*handle);
        }
        let handle = ObjectHandle(world.next_handle);
        world.next_handle += 1;
        world.handles.insert(name.to_string(), handle);
        debug!("Resolved object {:?} -> {:?}", name, handle);
        Ok(handle)
    }

    fn set_target_velocity(&self, handle: ObjectHandle, velocity: f32) -> Result<(), SimError> {
        let mut world = self.world();
        if !world.connected {
            return Err(SimError::NotConnected);
        }
        world.velocities.push((handle, velocity));
        Ok(())
    }

    fn read_proximity(&self, handle: ObjectHandle) -> Result<ProximityReading, SimError> {
        let mut world = self.world();
        if !world.connected {
            return Err(SimError::NotConnected);
        }
        match world.scripts.get_mut(&handle).and_then(VecDeque::pop_front) {
            Some(reading) => reading,
            None => Ok(ProximityReading::clear()),
        }
    }

    fn connected(&self) -> bool {
        self.world().connected
    }

    fn stop_simulation(&self) -> Result<(), SimError> {
        let mut world = self.world();
        world.stop_requests += 1;
        info!("Simulation stop requested.");
        Ok(())
    }
}
