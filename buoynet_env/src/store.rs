//! The persistence port: durable storage for the sensor fleet.

use crate::PortError;
use async_trait::async_trait;
use buoynet_core::Sensor;
use nalgebra::Vector3;

/// The tick's write set for one sensor: exactly the fields the engine
/// computes, nothing else.
///
/// Thruster speed is deliberately absent. Applying one of these must leave
/// the stored thruster values untouched, so a control command that landed
/// after the tick's load still survives the tick's save.
#[derive(Debug, Clone, PartialEq)]
pub struct KinematicsUpdate {
    /// Storage id of the sensor being patched
    pub id: u64,

    pub position: Vector3<f64>,
    pub water_speed: Vector3<f64>,
    pub temperature: f64,
    pub lost: bool,
}

impl KinematicsUpdate {
    /// Captures the engine-owned fields of an advanced sensor.
    pub fn from_sensor(sensor: &Sensor) -> Self {
        Self {
            id: sensor.id,
            position: sensor.position,
            water_speed: sensor.water_speed,
            temperature: sensor.temperature,
            lost: sensor.lost,
        }
    }

    /// Writes the patch onto a stored record, preserving every field the
    /// engine does not own.
    pub fn apply_to(&self, sensor: &mut Sensor) {
        sensor.position = self.position;
        sensor.water_speed = self.water_speed;
        sensor.temperature = self.temperature;
        sensor.lost = self.lost;
    }
}

/// Durable storage for the sensor fleet.
///
/// Implementations must be safe to call concurrently from the tick loop
/// and the control surface. Per-record operations are atomic; the
/// concurrency contract between the whole-fleet tick write and single
/// record control writes is carried by [`SensorStore::apply_kinematics`].
#[async_trait]
pub trait SensorStore: Send + Sync + 'static {
    /// Loads the whole fleet, ordered by name.
    async fn load_all(&self) -> Result<Vec<Sensor>, PortError>;

    /// Writes whole records in a batch, assigning ids to records whose id
    /// is 0. Used to seed the fleet at bootstrap.
    async fn save_all(&self, sensors: &[Sensor]) -> Result<(), PortError>;

    /// Looks a sensor up by its unique name.
    async fn find_by_name(&self, name: &str) -> Result<Option<Sensor>, PortError>;

    /// Writes one whole record (control path). A record with id 0 is
    /// inserted and assigned an id.
    async fn save_one(&self, sensor: &Sensor) -> Result<(), PortError>;

    /// Applies the tick's batch of field-scoped patches. Each patch is
    /// applied atomically to the *currently stored* record; patches for
    /// ids that no longer exist are skipped.
    async fn apply_kinematics(&self, updates: &[KinematicsUpdate]) -> Result<(), PortError>;
}
