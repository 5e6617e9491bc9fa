//! The control surface: thruster-speed commands against individual sensors.

use buoynet_core::Sensor;
use buoynet_env::{PortError, SensorStore};
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// A thruster-speed update for one sensor, in mm/tick per axis.
///
/// Absent axes are left untouched: a command carrying only `x` must not
/// reset `y` or `z`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct ThrusterCommand {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub z: Option<f64>,
}

impl ThrusterCommand {
    /// A command for a single axis.
    pub fn axis(axis: buoynet_core::Axis, value: f64) -> Self {
        let mut cmd = Self::default();
        match axis {
            buoynet_core::Axis::X => cmd.x = Some(value),
            buoynet_core::Axis::Y => cmd.y = Some(value),
            buoynet_core::Axis::Z => cmd.z = Some(value),
        }
        cmd
    }

    fn validate(&self) -> Result<(), ControlError> {
        if self.x.is_none() && self.y.is_none() && self.z.is_none() {
            return Err(ControlError::Validation("no thruster axes given".into()));
        }
        for value in [self.x, self.y, self.z].into_iter().flatten() {
            if !value.is_finite() {
                return Err(ControlError::Validation(format!(
                    "thruster speed must be finite, got {value}"
                )));
            }
        }
        Ok(())
    }
}

/// Why a control command was rejected.
#[derive(Debug, Error)]
pub enum ControlError {
    /// Malformed command payload; nothing was applied
    #[error("invalid command: {0}")]
    Validation(String),

    /// No sensor with the given name exists
    #[error("sensor not found: {0}")]
    NotFound(String),

    /// The store failed while looking up or saving the sensor
    #[error(transparent)]
    Store(#[from] PortError),
}

/// Applies operator commands to single sensors, outside the tick batch.
///
/// Commands persist immediately via the store's single-record write; they
/// never wait for the next tick and never touch engine-owned fields.
pub struct ControlInterface<S> {
    store: Arc<S>,
}

impl<S: SensorStore> ControlInterface<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Sets the given thruster axes on the named sensor.
    ///
    /// Returns the updated sensor as the acknowledgment. An unknown name
    /// is an explicit [`ControlError::NotFound`], never a silent no-op.
    pub async fn set_thruster_speed(
        &self,
        name: &str,
        command: ThrusterCommand,
    ) -> Result<Sensor, ControlError> {
        command.validate()?;

        let mut sensor = self
            .store
            .find_by_name(name)
            .await?
            .ok_or_else(|| ControlError::NotFound(name.to_string()))?;

        if let Some(x) = command.x {
            sensor.thruster_speed.x = x;
        }
        if let Some(y) = command.y {
            sensor.thruster_speed.y = y;
        }
        if let Some(z) = command.z {
            sensor.thruster_speed.z = z;
        }

        self.store.save_one(&sensor).await?;
        info!(
            "Thruster update applied to {}: [{}, {}, {}]",
            sensor.name, sensor.thruster_speed.x, sensor.thruster_speed.y, sensor.thruster_speed.z
        );
        Ok(sensor)
    }
}
