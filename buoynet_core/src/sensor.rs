//! The sensor data model shared by the engine, the ports and the wire.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One drifting underwater sensor buoy.
///
/// All spatial quantities are in millimetres (speeds in mm per tick).
/// `initial_position` is fixed at creation and defines the centre of the
/// sensor's safe volume; `position` only ever changes by accumulating
/// `water_speed + thruster_speed`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sensor {
    /// Storage-assigned surrogate key (0 = not yet persisted)
    pub id: u64,

    /// Unique, human-assigned name, stable for the sensor's lifetime
    pub name: String,

    /// Current location [x, y, z]
    pub position: Vector3<f64>,

    /// Ambient current drift, mutates stochastically each tick
    pub water_speed: Vector3<f64>,

    /// Operator-controlled speed, mutated only via control commands
    pub thruster_speed: Vector3<f64>,

    /// Centre of the permitted safe volume, immutable after creation
    pub initial_position: Vector3<f64>,

    /// Water temperature at the sensor, drifts stochastically each tick
    pub temperature: f64,

    /// Terminal loss flag; once true it never reverts and the engine
    /// stops advancing this sensor
    pub lost: bool,
}

impl Sensor {
    /// Creates a fresh, unpersisted sensor at the given position.
    ///
    /// `initial_position` is pinned to the starting position and thrusters
    /// start at rest.
    pub fn new(name: impl Into<String>, position: Vector3<f64>, water_speed: Vector3<f64>, temperature: f64) -> Self {
        Self {
            id: 0,
            name: name.into(),
            position,
            water_speed,
            thruster_speed: Vector3::zeros(),
            initial_position: position,
            temperature,
            lost: false,
        }
    }

    /// Net drift rate on all axes: ambient current plus thrusters.
    pub fn combined_speed(&self) -> Vector3<f64> {
        self.water_speed + self.thruster_speed
    }
}

/// A spatial axis, used to address individual thruster components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    /// Reads this axis's component of a vector.
    pub fn of(&self, v: &Vector3<f64>) -> f64 {
        match self {
            Axis::X => v.x,
            Axis::Y => v.y,
            Axis::Z => v.z,
        }
    }

    /// Writes this axis's component of a vector, leaving the others untouched.
    pub fn set(&self, v: &mut Vector3<f64>, value: f64) {
        match self {
            Axis::X => v.x = value,
            Axis::Y => v.y = value,
            Axis::Z => v.z = value,
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::X => write!(f, "x"),
            Axis::Y => write!(f, "y"),
            Axis::Z => write!(f, "z"),
        }
    }
}

impl FromStr for Axis {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "x" | "X" => Ok(Axis::X),
            "y" | "Y" => Ok(Axis::Y),
            "z" | "Z" => Ok(Axis::Z),
            other => Err(format!("unknown axis: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_sensor_pins_initial_position() {
        let sensor = Sensor::new("alpha", Vector3::new(100.0, 200.0, 300.0), Vector3::zeros(), 12.0);

        assert_eq!(sensor.initial_position, sensor.position);
        assert_eq!(sensor.thruster_speed, Vector3::zeros());
        assert_eq!(sensor.id, 0);
        assert!(!sensor.lost);
    }

    #[test]
    fn test_combined_speed_sums_current_and_thrusters() {
        let mut sensor = Sensor::new("beta", Vector3::zeros(), Vector3::new(5.0, -2.0, 1.0), 10.0);
        sensor.thruster_speed = Vector3::new(1.0, 2.0, 3.0);

        assert_eq!(sensor.combined_speed(), Vector3::new(6.0, 0.0, 4.0));
    }

    #[test]
    fn test_axis_set_leaves_other_components() {
        let mut v = Vector3::new(1.0, 2.0, 3.0);
        Axis::Y.set(&mut v, 9.0);

        assert_eq!(v, Vector3::new(1.0, 9.0, 3.0));
        assert_eq!(Axis::Y.of(&v), 9.0);
    }

    #[test]
    fn test_axis_parse() {
        assert_eq!("x".parse::<Axis>().unwrap(), Axis::X);
        assert_eq!("Z".parse::<Axis>().unwrap(), Axis::Z);
        assert!("w".parse::<Axis>().is_err());
    }
}
