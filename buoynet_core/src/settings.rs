//! Environment-driven simulation settings.
//!
//! Every knob has a documented default so the simulator runs out of the box;
//! an unparsable value is a fatal startup error rather than a silent
//! fallback.

use crate::engine::SafeZone;
use thiserror::Error;

/// A recognized environment variable held an unparsable value.
#[derive(Debug, Error)]
#[error("invalid value for {key}: {value:?}")]
pub struct SettingsError {
    pub key: &'static str,
    pub value: String,
}

/// Runtime configuration for the fleet simulation.
#[derive(Debug, Clone, PartialEq)]
pub struct SimSettings {
    /// Side length of each sensor's safe box, millimetres (`SAFE_AREA_SIZE`)
    pub safe_area_size: f64,

    /// Wall-clock period between simulation ticks (`TICK_INTERVAL`)
    pub tick_interval_ms: u64,

    /// Initial placement bounds per axis (`SENSOR_POSITION_MIN/MAX`)
    pub position_min: f64,
    pub position_max: f64,

    /// Initial water-speed bounds per axis (`THRUSTER_SPEED_MIN/MAX`)
    pub water_speed_min: f64,
    pub water_speed_max: f64,

    /// Initial temperature bounds (`WATER_TEMPERATURE_MIN/MAX`)
    pub temperature_min: f64,
    pub temperature_max: f64,

    /// Sensor bounding-box extents used in the loss check (`SENSOR_SIZE_X/Y`)
    pub sensor_size_x: f64,
    pub sensor_size_y: f64,
}

impl Default for SimSettings {
    fn default() -> Self {
        Self {
            safe_area_size: 20_000.0,
            tick_interval_ms: 7_000,
            position_min: 0.0,
            position_max: 1_000.0,
            water_speed_min: -100.0,
            water_speed_max: 100.0,
            temperature_min: 4.0,
            temperature_max: 20.0,
            sensor_size_x: 100.0,
            sensor_size_y: 100.0,
        }
    }
}

fn read_var<T: std::str::FromStr>(key: &'static str, default: T) -> Result<T, SettingsError> {
    match std::env::var(key) {
        Ok(raw) => raw.parse().map_err(|_| SettingsError { key, value: raw }),
        Err(_) => Ok(default),
    }
}

impl SimSettings {
    /// Reads the settings from the process environment, falling back to the
    /// defaults for unset keys.
    pub fn from_env() -> Result<Self, SettingsError> {
        let defaults = Self::default();
        Ok(Self {
            safe_area_size: read_var("SAFE_AREA_SIZE", defaults.safe_area_size)?,
            tick_interval_ms: read_var("TICK_INTERVAL", defaults.tick_interval_ms)?,
            position_min: read_var("SENSOR_POSITION_MIN", defaults.position_min)?,
            position_max: read_var("SENSOR_POSITION_MAX", defaults.position_max)?,
            water_speed_min: read_var("THRUSTER_SPEED_MIN", defaults.water_speed_min)?,
            water_speed_max: read_var("THRUSTER_SPEED_MAX", defaults.water_speed_max)?,
            temperature_min: read_var("WATER_TEMPERATURE_MIN", defaults.temperature_min)?,
            temperature_max: read_var("WATER_TEMPERATURE_MAX", defaults.temperature_max)?,
            sensor_size_x: read_var("SENSOR_SIZE_X", defaults.sensor_size_x)?,
            sensor_size_y: read_var("SENSOR_SIZE_Y", defaults.sensor_size_y)?,
        })
    }

    /// The loss-check geometry these settings describe.
    pub fn safe_zone(&self) -> SafeZone {
        SafeZone {
            area_size: self.safe_area_size,
            sensor_size_x: self.sensor_size_x,
            sensor_size_y: self.sensor_size_y,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = SimSettings::default();

        assert_eq!(settings.safe_area_size, 20_000.0);
        assert_eq!(settings.tick_interval_ms, 7_000);
        assert_eq!(settings.safe_zone().sensor_size_x, 100.0);
    }

    #[test]
    fn test_from_env_overrides_and_rejects_garbage() {
        // Environment access is process-global; exercise both paths in one
        // test to avoid interleaving with parallel tests.
        std::env::set_var("SAFE_AREA_SIZE", "48000");
        std::env::set_var("TICK_INTERVAL", "250");

        let settings = SimSettings::from_env().unwrap();
        assert_eq!(settings.safe_area_size, 48_000.0);
        assert_eq!(settings.tick_interval_ms, 250);
        assert_eq!(settings.position_min, SimSettings::default().position_min);

        std::env::set_var("TICK_INTERVAL", "soon");
        let err = SimSettings::from_env().unwrap_err();
        assert_eq!(err.key, "TICK_INTERVAL");

        std::env::remove_var("SAFE_AREA_SIZE");
        std::env::remove_var("TICK_INTERVAL");
    }
}
