//! The simulation engine: one state transition per sensor per tick.
//!
//! `advance` is a total function over the sensor state. It performs no I/O
//! and never panics; persistence and fan-out are the caller's concern.

use crate::sensor::Sensor;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// The permitted safe volume around a sensor's initial position.
///
/// An axis-aligned box of side `area_size` centred on `initial_position`
/// in X and Y. Depth is not bounded: a sensor is only ever lost
/// horizontally.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SafeZone {
    /// Side length of the safe box, millimetres
    pub area_size: f64,

    /// Sensor bounding-box extent along X, millimetres
    pub sensor_size_x: f64,

    /// Sensor bounding-box extent along Y, millimetres
    pub sensor_size_y: f64,
}

impl SafeZone {
    /// Returns true while the sensor's own footprint is fully inside the
    /// safe box on both bounded axes.
    pub fn contains(&self, sensor: &Sensor) -> bool {
        let half_area = self.area_size / 2.0;
        let half_x = self.sensor_size_x / 2.0;
        let half_y = self.sensor_size_y / 2.0;

        let min_x = sensor.initial_position.x - half_area;
        let max_x = sensor.initial_position.x + half_area;
        let min_y = sensor.initial_position.y - half_area;
        let max_y = sensor.initial_position.y + half_area;

        sensor.position.x - half_x >= min_x
            && sensor.position.x + half_x <= max_x
            && sensor.position.y - half_y >= min_y
            && sensor.position.y + half_y <= max_y
    }
}

/// Closed interval for one stochastic increment. Both signs are allowed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DriftBounds {
    pub min: f64,
    pub max: f64,
}

impl DriftBounds {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// A degenerate interval that always samples zero.
    pub const fn zero() -> Self {
        Self { min: 0.0, max: 0.0 }
    }

    fn sample(&self, rng: &mut impl Rng) -> f64 {
        if self.min >= self.max {
            return self.min;
        }
        rng.gen_range(self.min..=self.max)
    }
}

/// Tunable drift distributions for the engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    /// Per-tick increment bounds applied to each water-speed axis, mm/tick
    pub water_speed_drift: DriftBounds,

    /// Per-tick increment bounds applied to the temperature, °C/tick
    pub temperature_drift: DriftBounds,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            water_speed_drift: DriftBounds::new(-2.0, 2.0),
            temperature_drift: DriftBounds::new(-0.5, 0.5),
        }
    }
}

impl EngineConfig {
    /// Configuration with all drift disabled, for deterministic trajectories.
    pub const fn still() -> Self {
        Self {
            water_speed_drift: DriftBounds::zero(),
            temperature_drift: DriftBounds::zero(),
        }
    }
}

/// Advances sensors tick by tick.
///
/// Owns a seeded RNG so that a given seed always produces the same drift
/// sequence, tick after tick.
pub struct SimulationEngine {
    config: EngineConfig,
    rng: ChaCha8Rng,
}

impl SimulationEngine {
    /// Creates an engine with a fixed seed (reproducible runs and tests).
    pub fn new(config: EngineConfig, seed: u64) -> Self {
        Self {
            config,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Creates an engine seeded from OS entropy (production runs).
    pub fn from_entropy(config: EngineConfig) -> Self {
        Self {
            config,
            rng: ChaCha8Rng::from_entropy(),
        }
    }

    /// Applies one simulation step to a single sensor.
    ///
    /// 1. A lost sensor is terminal: nothing changes.
    /// 2. Euler position step: `position += water_speed + thruster_speed`.
    /// 3. Loss check against `zone`; a sensor that left the safe box is
    ///    marked lost and receives no further updates this tick.
    /// 4. Otherwise each water-speed axis and the temperature receive a
    ///    bounded random increment.
    pub fn advance(&mut self, sensor: &mut Sensor, zone: &SafeZone) {
        if sensor.lost {
            return;
        }

        sensor.position += sensor.combined_speed();

        if !zone.contains(sensor) {
            sensor.lost = true;
            return;
        }

        sensor.water_speed.x += self.config.water_speed_drift.sample(&mut self.rng);
        sensor.water_speed.y += self.config.water_speed_drift.sample(&mut self.rng);
        sensor.water_speed.z += self.config.water_speed_drift.sample(&mut self.rng);
        sensor.temperature += self.config.temperature_drift.sample(&mut self.rng);
    }
}
