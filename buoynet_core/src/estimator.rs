//! Read-time projection of when a sensor will cross its safe-area boundary.
//!
//! This is computed for observers on every published update and is never
//! persisted. Only the horizontally bounded axes (X and Y) participate,
//! matching the loss check in the engine.

use crate::sensor::Sensor;
use serde::{Deserialize, Serialize};

/// Scale from millimetre ticks to physical seconds (sensor units are mm).
pub const MM_PER_METRE: f64 = 0.001;

/// Estimated time until a sensor leaves its safe area.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "secs", rename_all = "lowercase")]
pub enum TimeUntilLost {
    /// The sensor is not drifting toward a bounded edge
    Never,
    /// Projected wall-clock seconds until the boundary crossing
    Secs(f64),
}

impl TimeUntilLost {
    pub fn is_never(&self) -> bool {
        matches!(self, TimeUntilLost::Never)
    }
}

/// Time-to-boundary for one axis, in ticks: distance to the nearer safe-box
/// edge divided by the signed combined speed. Zero speed never crosses.
fn axis_time_to_edge(position: f64, initial: f64, half_area: f64, speed: f64) -> Option<f64> {
    if speed == 0.0 {
        return None;
    }

    let to_min = (initial - half_area) - position;
    let to_max = (initial + half_area) - position;
    let distance = to_min.abs().min(to_max.abs());

    Some(distance / speed)
}

/// Projects the minimum time until `sensor` crosses the safe-area boundary.
///
/// Distances are evaluated independently on X and Y against the nearer edge,
/// divided by the signed combined speed on that axis, and the minimum across
/// axes is converted to wall seconds via the tick interval and the fixed
/// mm scale. A sensor already lost reports zero; a sensor with zero combined
/// speed on both axes reports [`TimeUntilLost::Never`].
pub fn time_until_lost(sensor: &Sensor, safe_area_size: f64, tick_interval_ms: u64) -> TimeUntilLost {
    if sensor.lost {
        return TimeUntilLost::Secs(0.0);
    }

    let half_area = safe_area_size / 2.0;
    let combined = sensor.combined_speed();

    let time_x = axis_time_to_edge(
        sensor.position.x,
        sensor.initial_position.x,
        half_area,
        combined.x,
    );
    let time_y = axis_time_to_edge(
        sensor.position.y,
        sensor.initial_position.y,
        half_area,
        combined.y,
    );

    let ticks = match (time_x, time_y) {
        (Some(x), Some(y)) => x.min(y),
        (Some(x), None) => x,
        (None, Some(y)) => y,
        (None, None) => return TimeUntilLost::Never,
    };

    TimeUntilLost::Secs(ticks * MM_PER_METRE * tick_interval_ms as f64 / 1000.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Vector3;

    const SAFE_AREA: f64 = 20_000.0;
    const TICK_MS: u64 = 7_000;

    fn drifting(water_x: f64, water_y: f64) -> Sensor {
        Sensor::new(
            "alpha",
            Vector3::zeros(),
            Vector3::new(water_x, water_y, 0.0),
            10.0,
        )
    }

    #[test]
    fn test_never_when_both_axes_still() {
        // Vertical drift alone cannot lose a sensor.
        let sensor = drifting(0.0, 0.0);
        assert!(time_until_lost(&sensor, SAFE_AREA, TICK_MS).is_never());

        let mut diving = drifting(0.0, 0.0);
        diving.water_speed.z = 500.0;
        assert!(time_until_lost(&diving, SAFE_AREA, TICK_MS).is_never());
    }

    #[test]
    fn test_single_axis_projection() {
        // 10000 mm to the eastern edge at 5000 mm/tick = 2 ticks,
        // scaled to seconds: 2 * 0.001 * 7000 / 1000.
        let sensor = drifting(5_000.0, 0.0);

        match time_until_lost(&sensor, SAFE_AREA, TICK_MS) {
            TimeUntilLost::Secs(secs) => assert_relative_eq!(secs, 0.014, epsilon = 1e-9),
            TimeUntilLost::Never => panic!("expected a finite projection"),
        }
    }

    #[test]
    fn test_faster_drift_shortens_the_projection() {
        let slow = drifting(1_000.0, 0.0);
        let fast = drifting(4_000.0, 0.0);

        let (TimeUntilLost::Secs(slow_secs), TimeUntilLost::Secs(fast_secs)) = (
            time_until_lost(&slow, SAFE_AREA, TICK_MS),
            time_until_lost(&fast, SAFE_AREA, TICK_MS),
        ) else {
            panic!("expected finite projections");
        };

        assert!(fast_secs < slow_secs);
    }

    #[test]
    fn test_minimum_across_axes_wins() {
        // Y reaches its edge in half the ticks X does.
        let sensor = drifting(1_000.0, 2_000.0);

        let (TimeUntilLost::Secs(secs), TimeUntilLost::Secs(y_only)) = (
            time_until_lost(&sensor, SAFE_AREA, TICK_MS),
            time_until_lost(&drifting(0.0, 2_000.0), SAFE_AREA, TICK_MS),
        ) else {
            panic!("expected finite projections");
        };

        assert_relative_eq!(secs, y_only, epsilon = 1e-9);
    }

    #[test]
    fn test_thrusters_contribute_to_combined_speed() {
        let mut sensor = drifting(5_000.0, 0.0);
        sensor.thruster_speed.x = -5_000.0;

        // Thrusters exactly cancel the current: the sensor holds station.
        assert!(time_until_lost(&sensor, SAFE_AREA, TICK_MS).is_never());
    }

    #[test]
    fn test_lost_sensor_reports_zero() {
        let mut sensor = drifting(5_000.0, 0.0);
        sensor.lost = true;

        assert_eq!(
            time_until_lost(&sensor, SAFE_AREA, TICK_MS),
            TimeUntilLost::Secs(0.0)
        );
    }

    #[test]
    fn test_nearer_edge_is_used() {
        // Offset toward the eastern edge: 4000 mm remain instead of 10000.
        let mut sensor = drifting(2_000.0, 0.0);
        sensor.position.x = 6_000.0;
        sensor.initial_position = Vector3::zeros();

        match time_until_lost(&sensor, SAFE_AREA, TICK_MS) {
            TimeUntilLost::Secs(secs) => {
                assert_relative_eq!(secs, 2.0 * MM_PER_METRE * TICK_MS as f64 / 1000.0, epsilon = 1e-9)
            }
            TimeUntilLost::Never => panic!("expected a finite projection"),
        }
    }
}
