//! The broadcast port: fan the latest fleet state out to observers.

use crate::PortError;
use async_trait::async_trait;
use buoynet_core::{Sensor, TimeUntilLost};
use serde::Serialize;

/// Event name carried by every fleet update.
pub const SENSORS_UPDATE_EVENT: &str = "sensors-update";

/// One sensor as observers see it: the persisted state plus the derived
/// loss projection, recomputed at publish time and never stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorObservation {
    #[serde(flatten)]
    pub sensor: Sensor,

    /// Projected time until this sensor leaves its safe area
    pub time_until_lost: TimeUntilLost,
}

/// The full fleet snapshot published after each tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FleetUpdate {
    /// Event name (always [`SENSORS_UPDATE_EVENT`])
    pub event: &'static str,

    /// Tick that produced this snapshot
    pub tick: u64,

    /// The whole fleet, ordered by name
    pub sensors: Vec<SensorObservation>,
}

impl FleetUpdate {
    pub fn new(tick: u64, sensors: Vec<SensorObservation>) -> Self {
        Self {
            event: SENSORS_UPDATE_EVENT,
            tick,
            sensors,
        }
    }
}

/// Transport that delivers fleet updates to every subscribed observer.
///
/// Delivery is best-effort and at-most-once: a failed or missed update is
/// simply absent, never retransmitted. Updates are published in tick order.
#[async_trait]
pub trait SensorBroadcast: Send + Sync + 'static {
    /// Pushes an update to all current subscribers.
    async fn publish(&self, update: &FleetUpdate) -> Result<(), PortError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;

    #[test]
    fn test_fleet_update_wire_shape() {
        let sensor = Sensor::new("alpha", Vector3::zeros(), Vector3::zeros(), 10.0);
        let update = FleetUpdate::new(
            3,
            vec![SensorObservation {
                sensor,
                time_until_lost: TimeUntilLost::Never,
            }],
        );

        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json["event"], SENSORS_UPDATE_EVENT);
        assert_eq!(json["tick"], 3);
        assert_eq!(json["sensors"][0]["name"], "alpha");
        assert_eq!(json["sensors"][0]["time_until_lost"]["kind"], "never");
    }
}
