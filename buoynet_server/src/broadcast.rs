//! Channel-backed broadcaster implementing the broadcast port.

use async_trait::async_trait;
use buoynet_env::{FleetUpdate, PortError, SensorBroadcast};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Fan-out of fleet updates over a tokio broadcast channel.
///
/// Observers call [`ChannelBroadcast::subscribe`] and read updates off the
/// returned receiver; dropping the receiver unsubscribes with no cleanup
/// needed on this side. A receiver that falls more than `capacity` updates
/// behind observes a lag and simply misses those updates; delivery is
/// at-most-once, in tick order.
pub struct ChannelBroadcast {
    tx: broadcast::Sender<Arc<FleetUpdate>>,
}

impl ChannelBroadcast {
    /// Creates a broadcaster buffering up to `capacity` updates per
    /// subscriber.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Registers a new observer.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<FleetUpdate>> {
        self.tx.subscribe()
    }

    /// Number of currently subscribed observers.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

#[async_trait]
impl SensorBroadcast for ChannelBroadcast {
    async fn publish(&self, update: &FleetUpdate) -> Result<(), PortError> {
        // send only errors when there are no receivers; an unobserved
        // fleet is not a failure.
        let _ = self.tx.send(Arc::new(update.clone()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use buoynet_env::SensorObservation;
    use buoynet_core::{Sensor, TimeUntilLost};
    use nalgebra::Vector3;

    fn update(tick: u64) -> FleetUpdate {
        FleetUpdate::new(
            tick,
            vec![SensorObservation {
                sensor: Sensor::new("alpha", Vector3::zeros(), Vector3::zeros(), 10.0),
                time_until_lost: TimeUntilLost::Never,
            }],
        )
    }

    #[tokio::test]
    async fn test_subscribers_receive_updates_in_tick_order() {
        let broadcaster = ChannelBroadcast::new(8);
        let mut rx = broadcaster.subscribe();

        broadcaster.publish(&update(1)).await.unwrap();
        broadcaster.publish(&update(2)).await.unwrap();

        assert_eq!(rx.recv().await.unwrap().tick, 1);
        assert_eq!(rx.recv().await.unwrap().tick, 2);
    }

    #[tokio::test]
    async fn test_publish_without_observers_is_ok() {
        let broadcaster = ChannelBroadcast::new(8);
        assert_eq!(broadcaster.subscriber_count(), 0);

        broadcaster.publish(&update(1)).await.unwrap();
    }

    #[tokio::test]
    async fn test_dropping_a_receiver_unsubscribes() {
        let broadcaster = ChannelBroadcast::new(8);
        let rx1 = broadcaster.subscribe();
        let rx2 = broadcaster.subscribe();
        assert_eq!(broadcaster.subscriber_count(), 2);

        drop(rx1);
        assert_eq!(broadcaster.subscriber_count(), 1);
        drop(rx2);
        assert_eq!(broadcaster.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_lagging_receiver_misses_updates_without_blocking() {
        let broadcaster = ChannelBroadcast::new(1);
        let mut rx = broadcaster.subscribe();

        broadcaster.publish(&update(1)).await.unwrap();
        broadcaster.publish(&update(2)).await.unwrap();

        // The oldest update was evicted; the receiver lags, then catches up.
        assert!(matches!(
            rx.recv().await,
            Err(broadcast::error::RecvError::Lagged(_))
        ));
        assert_eq!(rx.recv().await.unwrap().tick, 2);
    }
}
