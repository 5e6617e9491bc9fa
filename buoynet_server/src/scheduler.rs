//! The tick scheduler: drives the engine across the fleet on a fixed period.
//!
//! One owned object with an explicit start/stop lifecycle, rather than any
//! process-wide timer state. Ticks are serialized by construction: the loop awaits each
//! tick to completion before sleeping again, so a slow tick can never
//! overlap the next one, and shutdown only lands between ticks, letting an
//! in-flight persistence write finish.

use buoynet_core::{time_until_lost, SimSettings, SimulationEngine};
use buoynet_env::{
    FleetUpdate, KinematicsUpdate, PortError, RuntimeContext, SensorBroadcast, SensorObservation,
    SensorStore,
};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Deadline for any single port call. A store or transport that stalls
/// longer forfeits its tick; the loop itself never blocks indefinitely.
const PORT_TIMEOUT: Duration = Duration::from_secs(2);

/// Counters accumulated across the scheduler's lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickStats {
    /// Ticks attempted (including ones abandoned on a port failure)
    pub ticks: u64,

    /// Sensors currently marked lost, as of the last completed tick
    pub sensors_lost: u64,

    /// Ticks abandoned because a store call failed or timed out
    pub store_failures: u64,

    /// Broadcasts dropped because the transport failed or timed out
    pub broadcast_failures: u64,
}

/// Bounds a port call by [`PORT_TIMEOUT`].
async fn with_deadline<T>(fut: impl Future<Output = Result<T, PortError>>) -> Result<T, PortError> {
    match tokio::time::timeout(PORT_TIMEOUT, fut).await {
        Ok(result) => result,
        Err(_) => Err(PortError::Timeout(PORT_TIMEOUT.as_millis() as u64)),
    }
}

/// Periodically advances every sensor, persists the batch and fans the
/// result out to observers.
pub struct TickScheduler<C, S, B> {
    ctx: Arc<C>,
    store: Arc<S>,
    broadcast: Arc<B>,
    engine: SimulationEngine,
    settings: SimSettings,
    stats: TickStats,
    tick: u64,
}

impl<C, S, B> TickScheduler<C, S, B>
where
    C: RuntimeContext,
    S: SensorStore,
    B: SensorBroadcast,
{
    pub fn new(
        ctx: Arc<C>,
        store: Arc<S>,
        broadcast: Arc<B>,
        engine: SimulationEngine,
        settings: SimSettings,
    ) -> Self {
        Self {
            ctx,
            store,
            broadcast,
            engine,
            settings,
            stats: TickStats::default(),
            tick: 0,
        }
    }

    /// Counters accumulated so far.
    pub fn stats(&self) -> TickStats {
        self.stats
    }

    /// Spawns the periodic loop and returns its lifecycle handle.
    pub fn start(self) -> SchedulerHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let join = tokio::spawn(self.run(shutdown_rx));
        SchedulerHandle { shutdown_tx, join }
    }

    async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> TickStats {
        let ctx = Arc::clone(&self.ctx);
        let interval = Duration::from_millis(self.settings.tick_interval_ms);
        info!(
            "Tick scheduler started (interval {}ms, safe area {}mm)",
            self.settings.tick_interval_ms, self.settings.safe_area_size
        );

        loop {
            tokio::select! {
                _ = ctx.sleep(interval) => self.tick_once().await,
                _ = shutdown.changed() => break,
            }
        }

        info!(
            "Tick scheduler stopped after {} ticks ({} lost sensors)",
            self.stats.ticks, self.stats.sensors_lost
        );
        self.stats
    }

    /// Executes one full tick: load, advance, persist, broadcast.
    ///
    /// Every failure is recoverable at this boundary: log, skip the rest of
    /// the tick, and let the next cycle retry against fresh state.
    pub async fn tick_once(&mut self) {
        self.tick += 1;
        self.stats.ticks += 1;
        let zone = self.settings.safe_zone();

        let mut sensors = match with_deadline(self.store.load_all()).await {
            Ok(sensors) => sensors,
            Err(e) => {
                warn!("Tick {}: loading fleet failed: {}", self.tick, e);
                self.stats.store_failures += 1;
                return;
            }
        };

        // Advance the whole batch before any write; sensors are independent.
        let mut updates = Vec::with_capacity(sensors.len());
        for sensor in &mut sensors {
            let was_lost = sensor.lost;
            self.engine.advance(sensor, &zone);
            if sensor.lost && !was_lost {
                warn!(
                    "Sensor {} lost at [{:.0}, {:.0}, {:.0}]",
                    sensor.name, sensor.position.x, sensor.position.y, sensor.position.z
                );
            }
            // Already-lost sensors are terminal; there is nothing to write.
            if !was_lost {
                updates.push(KinematicsUpdate::from_sensor(sensor));
            }
        }

        if let Err(e) = with_deadline(self.store.apply_kinematics(&updates)).await {
            warn!("Tick {}: persisting batch failed: {}", self.tick, e);
            self.stats.store_failures += 1;
            return;
        }

        // Reload the merged view: thruster commands that landed during this
        // tick are part of what observers should see.
        let merged = match with_deadline(self.store.load_all()).await {
            Ok(merged) => merged,
            Err(e) => {
                warn!("Tick {}: reloading fleet failed: {}", self.tick, e);
                self.stats.store_failures += 1;
                return;
            }
        };

        self.stats.sensors_lost = merged.iter().filter(|s| s.lost).count() as u64;

        let observations = merged
            .into_iter()
            .map(|sensor| SensorObservation {
                time_until_lost: time_until_lost(
                    &sensor,
                    self.settings.safe_area_size,
                    self.settings.tick_interval_ms,
                ),
                sensor,
            })
            .collect();

        let update = FleetUpdate::new(self.tick, observations);
        if let Err(e) = with_deadline(self.broadcast.publish(&update)).await {
            warn!("Tick {}: broadcast failed: {}", self.tick, e);
            self.stats.broadcast_failures += 1;
            return;
        }

        if self.tick % 30 == 0 {
            debug!(
                "Tick {} | t={:.1}s | sensors={} | lost={}",
                self.tick,
                self.ctx.now().as_secs_f64(),
                update.sensors.len(),
                self.stats.sensors_lost
            );
        }
    }
}

/// Handle to a running scheduler.
pub struct SchedulerHandle {
    shutdown_tx: watch::Sender<bool>,
    join: JoinHandle<TickStats>,
}

impl SchedulerHandle {
    /// Stops the loop and waits for any in-flight tick to complete its
    /// persistence write. Returns the final counters.
    pub async fn stop(self) -> TickStats {
        let _ = self.shutdown_tx.send(true);
        self.join.await.unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broadcast::ChannelBroadcast;
    use crate::control::{ControlInterface, ThrusterCommand};
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use buoynet_core::{Axis, EngineConfig, Sensor, TimeUntilLost};
    use buoynet_env::TokioContext;
    use nalgebra::Vector3;
    use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
    use tokio::sync::Notify;

    fn test_settings() -> SimSettings {
        SimSettings {
            tick_interval_ms: 10,
            ..SimSettings::default()
        }
    }

    fn still_engine() -> SimulationEngine {
        SimulationEngine::new(EngineConfig::still(), 42)
    }

    async fn seeded_store() -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        let sensor = Sensor::new(
            "alpha",
            Vector3::new(100.0, 100.0, 100.0),
            Vector3::new(10.0, 0.0, 0.0),
            12.0,
        );
        store.save_one(&sensor).await.unwrap();
        store
    }

    fn scheduler(
        store: Arc<MemoryStore>,
        broadcaster: Arc<ChannelBroadcast>,
    ) -> TickScheduler<TokioContext, MemoryStore, ChannelBroadcast> {
        TickScheduler::new(
            TokioContext::shared(),
            store,
            broadcaster,
            still_engine(),
            test_settings(),
        )
    }

    #[tokio::test]
    async fn test_tick_advances_persists_and_broadcasts() {
        let store = seeded_store().await;
        let broadcaster = Arc::new(ChannelBroadcast::new(8));
        let mut rx = broadcaster.subscribe();
        let mut sched = scheduler(store.clone(), broadcaster);

        sched.tick_once().await;

        let stored = store.find_by_name("alpha").await.unwrap().unwrap();
        assert_eq!(stored.position, Vector3::new(110.0, 100.0, 100.0));

        let update = rx.recv().await.unwrap();
        assert_eq!(update.tick, 1);
        assert_eq!(update.sensors.len(), 1);
        assert_eq!(update.sensors[0].sensor.position.x, 110.0);
        assert!(matches!(
            update.sensors[0].time_until_lost,
            TimeUntilLost::Secs(_)
        ));
        assert_eq!(sched.stats().ticks, 1);
    }

    #[tokio::test]
    async fn test_start_and_stop_complete_cleanly() {
        let store = seeded_store().await;
        let broadcaster = Arc::new(ChannelBroadcast::new(8));
        let mut rx = broadcaster.subscribe();

        let handle = scheduler(store, broadcaster).start();
        let first = rx.recv().await.unwrap();
        assert_eq!(first.tick, 1);

        let stats = handle.stop().await;
        assert!(stats.ticks >= 1);
        assert_eq!(stats.store_failures, 0);
    }

    /// Store wrapper that pauses the first `load_all` until released,
    /// exposing the window between a tick's load and its save.
    struct GatedStore {
        inner: Arc<MemoryStore>,
        armed: AtomicBool,
        loaded: Notify,
        release: Notify,
    }

    impl GatedStore {
        fn new(inner: Arc<MemoryStore>) -> Self {
            Self {
                inner,
                armed: AtomicBool::new(true),
                loaded: Notify::new(),
                release: Notify::new(),
            }
        }
    }

    #[async_trait]
    impl SensorStore for GatedStore {
        async fn load_all(&self) -> Result<Vec<Sensor>, PortError> {
            let sensors = self.inner.load_all().await?;
            if self.armed.swap(false, Ordering::SeqCst) {
                self.loaded.notify_one();
                self.release.notified().await;
            }
            Ok(sensors)
        }

        async fn save_all(&self, sensors: &[Sensor]) -> Result<(), PortError> {
            self.inner.save_all(sensors).await
        }

        async fn find_by_name(&self, name: &str) -> Result<Option<Sensor>, PortError> {
            self.inner.find_by_name(name).await
        }

        async fn save_one(&self, sensor: &Sensor) -> Result<(), PortError> {
            self.inner.save_one(sensor).await
        }

        async fn apply_kinematics(&self, updates: &[KinematicsUpdate]) -> Result<(), PortError> {
            self.inner.apply_kinematics(updates).await
        }
    }

    #[tokio::test]
    async fn test_thruster_command_during_tick_survives_the_batch_save() {
        let inner = seeded_store().await;
        let store = Arc::new(GatedStore::new(inner.clone()));
        let broadcaster = Arc::new(ChannelBroadcast::new(8));
        let mut rx = broadcaster.subscribe();

        let mut sched = TickScheduler::new(
            TokioContext::shared(),
            store.clone(),
            broadcaster,
            still_engine(),
            test_settings(),
        );
        let tick = tokio::spawn(async move {
            sched.tick_once().await;
            sched
        });

        // The tick has loaded its batch and is now paused mid-flight.
        store.loaded.notified().await;
        let control = ControlInterface::new(inner.clone());
        control
            .set_thruster_speed("alpha", ThrusterCommand::axis(Axis::X, 9.0))
            .await
            .unwrap();
        store.release.notify_one();

        let sched = tick.await.unwrap();
        assert_eq!(sched.stats().store_failures, 0);

        // The batch save landed after the command, yet the command survives
        // and the broadcast already reflects the merged state.
        let stored = inner.find_by_name("alpha").await.unwrap().unwrap();
        assert_eq!(stored.thruster_speed.x, 9.0);
        assert_eq!(stored.position.x, 110.0);

        let update = rx.recv().await.unwrap();
        assert_eq!(update.sensors[0].sensor.thruster_speed.x, 9.0);
    }

    /// Store wrapper whose `load_all` fails a configurable number of times.
    struct FlakyStore {
        inner: Arc<MemoryStore>,
        failures_left: AtomicU64,
    }

    #[async_trait]
    impl SensorStore for FlakyStore {
        async fn load_all(&self) -> Result<Vec<Sensor>, PortError> {
            if self
                .failures_left
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                return Err(PortError::persistence("connection reset"));
            }
            self.inner.load_all().await
        }

        async fn save_all(&self, sensors: &[Sensor]) -> Result<(), PortError> {
            self.inner.save_all(sensors).await
        }

        async fn find_by_name(&self, name: &str) -> Result<Option<Sensor>, PortError> {
            self.inner.find_by_name(name).await
        }

        async fn save_one(&self, sensor: &Sensor) -> Result<(), PortError> {
            self.inner.save_one(sensor).await
        }

        async fn apply_kinematics(&self, updates: &[KinematicsUpdate]) -> Result<(), PortError> {
            self.inner.apply_kinematics(updates).await
        }
    }

    #[tokio::test]
    async fn test_store_failure_skips_the_tick_but_not_the_loop() {
        let inner = seeded_store().await;
        let store = Arc::new(FlakyStore {
            inner: inner.clone(),
            failures_left: AtomicU64::new(1),
        });
        let broadcaster = Arc::new(ChannelBroadcast::new(8));
        let mut rx = broadcaster.subscribe();

        let mut sched = TickScheduler::new(
            TokioContext::shared(),
            store,
            broadcaster,
            still_engine(),
            test_settings(),
        );

        sched.tick_once().await;
        assert_eq!(sched.stats().store_failures, 1);
        assert!(rx.try_recv().is_err());

        sched.tick_once().await;
        assert_eq!(sched.stats().store_failures, 1);

        // The missed broadcast is simply absent; the next one is tick 2.
        let update = rx.recv().await.unwrap();
        assert_eq!(update.tick, 2);

        // The skipped tick left the fleet untouched; only one step applied.
        let stored = inner.find_by_name("alpha").await.unwrap().unwrap();
        assert_eq!(stored.position.x, 110.0);
    }
}
