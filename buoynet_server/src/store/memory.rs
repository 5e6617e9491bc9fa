//! In-memory sensor store, for ephemeral runs and tests.

use async_trait::async_trait;
use buoynet_core::Sensor;
use buoynet_env::{KinematicsUpdate, PortError, SensorStore};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

/// Sensor store held entirely in process memory.
///
/// Records live in a map keyed by id; all mutation happens under a single
/// write lock, which makes every batch operation atomic relative to reads.
pub struct MemoryStore {
    records: RwLock<HashMap<u64, Sensor>>,
    next_id: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    fn allocate_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Inserts or replaces one record in the map, enforcing name uniqueness
/// for new records. Returns the assigned id.
fn upsert(
    records: &mut HashMap<u64, Sensor>,
    next_id: impl FnOnce() -> u64,
    sensor: &Sensor,
) -> Result<u64, PortError> {
    if sensor.id == 0 {
        if records.values().any(|existing| existing.name == sensor.name) {
            return Err(PortError::persistence(format!(
                "duplicate sensor name: {}",
                sensor.name
            )));
        }
        let id = next_id();
        let mut stored = sensor.clone();
        stored.id = id;
        records.insert(id, stored);
        Ok(id)
    } else {
        records.insert(sensor.id, sensor.clone());
        Ok(sensor.id)
    }
}

#[async_trait]
impl SensorStore for MemoryStore {
    async fn load_all(&self) -> Result<Vec<Sensor>, PortError> {
        let records = self.records.read().await;
        let mut sensors: Vec<Sensor> = records.values().cloned().collect();
        sensors.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(sensors)
    }

    async fn save_all(&self, sensors: &[Sensor]) -> Result<(), PortError> {
        let mut records = self.records.write().await;
        for sensor in sensors {
            upsert(&mut records, || self.allocate_id(), sensor)?;
        }
        Ok(())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Sensor>, PortError> {
        let records = self.records.read().await;
        Ok(records.values().find(|s| s.name == name).cloned())
    }

    async fn save_one(&self, sensor: &Sensor) -> Result<(), PortError> {
        let mut records = self.records.write().await;
        upsert(&mut records, || self.allocate_id(), sensor)?;
        Ok(())
    }

    async fn apply_kinematics(&self, updates: &[KinematicsUpdate]) -> Result<(), PortError> {
        let mut records = self.records.write().await;
        for update in updates {
            // Patch whatever is stored *now*; a thruster command that ran
            // since the tick loaded its batch stays intact.
            if let Some(stored) = records.get_mut(&update.id) {
                update.apply_to(stored);
            }
        }
        Ok(())
    }
}
