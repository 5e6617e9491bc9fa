//! Durable sensor store backed by sled.

use async_trait::async_trait;
use buoynet_core::Sensor;
use buoynet_env::{KinematicsUpdate, PortError, SensorStore};
use std::path::Path;

/// Sensor store persisted in a sled tree.
///
/// Keys are big-endian record ids, values JSON-encoded sensors. The fleet
/// is tiny (a dozen records), so name lookups scan rather than maintain a
/// secondary index.
pub struct SledStore {
    db: sled::Db,
}

impl SledStore {
    /// Opens (or creates) a store at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PortError> {
        let db = sled::open(path)
            .map_err(|e| PortError::persistence(format!("failed to open sled DB: {e}")))?;
        Ok(Self { db })
    }

    /// Creates an ephemeral store for tests.
    pub fn temporary() -> Result<Self, PortError> {
        let config = sled::Config::new().temporary(true);
        let db = config
            .open()
            .map_err(|e| PortError::persistence(format!("failed to open temporary DB: {e}")))?;
        Ok(Self { db })
    }

    /// Allocates a fresh nonzero record id.
    fn allocate_id(&self) -> Result<u64, PortError> {
        // generate_id starts at 0; shift so that 0 keeps meaning "unpersisted".
        self.db
            .generate_id()
            .map(|id| id + 1)
            .map_err(|e| PortError::persistence(e.to_string()))
    }

    fn decode(bytes: &[u8]) -> Result<Sensor, PortError> {
        serde_json::from_slice(bytes)
            .map_err(|e| PortError::persistence(format!("corrupt sensor record: {e}")))
    }

    fn encode(sensor: &Sensor) -> Result<Vec<u8>, PortError> {
        serde_json::to_vec(sensor).map_err(|e| PortError::persistence(e.to_string()))
    }

    fn insert(&self, sensor: &Sensor) -> Result<u64, PortError> {
        let mut stored = sensor.clone();
        if stored.id == 0 {
            if self.scan_by_name(&stored.name)?.is_some() {
                return Err(PortError::persistence(format!(
                    "duplicate sensor name: {}",
                    stored.name
                )));
            }
            stored.id = self.allocate_id()?;
        }
        self.db
            .insert(stored.id.to_be_bytes(), Self::encode(&stored)?)
            .map_err(|e| PortError::persistence(e.to_string()))?;
        Ok(stored.id)
    }

    fn scan_by_name(&self, name: &str) -> Result<Option<Sensor>, PortError> {
        for entry in self.db.iter() {
            let (_, value) = entry.map_err(|e| PortError::persistence(e.to_string()))?;
            let sensor = Self::decode(&value)?;
            if sensor.name == name {
                return Ok(Some(sensor));
            }
        }
        Ok(None)
    }
}

#[async_trait]
impl SensorStore for SledStore {
    async fn load_all(&self) -> Result<Vec<Sensor>, PortError> {
        let mut sensors = Vec::new();
        for entry in self.db.iter() {
            let (_, value) = entry.map_err(|e| PortError::persistence(e.to_string()))?;
            sensors.push(Self::decode(&value)?);
        }
        sensors.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(sensors)
    }

    async fn save_all(&self, sensors: &[Sensor]) -> Result<(), PortError> {
        for sensor in sensors {
            self.insert(sensor)?;
        }
        self.db
            .flush_async()
            .await
            .map_err(|e| PortError::persistence(e.to_string()))?;
        Ok(())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Sensor>, PortError> {
        self.scan_by_name(name)
    }

    async fn save_one(&self, sensor: &Sensor) -> Result<(), PortError> {
        self.insert(sensor)?;
        Ok(())
    }

    async fn apply_kinematics(&self, updates: &[KinematicsUpdate]) -> Result<(), PortError> {
        for update in updates {
            // update_and_fetch makes the read-patch-write atomic per key,
            // so a thruster write racing this patch is never lost. A missing
            // or undecodable record is left as-is.
            self.db
                .update_and_fetch(update.id.to_be_bytes(), |old| {
                    let old = old?;
                    match Self::decode(old) {
                        Ok(mut sensor) => {
                            update.apply_to(&mut sensor);
                            Self::encode(&sensor).ok().or_else(|| Some(old.to_vec()))
                        }
                        Err(_) => Some(old.to_vec()),
                    }
                })
                .map_err(|e| PortError::persistence(e.to_string()))?;
        }
        Ok(())
    }
}
