//! Fleet bootstrap: seed the store with the fixed sensor roster.

use buoynet_core::{settings::SimSettings, Sensor};
use buoynet_env::{PortError, SensorStore};
use nalgebra::Vector3;
use rand::Rng;
use tracing::info;

/// The fixed roster of sensor names, created once on an empty store.
pub const SENSOR_ROSTER: [&str; 12] = [
    "alpha", "beta", "gamma", "delta", "epsilon", "zeta", "eta", "theta", "iota", "kappa",
    "lambda", "mu",
];

fn random_vector(rng: &mut impl Rng, min: f64, max: f64) -> Vector3<f64> {
    Vector3::new(
        rng.gen_range(min..=max),
        rng.gen_range(min..=max),
        rng.gen_range(min..=max),
    )
}

/// Generates one fresh sensor for the roster.
///
/// Placement and ambient current are uniform within the configured bounds;
/// thrusters start at rest and the initial position is pinned to the
/// placement point.
pub fn generate_sensor(name: &str, settings: &SimSettings, rng: &mut impl Rng) -> Sensor {
    let position = random_vector(rng, settings.position_min, settings.position_max);
    let water_speed = random_vector(rng, settings.water_speed_min, settings.water_speed_max);
    let temperature = rng.gen_range(settings.temperature_min..=settings.temperature_max);

    Sensor::new(name, position, water_speed, temperature)
}

/// Ensures the store holds a fleet, seeding the roster when it is empty.
///
/// An already-populated store is returned untouched, so restarts resume
/// the persisted fleet rather than re-rolling it.
pub async fn ensure_fleet<S: SensorStore>(
    store: &S,
    settings: &SimSettings,
    rng: &mut (impl Rng + Send),
) -> Result<Vec<Sensor>, PortError> {
    let existing = store.load_all().await?;
    if !existing.is_empty() {
        info!("Resuming persisted fleet of {} sensors", existing.len());
        return Ok(existing);
    }

    let fleet: Vec<Sensor> = SENSOR_ROSTER
        .iter()
        .map(|name| generate_sensor(name, settings, rng))
        .collect();
    store.save_all(&fleet).await?;

    let seeded = store.load_all().await?;
    info!("Seeded fleet of {} sensors", seeded.len());
    Ok(seeded)
}
