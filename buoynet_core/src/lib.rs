//! buoynet core: the underwater sensor fleet simulation domain.
//!
//! Everything in this crate is pure computation: no I/O, no async, no
//! clocks. The pieces:
//!
//! - [`Sensor`]: the unit of simulation (kinematics, temperature, loss flag)
//! - [`SimulationEngine`]: the per-tick state transition (Euler drift,
//!   loss detection, bounded stochastic increments)
//! - [`estimator`]: the observer-facing time-until-lost projection
//! - [`SimSettings`]: environment-driven configuration
//!
//! Persistence and broadcast live behind the port traits in `buoynet_env`;
//! the scheduler wiring it all together lives in `buoynet_server`.

pub mod engine;
pub mod estimator;
pub mod sensor;
pub mod settings;

pub use engine::{DriftBounds, EngineConfig, SafeZone, SimulationEngine};
pub use estimator::{time_until_lost, TimeUntilLost};
pub use sensor::{Axis, Sensor};
pub use settings::{SettingsError, SimSettings};
