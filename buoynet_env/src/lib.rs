//! buoynet environment abstraction layer.
//!
//! The simulation core never touches a database, a socket or a clock
//! directly. This crate defines the seams it talks through instead:
//!
//! - [`SensorStore`]: load/save the fleet (the persistence port)
//! - [`SensorBroadcast`]: fan the latest fleet state out to observers
//!   (the broadcast port)
//! - [`RuntimeContext`]: time and task spawning, so the scheduler can run
//!   against a real runtime in production and a bare executor in tests
//!
//! # Concurrency contract
//!
//! The tick loop and the control surface write to the same store
//! concurrently. The tick's batch write is therefore *field-scoped*
//! ([`SensorStore::apply_kinematics`]): it patches only the fields the
//! engine computes, so a thruster command that lands between the tick's
//! load and its save is never overwritten with a stale value.

mod broadcast;
mod context;
mod error;
mod store;
mod tokio_impl;

pub use broadcast::{FleetUpdate, SensorBroadcast, SensorObservation, SENSORS_UPDATE_EVENT};
pub use context::RuntimeContext;
pub use error::PortError;
pub use store::{KinematicsUpdate, SensorStore};
pub use tokio_impl::TokioContext;
