//! buoynet server: the running simulation service.
//!
//! Composes the pieces from `buoynet_core` and `buoynet_env` into a live
//! system:
//!
//! - [`store`]: persistence-port implementations (in-memory and sled)
//! - [`broadcast::ChannelBroadcast`]: observer fan-out over a tokio
//!   broadcast channel
//! - [`bootstrap`]: seeds the twelve-sensor roster into an empty store
//! - [`TickScheduler`]: the periodic advance → persist → broadcast loop
//! - [`ControlInterface`]: thruster commands applied between ticks

pub mod bootstrap;
pub mod broadcast;
pub mod control;
pub mod scheduler;
pub mod store;

pub use broadcast::ChannelBroadcast;
pub use control::{ControlError, ControlInterface, ThrusterCommand};
pub use scheduler::{SchedulerHandle, TickScheduler, TickStats};
pub use store::{MemoryStore, SledStore};
