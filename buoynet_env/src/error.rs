//! Error type shared by the port boundary.

use thiserror::Error;

/// Errors surfaced by the persistence and broadcast ports.
///
/// Everything here is recoverable at the tick boundary: the scheduler logs
/// the failure, drops the affected write or broadcast, and carries on.
#[derive(Debug, Error)]
pub enum PortError {
    /// The backing store rejected or failed an operation
    #[error("persistence error: {0}")]
    Persistence(String),

    /// The broadcast transport failed to accept an update
    #[error("broadcast error: {0}")]
    Broadcast(String),

    /// A port call exceeded its deadline
    #[error("timeout after {0}ms")]
    Timeout(u64),
}

impl PortError {
    /// Creates a persistence error.
    pub fn persistence(msg: impl Into<String>) -> Self {
        Self::Persistence(msg.into())
    }

    /// Creates a broadcast error.
    pub fn broadcast(msg: impl Into<String>) -> Self {
        Self::Broadcast(msg.into())
    }
}
