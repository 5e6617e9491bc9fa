//! Runtime context trait for the scheduler and composition root.

use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;

/// Abstraction over the runtime the simulation service executes on.
///
/// The tick scheduler only needs three things from its environment: a
/// monotonic clock, a way to wait, and a way to spawn background work.
/// Keeping them behind a trait lets tests drive the scheduler without a
/// wall clock.
///
/// # Implementations
///
/// - **Production**: [`crate::TokioContext`] wrapping `tokio::time` and
///   `tokio::spawn`
#[async_trait]
pub trait RuntimeContext: Send + Sync + 'static {
    /// Returns the monotonic time since context creation.
    fn now(&self) -> Duration;

    /// Suspends the calling task for the given duration.
    async fn sleep(&self, duration: Duration);

    /// Spawns a named background task.
    fn spawn<F>(&self, name: &str, future: F)
    where
        F: Future<Output = ()> + Send + 'static;
}
