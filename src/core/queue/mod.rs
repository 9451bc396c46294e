//! Queue module.
//!
//! Defines the per-queue contract and its actor-backed implementation.
//! Each named queue in the broker is one [`QueueBehavior`] instance.

pub mod engine;
pub mod event;

pub use engine::Queue;

use std::fmt::Debug;

use futures::future::BoxFuture;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::core::error::BrokerError;

/// Common interface for a single bounded FIFO queue.
///
/// The manager only sees queues through this trait, so tests can swap in
/// simple in-memory doubles.
///
/// Implementations must be thread-safe (`Send + Sync`).
pub trait QueueBehavior: Send + Sync + Debug {
    /// Appends `message` at the tail.
    ///
    /// Fails with [`BrokerError::TooManyItems`] when the backlog is at its cap;
    /// the queue is left unchanged in that case.
    fn put(&self, message: String) -> BoxFuture<'_, Result<(), BrokerError>>;

    /// Waits for the head message until `deadline` passes or `cancel` fires.
    ///
    /// Consumers are served strictly in the order they called `get`.
    /// Returns [`BrokerError::NoMessage`] if nothing arrived in time.
    fn get<'a>(
        &'a self,
        deadline: Instant,
        cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, Result<String, BrokerError>>;

    /// Number of messages waiting to be consumed.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stops processing. Calls already in flight may not complete.
    fn shutdown(&self);
}
