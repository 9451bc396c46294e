//! HTTP front-end for the queue manager.
//!
//! - `PUT /queue/{name}` with `{"message": "..."}` enqueues a message
//! - `GET /queue/{name}?timeout=N` waits up to `N` seconds for one
//! - `GET /queues` lists queues with their backlog size

pub mod handlers;
pub mod rest;

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::core::QueueManager;

pub use rest::{create_router, serve};

/// Shared state handed to every handler.
#[derive(Debug, Clone)]
pub struct ApiState {
    pub manager: Arc<QueueManager>,
    /// Wait used by GET when the request carries no `timeout`.
    pub default_timeout: Duration,
    /// Fired when the broker shuts down; releases blocked GETs.
    pub shutdown: CancellationToken,
}
