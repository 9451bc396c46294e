//! simplebroker – a lightweight named-queue message broker.
//!
//! This crate exports
//!  * `core`     – bounded FIFO queues and the queue manager
//!  * `api`      – HTTP front-end (`PUT`/`GET /queue/{name}`)
//!  * `config`   – TOML-driven runtime configuration
//!  * `logging`  – tracing subscriber setup
//!  * `shutdown` – signal handling
//!
//! Applications can embed the [`QueueManager`] directly or run the bundled
//! `simplebroker` binary.

// ───────────────────────────────────────────────────────────
// Public modules
// ───────────────────────────────────────────────────────────
pub mod api;
pub mod config;
pub mod core;
pub mod logging;
pub mod shutdown;

// ───────────────────────────────────────────────────────────
// Re-exports
// ───────────────────────────────────────────────────────────
pub use config::{load_config, Config};
pub use crate::core::{BrokerError, QueueManager, QueueManagerConfig};
