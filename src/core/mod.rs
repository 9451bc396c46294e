pub mod error;
pub mod queue;
pub mod queue_manager;

pub use error::BrokerError;
pub use queue_manager::{QueueManager, QueueManagerConfig};
