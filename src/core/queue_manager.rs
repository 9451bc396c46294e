//! QueueManager maps queue names to queues.
//!
//! Lookups share a read lock; a miss on `put` takes the write lock, re-checks,
//! and only then creates the queue, so a name never gets two queues even when
//! first writers race.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::core::error::BrokerError;
use crate::core::queue::{Queue, QueueBehavior};

/// Waits longer than this are clamped to it.
pub const MAX_WAIT: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Builds a queue that holds at most the given number of messages.
pub type QueueFactory = Box<dyn Fn(usize) -> Arc<dyn QueueBehavior> + Send + Sync>;

/// Capacity limits, fixed for the manager's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueManagerConfig {
    /// Cap on the number of distinct queue names.
    pub max_queue_num: usize,
    /// Cap on the backlog of each queue.
    pub max_messages_per_queue: usize,
}

impl Default for QueueManagerConfig {
    fn default() -> Self {
        Self {
            max_queue_num: 100,
            max_messages_per_queue: 10_000,
        }
    }
}

#[derive(Default)]
struct Registry {
    queues: HashMap<String, Arc<dyn QueueBehavior>>,
    closed: bool,
}

pub struct QueueManager {
    config: QueueManagerConfig,
    registry: RwLock<Registry>,
    factory: QueueFactory,
}

impl fmt::Debug for QueueManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueueManager")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl QueueManager {
    /// Creates a manager backed by actor queues.
    pub fn new(config: QueueManagerConfig) -> Self {
        Self::with_factory(
            config,
            Box::new(|max_messages: usize| {
                Arc::new(Queue::new(max_messages)) as Arc<dyn QueueBehavior>
            }),
        )
    }

    /// Creates a manager that builds its queues with `factory`.
    pub fn with_factory(config: QueueManagerConfig, factory: QueueFactory) -> Self {
        info!(
            max_queue_num = config.max_queue_num,
            max_messages_per_queue = config.max_messages_per_queue,
            "initializing queue manager"
        );
        Self {
            config,
            registry: RwLock::new(Registry::default()),
            factory,
        }
    }

    pub fn config(&self) -> QueueManagerConfig {
        self.config
    }

    /// Appends `message` to the queue `name`, creating the queue on first use.
    ///
    /// Returns [`BrokerError::TooManyItems`] if creating the queue would exceed
    /// the queue-count cap or if the queue's own backlog is full.
    pub async fn put(&self, name: &str, message: String) -> Result<(), BrokerError> {
        let queue = match self.lookup(name).await {
            Some(queue) => queue,
            None => self.get_or_create(name).await?,
        };
        queue.put(message).await
    }

    /// Takes the head message of queue `name`, waiting up to `timeout`.
    ///
    /// A queue that was never written to behaves like an empty one. Whichever of
    /// the timeout or `cancel` fires first ends the wait with [`BrokerError::NoMessage`].
    /// Timeouts beyond [`MAX_WAIT`] are treated as [`MAX_WAIT`].
    pub async fn get(
        &self,
        cancel: &CancellationToken,
        name: &str,
        timeout: Duration,
    ) -> Result<String, BrokerError> {
        let deadline = deadline_after(timeout);
        let Some(queue) = self.lookup(name).await else {
            debug!(queue = name, "get on unknown queue");
            return Err(BrokerError::NoMessage);
        };
        queue.get(deadline, cancel).await
    }

    /// Shuts down every queue. No queue is created afterwards.
    pub async fn shutdown(&self) {
        let mut registry = self.registry.write().await;
        registry.closed = true;
        for queue in registry.queues.values() {
            queue.shutdown();
        }
        info!(queues = registry.queues.len(), "queue manager stopped");
    }

    /// Number of queues created so far.
    pub async fn queue_count(&self) -> usize {
        self.registry.read().await.queues.len()
    }

    /// Names of all queues with their current backlog size.
    pub async fn list_queues(&self) -> Vec<(String, usize)> {
        let registry = self.registry.read().await;
        let mut queues: Vec<_> = registry
            .queues
            .iter()
            .map(|(name, queue)| (name.clone(), queue.len()))
            .collect();
        queues.sort();
        queues
    }

    async fn lookup(&self, name: &str) -> Option<Arc<dyn QueueBehavior>> {
        self.registry.read().await.queues.get(name).cloned()
    }

    async fn get_or_create(&self, name: &str) -> Result<Arc<dyn QueueBehavior>, BrokerError> {
        let mut registry = self.registry.write().await;
        // Someone may have created it between our read and this write lock.
        if let Some(queue) = registry.queues.get(name) {
            return Ok(Arc::clone(queue));
        }
        if registry.closed {
            warn!(queue = name, "queue manager is shut down; not creating queue");
            return Err(BrokerError::TooManyItems);
        }
        if registry.queues.len() >= self.config.max_queue_num {
            warn!(
                queue = name,
                max_queue_num = self.config.max_queue_num,
                "queue limit reached"
            );
            return Err(BrokerError::TooManyItems);
        }

        let queue = (self.factory)(self.config.max_messages_per_queue);
        registry.queues.insert(name.to_string(), Arc::clone(&queue));
        debug!(queue = name, total = registry.queues.len(), "queue created");
        Ok(queue)
    }
}

fn deadline_after(timeout: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(timeout.min(MAX_WAIT))
        .unwrap_or_else(|| now + Duration::from_secs(86_400))
}
