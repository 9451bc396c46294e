#![allow(dead_code)]

use std::sync::Once;
use std::time::Duration;

use simplebroker::{QueueManager, QueueManagerConfig};

pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        simplebroker::logging::init_logging();
    });
}

pub fn manager(max_queue_num: usize, max_messages_per_queue: usize) -> QueueManager {
    QueueManager::new(QueueManagerConfig {
        max_queue_num,
        max_messages_per_queue,
    })
}

pub const SHORT: Duration = Duration::from_millis(50);
