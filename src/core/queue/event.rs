use tokio::sync::oneshot;

use crate::core::error::BrokerError;

/// Identifies one pending `get` inside a single queue.
pub type WaiterId = u64;

/// Everything that may touch a queue's state, in the order its worker sees it.
#[derive(Debug)]
pub(crate) enum QueueEvent {
    /// A producer wants `message` appended; the verdict goes back on `ack`.
    Put {
        message: String,
        ack: oneshot::Sender<Result<(), BrokerError>>,
    },
    /// A consumer joins the tail of the waiting line.
    Wait {
        waiter: WaiterId,
        reply: oneshot::Sender<String>,
    },
    /// The consumer's deadline or cancellation fired. No-op if it was already served.
    Expire { waiter: WaiterId },
    /// A message was handed to a consumer that went away before reading it.
    Requeue { message: String },
}
