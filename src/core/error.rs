use std::fmt;

/// Errors surfaced by the queue engine and the queue manager.
///
/// Both kinds are expected outcomes, never fatal: callers may retry either.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrokerError {
    /// Nothing could be handed out before the deadline or cancellation.
    NoMessage,
    /// A capacity limit was hit: the per-queue backlog cap or the queue-count cap.
    TooManyItems,
}

impl std::error::Error for BrokerError {}

impl fmt::Display for BrokerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BrokerError::NoMessage => write!(f, "No message"),
            BrokerError::TooManyItems => write!(f, "Too many items"),
        }
    }
}
