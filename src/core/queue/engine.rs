//! Actor-backed bounded FIFO queue.
//!
//! Each [`Queue`] owns a single worker task. Puts, waiter registrations and
//! waiter expirations all travel over one ordered channel to that worker, so the
//! backlog and the waiting line are only ever touched from one place and need no lock.

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::core::error::BrokerError;
use crate::core::queue::event::{QueueEvent, WaiterId};
use crate::core::queue::QueueBehavior;

/// Stale ids tolerated in the waiting line before it is compacted.
const ORDER_SLACK: usize = 64;

/// Handle to one named queue. Cheap to share behind an `Arc`.
pub struct Queue {
    events: mpsc::UnboundedSender<QueueEvent>,
    next_waiter: AtomicU64,
    len: Arc<AtomicUsize>,
    shutdown: CancellationToken,
}

impl fmt::Debug for Queue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Queue")
            .field("len", &self.len.load(Ordering::Relaxed))
            .field("shut_down", &self.shutdown.is_cancelled())
            .finish()
    }
}

impl Queue {
    /// Creates a queue holding at most `max_messages` and spawns its worker.
    ///
    /// Must be called from inside a Tokio runtime.
    pub fn new(max_messages: usize) -> Self {
        let (events, rx) = mpsc::unbounded_channel();
        let len = Arc::new(AtomicUsize::new(0));
        let shutdown = CancellationToken::new();

        let state = QueueState::new(max_messages, Arc::clone(&len));
        tokio::spawn(run_worker(state, rx, shutdown.clone()));

        Self {
            events,
            next_waiter: AtomicU64::new(0),
            len,
            shutdown,
        }
    }

    async fn put_message(&self, message: String) -> Result<(), BrokerError> {
        let (ack, verdict) = oneshot::channel();
        if self.events.send(QueueEvent::Put { message, ack }).is_err() {
            warn!("put rejected: queue worker has stopped");
            return Err(BrokerError::TooManyItems);
        }
        // A dropped ack means the worker stopped before getting to us.
        verdict.await.unwrap_or(Err(BrokerError::TooManyItems))
    }

    async fn wait_for_message(
        &self,
        deadline: Instant,
        cancel: &CancellationToken,
    ) -> Result<String, BrokerError> {
        let waiter = self.next_waiter.fetch_add(1, Ordering::Relaxed);
        let (reply, rx) = oneshot::channel();
        if self.events.send(QueueEvent::Wait { waiter, reply }).is_err() {
            return Err(BrokerError::NoMessage);
        }

        let mut pending = PendingGet {
            waiter,
            reply: rx,
            events: &self.events,
            settled: false,
        };

        // A reply already sitting in the slot beats a deadline that fired at the same time.
        let woke = tokio::select! {
            biased;
            reply = &mut pending.reply => Some(reply),
            _ = sleep_until(deadline) => None,
            _ = cancel.cancelled() => None,
        };
        let reply = match woke {
            Some(reply) => reply,
            None => pending.expire().await,
        };
        pending.settled = true;

        reply.map_err(|_| BrokerError::NoMessage)
    }
}

impl QueueBehavior for Queue {
    fn put(&self, message: String) -> BoxFuture<'_, Result<(), BrokerError>> {
        self.put_message(message).boxed()
    }

    fn get<'a>(
        &'a self,
        deadline: Instant,
        cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, Result<String, BrokerError>> {
        self.wait_for_message(deadline, cancel).boxed()
    }

    fn len(&self) -> usize {
        self.len.load(Ordering::Relaxed)
    }

    fn shutdown(&self) {
        self.shutdown.cancel();
    }
}

impl Drop for Queue {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

/// One in-flight `get`, seen from the caller's side.
///
/// If the caller's future is dropped before the outcome is known, the expiry is
/// still routed through the worker, and a message that was already handed over
/// is given back to the head of the backlog instead of being lost.
struct PendingGet<'a> {
    waiter: WaiterId,
    reply: oneshot::Receiver<String>,
    events: &'a mpsc::UnboundedSender<QueueEvent>,
    settled: bool,
}

impl PendingGet<'_> {
    /// Asks the worker to retire this waiter and waits for its decision.
    ///
    /// The worker either served us first (we get the message) or drops our reply
    /// sender while handling the expiry (we get an error).
    async fn expire(&mut self) -> Result<String, oneshot::error::RecvError> {
        let _ = self.events.send(QueueEvent::Expire {
            waiter: self.waiter,
        });
        (&mut self.reply).await
    }
}

impl Drop for PendingGet<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        let _ = self.events.send(QueueEvent::Expire {
            waiter: self.waiter,
        });
        self.reply.close();
        if let Ok(message) = self.reply.try_recv() {
            let _ = self.events.send(QueueEvent::Requeue { message });
        }
    }
}

/// State owned exclusively by the worker task.
struct QueueState {
    backlog: VecDeque<String>,
    max_messages: usize,
    waiters: HashMap<WaiterId, oneshot::Sender<String>>,
    /// Arrival order of waiters. May hold ids already retired from `waiters`.
    order: VecDeque<WaiterId>,
    len: Arc<AtomicUsize>,
}

impl QueueState {
    fn new(max_messages: usize, len: Arc<AtomicUsize>) -> Self {
        Self {
            backlog: VecDeque::new(),
            max_messages,
            waiters: HashMap::new(),
            order: VecDeque::new(),
            len,
        }
    }

    fn handle(&mut self, event: QueueEvent) {
        match event {
            QueueEvent::Put { message, ack } => {
                let verdict = if self.backlog.len() >= self.max_messages {
                    debug!(max = self.max_messages, "put rejected: queue is full");
                    Err(BrokerError::TooManyItems)
                } else {
                    self.backlog.push_back(message);
                    self.deliver();
                    Ok(())
                };
                // Publish the new length before the producer can observe success.
                self.sync_len();
                let _ = ack.send(verdict);
            }
            QueueEvent::Wait { waiter, reply } => {
                self.waiters.insert(waiter, reply);
                self.order.push_back(waiter);
                self.deliver();
            }
            QueueEvent::Expire { waiter } => {
                // Dropping the sender is what tells the consumer it got nothing.
                if self.waiters.remove(&waiter).is_some() {
                    trace!(waiter, "waiter expired");
                    self.compact_order();
                }
            }
            QueueEvent::Requeue { message } => {
                self.backlog.push_front(message);
                self.deliver();
            }
        }
        self.sync_len();
    }

    fn sync_len(&self) {
        self.len.store(self.backlog.len(), Ordering::Relaxed);
    }

    /// Pairs the oldest live waiter with the oldest message until one side runs out.
    fn deliver(&mut self) {
        while !self.backlog.is_empty() {
            let Some(waiter) = self.order.pop_front() else {
                break;
            };
            let Some(reply) = self.waiters.remove(&waiter) else {
                continue;
            };
            let Some(message) = self.backlog.pop_front() else {
                break;
            };
            self.sync_len();
            if let Err(message) = reply.send(message) {
                // Consumer left without its expiry reaching us yet.
                self.backlog.push_front(message);
                self.sync_len();
            }
        }
        if self.waiters.is_empty() {
            self.order.clear();
        }
    }

    fn compact_order(&mut self) {
        if self.waiters.is_empty() {
            self.order.clear();
        } else if self.order.len() > 2 * self.waiters.len() + ORDER_SLACK {
            let waiters = &self.waiters;
            self.order.retain(|id| waiters.contains_key(id));
        }
    }
}

async fn run_worker(
    mut state: QueueState,
    mut events: mpsc::UnboundedReceiver<QueueEvent>,
    shutdown: CancellationToken,
) {
    trace!(max = state.max_messages, "queue worker started");
    loop {
        tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            event = events.recv() => match event {
                Some(event) => state.handle(event),
                None => break,
            },
        }
    }
    debug!(
        backlog = state.backlog.len(),
        waiters = state.waiters.len(),
        "queue worker stopped"
    );
}
