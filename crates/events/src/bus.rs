//! Change publishing/subscription abstraction (mechanics only).
//!
//! The bus distributes [`StorageEvent`](crate::StorageEvent)s (or any other
//! message) to every current subscriber:
//!
//! - **Broadcast**: each subscription receives its own copy of every message
//! - **No replay**: subscribers only see messages published after they subscribed
//! - **No persistence**: the store is the source of truth; notifications are hints
//!
//! Consumers must therefore be idempotent and re-read the store on each
//! notification rather than trusting the payload alone.

use std::sync::Arc;
use std::sync::mpsc::Receiver;
use std::time::Duration;

/// A subscription to a change stream.
///
/// ## Usage Pattern
///
/// ```ignore
/// let subscription = store.subscribe();
///
/// loop {
///     match subscription.recv_timeout(Duration::from_millis(250)) {
///         Ok(change) => react(change)?,
///         Err(std::sync::mpsc::RecvTimeoutError::Timeout) => continue,  // check for shutdown
///         Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => break, // store dropped
///     }
/// }
/// ```
///
/// Subscriptions are meant to be drained by a single thread.
#[derive(Debug)]
pub struct Subscription<M> {
    receiver: Receiver<M>,
}

impl<M> Subscription<M> {
    pub fn new(receiver: Receiver<M>) -> Self {
        Self { receiver }
    }

    /// Block until the next message is available.
    pub fn recv(&self) -> Result<M, std::sync::mpsc::RecvError> {
        self.receiver.recv()
    }

    /// Try to receive a message without blocking.
    pub fn try_recv(&self) -> Result<M, std::sync::mpsc::TryRecvError> {
        self.receiver.try_recv()
    }

    /// Block for up to `timeout` waiting for a message.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<M, std::sync::mpsc::RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }

    /// Drain everything currently queued without blocking.
    pub fn drain(&self) -> Vec<M> {
        self.receiver.try_iter().collect()
    }
}

/// Transport-agnostic pub/sub for change notifications.
///
/// `publish()` can fail (e.g. a poisoned lock); the caller decides whether a
/// failed notification matters. For store writes it does not: the write
/// already happened and subscribers re-read state anyway.
pub trait ChangeBus<M>: Send + Sync {
    type Error: core::fmt::Debug + Send + Sync + 'static;

    fn publish(&self, message: M) -> Result<(), Self::Error>;

    fn subscribe(&self) -> Subscription<M>;
}

impl<M, B> ChangeBus<M> for Arc<B>
where
    B: ChangeBus<M> + ?Sized,
{
    type Error = B::Error;

    fn publish(&self, message: M) -> Result<(), Self::Error> {
        (**self).publish(message)
    }

    fn subscribe(&self) -> Subscription<M> {
        (**self).subscribe()
    }
}
