//! Dispatch queue between the receive loop and the control flow.
//!
//! Single producer ([`Dispatcher`], owned by the receive loop), single
//! consumer ([`Inbox`], owned by the session). Messages are yielded in the
//! exact order their frames arrived; nothing is reordered, batched or
//! deduplicated.
//!
//! # Correlation
//!
//! Callers that want the response to a specific request register its id in
//! [`PendingRequests`] before sending. A message whose id matches a pending
//! entry is handed to that waiter instead of the ordered queue. Unmatched
//! messages keep strict FIFO order.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use tokio::sync::{mpsc, oneshot};
use tvremote_proto::InboundMessage;

use crate::{ClientError, transport::TransportError};

type QueueItem = Result<InboundMessage, TransportError>;

/// Create a connected dispatcher and inbox.
pub fn dispatch_queue() -> (Dispatcher, Inbox) {
    let (tx, rx) = mpsc::unbounded_channel();
    let pending = PendingRequests::default();

    (Dispatcher { queue: tx, pending: pending.clone() }, Inbox { queue: rx, pending })
}

/// Table of requests awaiting a response, keyed by envelope id.
///
/// Clones share the same table.
#[derive(Debug, Clone, Default)]
pub struct PendingRequests {
    inner: Arc<Mutex<PendingInner>>,
}

#[derive(Debug, Default)]
struct PendingInner {
    waiters: HashMap<String, oneshot::Sender<InboundMessage>>,
    closed: bool,
}

impl PendingRequests {
    /// Register interest in the response to `id`.
    ///
    /// # Errors
    ///
    /// - `ClientError::DuplicateRequest` if `id` is already pending
    /// - `ClientError::Transport(Closed)` if the queue is closed
    pub fn register(
        &self,
        id: impl Into<String>,
    ) -> Result<oneshot::Receiver<InboundMessage>, ClientError> {
        let id = id.into();
        let mut inner = self.lock();

        if inner.closed {
            return Err(TransportError::Closed.into());
        }
        if inner.waiters.contains_key(&id) {
            return Err(ClientError::DuplicateRequest(id));
        }

        let (tx, rx) = oneshot::channel();
        inner.waiters.insert(id, tx);
        Ok(rx)
    }

    /// Stop waiting for `id`. Returns true if it was pending.
    pub fn cancel(&self, id: &str) -> bool {
        self.lock().waiters.remove(id).is_some()
    }

    /// Number of requests awaiting a response.
    pub fn len(&self) -> usize {
        self.lock().waiters.len()
    }

    /// Whether no request is awaiting a response.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn take(&self, id: &str) -> Option<oneshot::Sender<InboundMessage>> {
        if id.is_empty() {
            return None;
        }
        self.lock().waiters.remove(id)
    }

    /// Refuse new registrations and release every waiter.
    fn close(&self) {
        let mut inner = self.lock();
        inner.closed = true;
        inner.waiters.clear();
    }

    fn lock(&self) -> MutexGuard<'_, PendingInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Producer half of the dispatch queue.
///
/// Dropping it closes the queue: the inbox yields `TransportError::Closed`
/// once drained and every pending waiter is released.
#[derive(Debug)]
pub struct Dispatcher {
    queue: mpsc::UnboundedSender<QueueItem>,
    pending: PendingRequests,
}

impl Dispatcher {
    /// Route one message to its waiter or the ordered queue.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::Closed` if the inbox has been dropped.
    pub fn deliver(&self, message: InboundMessage) -> Result<(), TransportError> {
        let message = match self.pending.take(&message.id) {
            Some(waiter) => match waiter.send(message) {
                Ok(()) => return Ok(()),
                // Waiter gave up between lookup and delivery
                Err(message) => message,
            },
            None => message,
        };

        self.queue.send(Ok(message)).map_err(|_| TransportError::Closed)
    }

    /// Deliver a terminal transport error and close the queue.
    pub fn fail(self, error: TransportError) {
        let _ = self.queue.send(Err(error));
    }
}

impl Drop for Dispatcher {
    fn drop(&mut self) {
        self.pending.close();
    }
}

/// Consumer half of the dispatch queue.
#[derive(Debug)]
pub struct Inbox {
    queue: mpsc::UnboundedReceiver<QueueItem>,
    pending: PendingRequests,
}

impl Inbox {
    /// Next message in arrival order.
    ///
    /// # Errors
    ///
    /// Returns the terminal transport error reported by the receive loop, then
    /// `TransportError::Closed` on every later call.
    pub async fn next(&mut self) -> Result<InboundMessage, TransportError> {
        self.queue.recv().await.unwrap_or(Err(TransportError::Closed))
    }

    /// Shared pending-request table.
    pub fn pending(&self) -> PendingRequests {
        self.pending.clone()
    }
}
