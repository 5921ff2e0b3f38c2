//! Command issuer.
//!
//! Owns the write half of the transport. Sends are fire-and-forget;
//! [`CommandIssuer::request`] additionally waits for the response carrying the
//! same id, bounded by a timeout.
//!
//! An issuer bound to an [`Interrupt`] refuses every envelope once it fires.
//! Only the close frame may follow.

use std::time::Duration;

use tvremote_proto::{InboundMessage, OutboundEnvelope};

use crate::{
    ClientError,
    dispatch::PendingRequests,
    interrupt::Interrupt,
    transport::{FrameSink, TransportError},
};

/// Writes envelopes to the device.
///
/// Only one owner writes at a time, so the sink needs no lock.
#[derive(Debug)]
pub struct CommandIssuer<S> {
    sink: S,
    pending: PendingRequests,
    interrupt: Option<Interrupt>,
    closed: bool,
}

impl<S: FrameSink> CommandIssuer<S> {
    /// Create an issuer writing to `sink`, correlating through `pending`.
    pub fn new(sink: S, pending: PendingRequests) -> Self {
        Self { sink, pending, interrupt: None, closed: false }
    }

    /// Refuse sends once `interrupt` has fired.
    #[must_use]
    pub fn interruptible(mut self, interrupt: Interrupt) -> Self {
        self.interrupt = Some(interrupt);
        self
    }

    /// Whether the close frame has been sent.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn accepts_sends(&self) -> bool {
        !self.closed && !self.interrupt.as_ref().is_some_and(Interrupt::is_fired)
    }

    /// Serialize and write one envelope. Does not wait for a response.
    ///
    /// # Errors
    ///
    /// - `ClientError::Transport(Closed)` after [`CommandIssuer::close`] or
    ///   once the bound interrupt has fired
    /// - `ClientError::Decode` if the envelope cannot be serialized
    /// - `ClientError::Transport` if the write fails
    pub async fn send(&mut self, envelope: &OutboundEnvelope) -> Result<(), ClientError> {
        if !self.accepts_sends() {
            tracing::debug!(id = envelope.id(), "send refused, issuer closed or interrupted");
            return Err(TransportError::Closed.into());
        }

        let frame = envelope.encode()?;
        tracing::debug!(id = envelope.id(), uri = envelope.uri().unwrap_or(""), "sending");
        self.sink.send(frame).await?;
        Ok(())
    }

    /// Send `envelope` and wait for the message with the same id.
    ///
    /// The id stays registered only while this future is alive; dropping it
    /// early releases the id for a retry.
    ///
    /// # Errors
    ///
    /// - `ClientError::DuplicateRequest` if the id is already awaited
    /// - `ClientError::Timeout` if nothing arrives within `timeout`
    /// - `ClientError::Transport(Closed)` if the connection ends first
    /// - any error from [`CommandIssuer::send`]
    pub async fn request(
        &mut self,
        envelope: &OutboundEnvelope,
        timeout: Duration,
    ) -> Result<InboundMessage, ClientError> {
        let id = envelope.id().to_string();
        let waiter = self.pending.register(id.clone())?;
        let _registration = Registration { pending: self.pending.clone(), id: id.clone() };

        self.send(envelope).await?;

        match tokio::time::timeout(timeout, waiter).await {
            Ok(Ok(message)) => Ok(message),
            Ok(Err(_)) => Err(TransportError::Closed.into()),
            Err(_) => {
                tracing::warn!(%id, ?timeout, "request timed out");
                Err(ClientError::Timeout { id, elapsed: timeout })
            },
        }
    }

    /// Send the protocol close frame. Later sends fail without touching the
    /// transport; closing twice is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Transport` if the close frame cannot be written.
    pub async fn close(&mut self) -> Result<(), ClientError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.sink.close().await?;
        tracing::debug!("close frame sent");
        Ok(())
    }
}

/// Unregisters a request id when its `request` future ends, however it ends.
struct Registration {
    pending: PendingRequests,
    id: String,
}

impl Drop for Registration {
    fn drop(&mut self) {
        if self.pending.cancel(&self.id) {
            tracing::trace!(id = %self.id, "request id released");
        }
    }
}
