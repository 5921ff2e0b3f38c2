//! Session: handshake driver and main loop.
//!
//! ```text
//!          open()            pair()              run()
//! ┌──────────────────┐   ┌───────────┐   ┌─────────────────┐   ┌────────────┐
//! │ receive loop     │──>│ Handshake │──>│ Running         │──>│ Terminated │
//! │ spawned          │   │           │   │ (inbound: hook) │   │            │
//! └──────────────────┘   └───────────┘   └─────────────────┘   └────────────┘
//!                              │ interrupt         ^ interrupt: close frame
//!                              └───────────────────┴──────────────────────>
//! ```
//!
//! Control flow is sequential: at any time either the handshake or the main
//! loop consumes the inbox and writes to the transport, never both. Each
//! wait selects over the inbox and the interrupt, with the interrupt
//! polled first.

use std::time::Duration;

use tokio::task::JoinHandle;
use tvremote_core::{
    Credential, CredentialStore, Handshake, HandshakeAction, HandshakeError, HandshakePath,
};
use tvremote_proto::{InboundMessage, RegisterPayload};

use crate::{
    ClientError,
    dispatch::{Inbox, dispatch_queue},
    interrupt::Interrupt,
    issuer::CommandIssuer,
    receiver::{ReceiveExit, run_receive_loop},
    transport::{FrameSink, FrameSource, TransportError},
};

/// How long [`Session::finish`] waits for the receive loop to exit.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(1);

/// Result of [`Session::pair`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PairingOutcome {
    /// Device authorized this client
    Registered {
        /// Path the handshake took
        path: HandshakePath,
        /// Credential in use for the session
        credential: Credential,
    },
    /// Interrupt fired before registration; the close frame was sent
    Interrupted,
}

/// Connected session with a running receive loop.
pub struct Session<S> {
    issuer: CommandIssuer<S>,
    inbox: Inbox,
    interrupt: Interrupt,
    receiver: JoinHandle<ReceiveExit>,
}

impl<S: FrameSink> Session<S> {
    /// Wire up a session and spawn the receive loop on `source`.
    ///
    /// Must be called within a tokio runtime.
    pub fn open<R>(sink: S, source: R, interrupt: Interrupt) -> Self
    where
        R: FrameSource + 'static,
    {
        let (dispatcher, inbox) = dispatch_queue();
        let issuer = CommandIssuer::new(sink, inbox.pending()).interruptible(interrupt.clone());
        let receiver = tokio::spawn(run_receive_loop(source, dispatcher));

        Self { issuer, inbox, interrupt, receiver }
    }

    /// Command issuer for post-handshake traffic.
    pub fn issuer_mut(&mut self) -> &mut CommandIssuer<S> {
        &mut self.issuer
    }

    /// Whether the interrupt has fired. The issuer refuses sends from then on.
    pub fn is_interrupted(&self) -> bool {
        self.interrupt.is_fired()
    }

    /// Whether the receive loop is still running.
    pub fn is_receiving(&self) -> bool {
        !self.receiver.is_finished()
    }

    /// Run the pairing handshake.
    ///
    /// An unreadable stored credential is logged and treated as absent. If the
    /// interrupt has already fired, nothing but the close frame is sent.
    ///
    /// # Errors
    ///
    /// Every error is fatal for the run:
    /// - `ClientError::Transport` if the connection fails or closes
    /// - `ClientError::Decode` if the pairing response is malformed
    /// - `ClientError::Credential` if the granted credential cannot be saved
    pub async fn pair<C>(
        &mut self,
        store: &C,
        register: RegisterPayload,
    ) -> Result<PairingOutcome, ClientError>
    where
        C: CredentialStore + ?Sized,
    {
        if self.interrupt.is_fired() {
            return self.abandon_pairing().await;
        }

        let stored = match store.load() {
            Ok(stored) => stored,
            Err(e) => {
                tracing::warn!(
                    location = %store.location(),
                    error = %e,
                    "stored credential unreadable, pairing from scratch"
                );
                None
            },
        };

        let mut handshake = Handshake::new(register);
        let actions = handshake.start(stored)?;
        match self.execute(actions, store).await {
            Err(e) if e.is_closed() && self.interrupt.is_fired() => {
                return self.abandon_pairing().await;
            },
            other => other?,
        }

        while !handshake.is_registered() {
            let Some(next) = self.next_or_interrupt().await else {
                return self.abandon_pairing().await;
            };

            let actions = handshake.handle_message(&next?)?;
            match self.execute(actions, store).await {
                Err(e) if e.is_closed() && self.interrupt.is_fired() => {
                    return self.abandon_pairing().await;
                },
                other => other?,
            }
        }

        match (handshake.path(), handshake.credential()) {
            (Some(path), Some(credential)) => {
                Ok(PairingOutcome::Registered { path, credential: credential.clone() })
            },
            _ => Err(HandshakeError::InvalidState {
                state: handshake.state(),
                operation: "complete",
            }
            .into()),
        }
    }

    /// Main loop: service inbound messages until the interrupt fires, then
    /// send the close frame.
    ///
    /// Inbound messages never end the loop. If the connection drops, the loop
    /// keeps waiting for the interrupt.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Transport` if the close frame cannot be written
    /// to a connection that was still open.
    pub async fn run(&mut self) -> Result<(), ClientError> {
        let mut connected = true;

        loop {
            tokio::select! {
                biased;

                () = self.interrupt.fired() => break,
                next = self.inbox.next(), if connected => match next {
                    Ok(message) => on_inbound(&message),
                    Err(e) => {
                        if e.is_closed() {
                            tracing::info!("device closed the connection, waiting for interrupt");
                        } else {
                            tracing::warn!(error = %e, "connection lost, waiting for interrupt");
                        }
                        connected = false;
                    },
                },
            }
        }

        tracing::info!("interrupted, closing connection");
        match self.issuer.close().await {
            Err(ClientError::Transport(e)) if !connected => {
                tracing::debug!(error = %e, "close frame not delivered, connection already gone");
                Ok(())
            },
            other => other,
        }
    }

    /// Give the receive loop a grace period to observe the closure, then
    /// abort it. Returns how the loop exited, if it did.
    pub async fn finish(self) -> Option<ReceiveExit> {
        let Self { issuer, inbox, mut receiver, .. } = self;
        drop(issuer);
        drop(inbox);

        match tokio::time::timeout(SHUTDOWN_GRACE, &mut receiver).await {
            Ok(Ok(exit)) => Some(exit),
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "receive loop failed");
                None
            },
            Err(_) => {
                tracing::debug!("receive loop still running after grace period, aborting");
                receiver.abort();
                None
            },
        }
    }

    async fn next_or_interrupt(&mut self) -> Option<Result<InboundMessage, TransportError>> {
        self.interrupt.guard(self.inbox.next()).await
    }

    async fn abandon_pairing(&mut self) -> Result<PairingOutcome, ClientError> {
        tracing::info!("interrupted during pairing");
        self.issuer.close().await?;
        Ok(PairingOutcome::Interrupted)
    }

    async fn execute<C>(
        &mut self,
        actions: Vec<HandshakeAction>,
        store: &C,
    ) -> Result<(), ClientError>
    where
        C: CredentialStore + ?Sized,
    {
        for action in actions {
            match action {
                HandshakeAction::Send(envelope) => self.issuer.send(&envelope).await?,
                HandshakeAction::PersistCredential(credential) => {
                    store.save(&credential)?;
                    tracing::info!(location = %store.location(), "credential saved");
                },
            }
        }
        Ok(())
    }
}

/// Hook for post-handshake traffic. Only logs.
fn on_inbound(message: &InboundMessage) {
    if message.is_error() {
        tracing::warn!(%message, "device reported an error");
    } else {
        tracing::debug!(%message, "inbound message");
    }
}

#[cfg(test)]
mod tests {
    use tvremote_core::MemoryCredentialStore;

    use super::*;
    use crate::{
        interrupt::interrupt_channel,
        transport::memory::{self, Outgoing},
    };

    #[tokio::test]
    async fn interrupt_before_pairing_sends_only_the_close_frame() {
        let (sink, source, mut device) = memory::pair();
        let (handle, interrupt) = interrupt_channel();
        let mut session = Session::open(sink, source, interrupt);
        handle.trigger();

        let outcome = session
            .pair(&MemoryCredentialStore::new(), RegisterPayload::new(serde_json::json!({})))
            .await
            .unwrap();

        assert_eq!(outcome, PairingOutcome::Interrupted);
        assert_eq!(device.drain_sent(), vec![Outgoing::Close]);
        assert_eq!(session.finish().await, Some(ReceiveExit::Closed));
    }

    #[tokio::test]
    async fn run_keeps_waiting_after_device_hangs_up() {
        let (sink, source, mut device) = memory::pair();
        let (handle, interrupt) = interrupt_channel();
        let mut session = Session::open(sink, source, interrupt);
        device.hang_up().unwrap();

        let run = session.run();
        tokio::pin!(run);
        let early = tokio::time::timeout(Duration::from_millis(50), &mut run).await;
        assert!(early.is_err());

        handle.trigger();
        run.await.unwrap();
        assert_eq!(device.drain_sent(), vec![Outgoing::Close]);
    }
}
