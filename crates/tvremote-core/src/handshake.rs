//! Pairing handshake state machine.
//!
//! Authenticates the session with the device, obtaining a credential on first
//! use. Uses the action pattern: methods take the stored credential or an
//! inbound message as input and return actions for the driver to execute.
//! The state machine performs no I/O.
//!
//! # State Machine
//!
//! ```text
//!                  start(Some)                  1st message
//! ┌──────────────┐ ──────────> ┌──────────────────┐ (WithKey) ┌────────────┐
//! │ NoCredential │             │ AwaitingFirstAck │──────────>│ Registered │
//! └──────────────┘ ──────────> └──────────────────┘           └────────────┘
//!                  start(None)          │ 1st message (NoKey)        ^
//!                                       ↓                            │
//!                               ┌─────────────┐    2nd message       │
//!                               │ AwaitingKey │──────────────────────┘
//!                               └─────────────┘  (persist credential)
//! ```
//!
//! # Correlation
//!
//! Messages are consumed by position, not by id or type: the with-key path
//! consumes exactly one message, the no-key path exactly two, and only the
//! second one of the no-key path is inspected. Whether the device always
//! sends an acknowledgement before the key is an observed protocol fact, not
//! something this machine verifies.

use tvremote_proto::{
    InboundMessage, OutboundEnvelope, PairingResponse, ProtocolError, RegisterPayload,
};

use crate::{Credential, error::HandshakeError};

/// Actions returned by the handshake state machine.
#[derive(Debug, Clone, PartialEq)]
pub enum HandshakeAction {
    /// Write this envelope to the device
    Send(OutboundEnvelope),

    /// Persist the credential the device just granted
    PersistCredential(Credential),
}

/// Handshake state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeState {
    /// Initial state - no credential consulted, nothing sent
    NoCredential,
    /// Registration sent, waiting for the device's first acknowledgement
    AwaitingFirstAck,
    /// First acknowledgement received on the no-key path, waiting for the key
    AwaitingKey,
    /// Device authorized this client (terminal)
    Registered,
}

/// Path selected by [`Handshake::start`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakePath {
    /// A stored credential was presented
    WithKey,
    /// No stored credential; the device grants one
    NoKey,
}

impl HandshakePath {
    /// Number of inbound messages this path consumes before registering.
    pub const fn expected_messages(self) -> usize {
        match self {
            Self::WithKey => 1,
            Self::NoKey => 2,
        }
    }
}

/// Pairing handshake state machine
///
/// Lives only for the duration of pairing; once [`HandshakeState::Registered`]
/// is reached the caller keeps the credential and discards the machine.
#[derive(Debug, Clone)]
pub struct Handshake {
    state: HandshakeState,
    path: Option<HandshakePath>,
    register: RegisterPayload,
    credential: Option<Credential>,
    consumed: usize,
}

impl Handshake {
    /// Create a handshake in [`HandshakeState::NoCredential`] state.
    ///
    /// `register` is the registration template; the stored credential (if
    /// any) is embedded into it by [`Handshake::start`].
    pub fn new(register: RegisterPayload) -> Self {
        Self {
            state: HandshakeState::NoCredential,
            path: None,
            register,
            credential: None,
            consumed: 0,
        }
    }

    /// Current handshake state.
    #[must_use]
    pub fn state(&self) -> HandshakeState {
        self.state
    }

    /// Path selected at start. `None` before [`Handshake::start`].
    #[must_use]
    pub fn path(&self) -> Option<HandshakePath> {
        self.path
    }

    /// Credential in use: the stored one, or the one granted by the device.
    #[must_use]
    pub fn credential(&self) -> Option<&Credential> {
        self.credential.as_ref()
    }

    /// Inbound messages consumed so far.
    #[must_use]
    pub fn messages_consumed(&self) -> usize {
        self.consumed
    }

    /// Whether the device has authorized this client.
    #[must_use]
    pub fn is_registered(&self) -> bool {
        self.state == HandshakeState::Registered
    }

    /// Select the path from the stored credential and register.
    ///
    /// Transitions to [`HandshakeState::AwaitingFirstAck`] and returns
    /// `Send(register)`; the envelope embeds `stored` when present.
    ///
    /// # Errors
    ///
    /// - `HandshakeError::InvalidState` if not in `NoCredential` state
    /// - `HandshakeError::Protocol` if the register envelope cannot be encoded
    pub fn start(
        &mut self,
        stored: Option<Credential>,
    ) -> Result<Vec<HandshakeAction>, HandshakeError> {
        if self.state != HandshakeState::NoCredential {
            return Err(HandshakeError::InvalidState { state: self.state, operation: "start" });
        }

        let (path, envelope) = match &stored {
            Some(credential) => {
                let keyed = self.register.with_client_key(credential.as_str());
                (HandshakePath::WithKey, keyed.to_envelope()?)
            },
            None => (HandshakePath::NoKey, self.register.to_envelope()?),
        };

        tracing::info!(?path, "registering with device");

        self.path = Some(path);
        self.credential = stored;
        self.state = HandshakeState::AwaitingFirstAck;

        Ok(vec![HandshakeAction::Send(envelope)])
    }

    /// Process the next inbound message in arrival order.
    ///
    /// # Errors
    ///
    /// - `HandshakeError::InvalidState` before `start` or after registration
    /// - `HandshakeError::Protocol` if the key message does not carry a
    ///   pairing response
    pub fn handle_message(
        &mut self,
        message: &InboundMessage,
    ) -> Result<Vec<HandshakeAction>, HandshakeError> {
        match (self.state, self.path) {
            (HandshakeState::AwaitingFirstAck, Some(path)) => {
                self.consumed += 1;
                self.log_discarded(message);

                match path {
                    HandshakePath::WithKey => {
                        self.state = HandshakeState::Registered;
                        tracing::info!("registered with stored credential");
                    },
                    HandshakePath::NoKey => {
                        self.state = HandshakeState::AwaitingKey;
                        tracing::info!("waiting for pairing approval on the device");
                    },
                }
                Ok(vec![])
            },

            (HandshakeState::AwaitingKey, _) => {
                self.consumed += 1;

                let response = PairingResponse::from_message(message)?;
                let credential = Credential::new(response.client_key).ok_or_else(|| {
                    HandshakeError::Protocol(ProtocolError::MalformedPayload {
                        expected: "PairingResponse",
                        reason: "empty client-key".to_string(),
                    })
                })?;

                self.credential = Some(credential.clone());
                self.state = HandshakeState::Registered;
                tracing::info!("pairing approved; credential granted");

                Ok(vec![HandshakeAction::PersistCredential(credential)])
            },

            (state, _) => Err(HandshakeError::InvalidState { state, operation: "handle_message" }),
        }
    }

    fn log_discarded(&self, message: &InboundMessage) {
        if message.is_error() {
            tracing::warn!(
                id = %message.id,
                payload = %message.payload,
                "first acknowledgement is an error response; continuing"
            );
        } else {
            tracing::debug!(
                id = %message.id,
                message_type = %message.message_type,
                "discarding acknowledgement"
            );
        }
    }
}
