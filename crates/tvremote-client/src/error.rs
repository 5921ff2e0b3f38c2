//! Client error types.

use std::time::Duration;

use thiserror::Error;
use tvremote_core::{CredentialError, HandshakeError};
use tvremote_proto::ProtocolError;

use crate::transport::TransportError;

/// Errors that can occur while talking to the device.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// Socket-level failure (connect, read or write).
    ///
    /// Fatal during connect and pairing. `TransportError::Closed` after an
    /// interrupt is the expected shutdown path.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Frame or payload could not be decoded or encoded.
    #[error("decode error: {0}")]
    Decode(#[from] ProtocolError),

    /// Credential could not be persisted.
    #[error("credential error: {0}")]
    Credential(#[from] CredentialError),

    /// Handshake driven out of order. Indicates a bug in the driver.
    #[error("handshake error: {0}")]
    Handshake(HandshakeError),

    /// No response arrived for a correlated request in time.
    #[error("no response to {id} within {elapsed:?}")]
    Timeout {
        /// Id of the request that went unanswered
        id: String,
        /// How long the request waited
        elapsed: Duration,
    },

    /// A request with this id is already awaiting its response.
    #[error("request {0} is already pending")]
    DuplicateRequest(String),

    /// Invalid configuration (unreadable manifest, ...).
    #[error("configuration error: {0}")]
    Config(String),
}

impl ClientError {
    /// Returns true if the error only reports a closed transport.
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Transport(e) if e.is_closed())
    }
}

impl From<HandshakeError> for ClientError {
    fn from(err: HandshakeError) -> Self {
        match err {
            HandshakeError::Protocol(e) => Self::Decode(e),
            other @ HandshakeError::InvalidState { .. } => Self::Handshake(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use tvremote_core::HandshakeState;

    use super::*;

    #[test]
    fn handshake_decode_failures_flatten_into_decode() {
        let protocol = ProtocolError::MalformedPayload {
            expected: "PairingResponse",
            reason: "missing field".into(),
        };

        let err = ClientError::from(HandshakeError::Protocol(protocol.clone()));

        assert_eq!(err, ClientError::Decode(protocol));
    }

    #[test]
    fn invalid_state_stays_a_handshake_error() {
        let err = ClientError::from(HandshakeError::InvalidState {
            state: HandshakeState::Registered,
            operation: "handle_message",
        });

        assert!(matches!(err, ClientError::Handshake(_)));
    }

    #[test]
    fn closed_detection() {
        assert!(ClientError::Transport(TransportError::Closed).is_closed());
        assert!(!ClientError::Transport(TransportError::Receive("reset".into())).is_closed());
        assert!(!ClientError::DuplicateRequest("a".into()).is_closed());
    }
}
