//! Error types for the pairing core.
//!
//! Handshake errors are unrecoverable for the current run: there is no retry
//! path. Credential errors are split by direction because the caller treats
//! them differently (a failed read falls back to full pairing, a failed write
//! aborts it).

use thiserror::Error;
use tvremote_proto::ProtocolError;

use crate::handshake::HandshakeState;

/// Errors raised by the handshake state machine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HandshakeError {
    /// Operation is not valid in the current state
    #[error("invalid state transition: cannot {operation} from {state:?}")]
    InvalidState {
        /// Current state when the error occurred
        state: HandshakeState,
        /// Operation that was attempted
        operation: &'static str,
    },

    /// Pairing payload could not be decoded
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

/// Errors raised while loading or saving the credential.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CredentialError {
    /// Stored credential could not be read
    #[error("failed to read credential from {location}: {reason}")]
    Read {
        /// Where the credential lives
        location: String,
        /// Underlying failure
        reason: String,
    },

    /// Credential could not be persisted
    #[error("failed to write credential to {location}: {reason}")]
    Write {
        /// Where the credential lives
        location: String,
        /// Underlying failure
        reason: String,
    },

    /// Stored credential is not valid UTF-8 text
    #[error("credential at {location} is not valid UTF-8")]
    Encoding {
        /// Where the credential lives
        location: String,
    },
}

impl CredentialError {
    /// Returns true if this error happened while reading.
    ///
    /// Read-side failures mean "no usable credential": the handshake falls
    /// through to full pairing instead of aborting.
    pub fn is_read_side(&self) -> bool {
        matches!(self, Self::Read { .. } | Self::Encoding { .. })
    }
}
