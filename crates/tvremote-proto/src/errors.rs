//! Protocol error types.

use thiserror::Error;

/// Errors produced while encoding or decoding protocol messages.
///
/// Decoding failures are fatal during the pairing handshake and isolated
/// per-message afterwards; the caller decides which applies.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Frame is not a JSON object with the expected envelope fields
    #[error("malformed frame: {0}")]
    MalformedFrame(String),

    /// Payload does not match the shape required by the current step
    #[error("malformed payload: expected {expected}: {reason}")]
    MalformedPayload {
        /// Name of the expected payload shape
        expected: &'static str,
        /// Decoder message
        reason: String,
    },

    /// Envelope could not be serialized
    #[error("encode failed: {0}")]
    Encode(String),
}
