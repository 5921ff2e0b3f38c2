//! Outbound envelope.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ProtocolError;

/// Value of the envelope `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvelopeType {
    /// Capability invocation addressed by `uri`
    Request,
    /// Pairing registration (carries no `uri`)
    Register,
}

/// Request wrapper written to the device.
///
/// Fields are private: an envelope is never mutated after construction.
/// Serialized field order is `id`, `type`, `uri`, `payload`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutboundEnvelope {
    id: String,
    #[serde(rename = "type")]
    kind: EnvelopeType,
    #[serde(skip_serializing_if = "Option::is_none")]
    uri: Option<String>,
    payload: Value,
}

impl OutboundEnvelope {
    /// Build a `request` envelope for the capability at `uri`.
    pub fn request(id: impl Into<String>, uri: impl Into<String>, payload: Value) -> Self {
        Self { id: id.into(), kind: EnvelopeType::Request, uri: Some(uri.into()), payload }
    }

    /// Build a `register` envelope used by the pairing handshake.
    pub fn register(id: impl Into<String>, payload: Value) -> Self {
        Self { id: id.into(), kind: EnvelopeType::Register, uri: None, payload }
    }

    /// Request id, unique per request.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Envelope type.
    pub fn kind(&self) -> EnvelopeType {
        self.kind
    }

    /// Target capability. `None` for registration envelopes.
    pub fn uri(&self) -> Option<&str> {
        self.uri.as_deref()
    }

    /// Protocol-specific payload.
    pub fn payload(&self) -> &Value {
        &self.payload
    }

    /// Serialize to the JSON text sent in a single frame.
    pub fn encode(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self).map_err(|e| ProtocolError::Encode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn request_wire_shape() {
        let envelope =
            OutboundEnvelope::request("volume_1", "ssap://audio/setVolume", json!({"volume": 5}));

        insta::assert_snapshot!(
            envelope.encode().unwrap(),
            @r#"{"id":"volume_1","type":"request","uri":"ssap://audio/setVolume","payload":{"volume":5}}"#
        );
    }

    #[test]
    fn register_omits_uri() {
        let envelope = OutboundEnvelope::register("register_0", json!({}));

        assert_eq!(envelope.kind(), EnvelopeType::Register);
        assert_eq!(envelope.uri(), None);
        insta::assert_snapshot!(
            envelope.encode().unwrap(),
            @r#"{"id":"register_0","type":"register","payload":{}}"#
        );
    }
}
