//! Pairing handshake payloads.
//!
//! The client registers by sending a `register` envelope whose payload carries
//! a signed application manifest and, once paired, the client key the device
//! granted. A first-time registration makes the device prompt the user; after
//! approval the device answers with a [`PairingResponse`].

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{InboundMessage, OutboundEnvelope, ProtocolError};

/// Id used for the registration envelope.
pub const REGISTER_ID: &str = "register_0";

/// Pairing mode where the device shows an on-screen approval prompt.
const PAIRING_TYPE_PROMPT: &str = "PROMPT";

const EMBEDDED_MANIFEST: &str = include_str!("../resources/manifest.json");

/// Application manifest bundled with the crate.
pub fn default_manifest() -> Result<Value, ProtocolError> {
    serde_json::from_str(EMBEDDED_MANIFEST).map_err(|e| ProtocolError::MalformedPayload {
        expected: "manifest",
        reason: e.to_string(),
    })
}

/// Payload of the registration envelope.
#[derive(Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterPayload {
    force_pairing: bool,
    pairing_type: &'static str,
    #[serde(rename = "client-key", skip_serializing_if = "Option::is_none")]
    client_key: Option<String>,
    manifest: Value,
}

impl RegisterPayload {
    /// Registration without a client key, using `manifest`.
    pub fn new(manifest: Value) -> Self {
        Self { force_pairing: false, pairing_type: PAIRING_TYPE_PROMPT, client_key: None, manifest }
    }

    /// Registration without a client key, using the bundled manifest.
    pub fn with_default_manifest() -> Result<Self, ProtocolError> {
        default_manifest().map(Self::new)
    }

    /// Copy of this payload that presents `client_key`.
    #[must_use]
    pub fn with_client_key(&self, client_key: &str) -> Self {
        Self { client_key: Some(client_key.to_string()), ..self.clone() }
    }

    /// Client key presented by this payload.
    pub fn client_key(&self) -> Option<&str> {
        self.client_key.as_deref()
    }

    /// Manifest presented by this payload.
    pub fn manifest(&self) -> &Value {
        &self.manifest
    }

    /// Wrap into the registration envelope.
    pub fn to_envelope(&self) -> Result<OutboundEnvelope, ProtocolError> {
        let payload = serde_json::to_value(self).map_err(|e| ProtocolError::Encode(e.to_string()))?;
        Ok(OutboundEnvelope::register(REGISTER_ID, payload))
    }
}

impl fmt::Debug for RegisterPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterPayload")
            .field("force_pairing", &self.force_pairing)
            .field("pairing_type", &self.pairing_type)
            .field("client_key", &self.client_key.as_ref().map(|_| "<redacted>"))
            .finish_non_exhaustive()
    }
}

/// Payload carrying the client key granted after the user approves pairing.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct PairingResponse {
    /// Key to present on every later registration
    #[serde(rename = "client-key")]
    pub client_key: String,
}

impl PairingResponse {
    /// Decode the pairing response carried by `message`.
    pub fn from_message(message: &InboundMessage) -> Result<Self, ProtocolError> {
        let response: Self = message.payload_as()?;
        if response.client_key.is_empty() {
            return Err(ProtocolError::MalformedPayload {
                expected: "PairingResponse",
                reason: "empty client-key".to_string(),
            });
        }
        Ok(response)
    }
}

impl fmt::Debug for PairingResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PairingResponse").field("client_key", &"<redacted>").finish()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::EnvelopeType;

    #[test]
    fn bundled_manifest_parses() {
        let manifest = default_manifest().unwrap();

        assert_eq!(manifest["manifestVersion"], json!(1));
        assert!(manifest["permissions"].as_array().is_some_and(|p| !p.is_empty()));
    }

    #[test]
    fn first_registration_has_no_key() {
        let envelope = RegisterPayload::new(json!({})).to_envelope().unwrap();

        assert_eq!(envelope.id(), REGISTER_ID);
        assert_eq!(envelope.kind(), EnvelopeType::Register);
        assert_eq!(
            envelope.payload(),
            &json!({"forcePairing": false, "pairingType": "PROMPT", "manifest": {}})
        );
    }

    #[test]
    fn keyed_registration_embeds_key() {
        let template = RegisterPayload::new(json!({"manifestVersion": 1}));
        let keyed = template.with_client_key("abc123");

        assert_eq!(template.client_key(), None);
        assert_eq!(keyed.client_key(), Some("abc123"));
        assert_eq!(keyed.manifest(), template.manifest());

        let envelope = keyed.to_envelope().unwrap();
        assert_eq!(envelope.payload()["client-key"], json!("abc123"));
    }

    #[test]
    fn debug_never_prints_client_key() {
        let keyed = RegisterPayload::new(json!({})).with_client_key("secret-key");
        let response = PairingResponse { client_key: "secret-key".into() };

        assert!(!format!("{keyed:?}").contains("secret-key"));
        assert!(!format!("{response:?}").contains("secret-key"));
    }

    #[test]
    fn pairing_response_from_registered_message() {
        let message = InboundMessage {
            message_type: "registered".into(),
            id: REGISTER_ID.into(),
            payload: json!({"client-key": "abc123"}),
        };

        let response = PairingResponse::from_message(&message).unwrap();
        assert_eq!(response.client_key, "abc123");
    }

    #[test]
    fn pairing_response_rejects_missing_or_empty_key() {
        let prompt = InboundMessage {
            payload: json!({"pairingType": "PROMPT", "returnValue": true}),
            ..Default::default()
        };
        let empty = InboundMessage { payload: json!({"client-key": ""}), ..Default::default() };

        assert!(matches!(
            PairingResponse::from_message(&prompt),
            Err(ProtocolError::MalformedPayload { expected: "PairingResponse", .. })
        ));
        assert!(matches!(
            PairingResponse::from_message(&empty),
            Err(ProtocolError::MalformedPayload { expected: "PairingResponse", .. })
        ));
    }
}
