//! Inbound message decoding.

use std::{any, fmt};

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::ProtocolError;

/// Message received from the device.
///
/// Every field defaults when absent so that partial frames still decode. The
/// payload is kept as raw JSON and only interpreted by the consumer that
/// needs it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InboundMessage {
    /// Message type (`response`, `registered`, `error`, ...)
    #[serde(rename = "type", default)]
    pub message_type: String,
    /// Id of the request this message answers, if any
    #[serde(default)]
    pub id: String,
    /// Protocol-specific payload
    #[serde(default)]
    pub payload: Value,
}

impl InboundMessage {
    /// Decode a frame, failing on anything that is not a JSON object with
    /// well-typed envelope fields.
    pub fn decode(frame: &[u8]) -> Result<Self, ProtocolError> {
        serde_json::from_slice(frame).map_err(|e| ProtocolError::MalformedFrame(e.to_string()))
    }

    /// Decode a frame, always producing a message.
    ///
    /// When the frame is malformed the returned message keeps whichever
    /// envelope fields could be recovered (or is empty) and the decode error
    /// is returned alongside it. One frame always yields exactly one message.
    pub fn decode_lossy(frame: &[u8]) -> (Self, Option<ProtocolError>) {
        match Self::decode(frame) {
            Ok(message) => (message, None),
            Err(err) => (Self::salvage(frame), Some(err)),
        }
    }

    /// Recover well-typed fields from a frame that failed strict decoding.
    fn salvage(frame: &[u8]) -> Self {
        let Ok(Value::Object(mut fields)) = serde_json::from_slice::<Value>(frame) else {
            return Self::default();
        };

        let mut text = |key: &str| match fields.remove(key) {
            Some(Value::String(s)) => s,
            _ => String::new(),
        };
        let message_type = text("type");
        let id = text("id");
        let payload = fields.remove("payload").unwrap_or_default();

        Self { message_type, id, payload }
    }

    /// Deserialize the payload into a concrete shape.
    pub fn payload_as<T: DeserializeOwned>(&self) -> Result<T, ProtocolError> {
        T::deserialize(&self.payload).map_err(|e| ProtocolError::MalformedPayload {
            expected: short_type_name::<T>(),
            reason: e.to_string(),
        })
    }

    /// Whether the device reported a failure for the request.
    pub fn is_error(&self) -> bool {
        self.message_type == "error"
    }
}

fn short_type_name<T>() -> &'static str {
    let full = any::type_name::<T>();
    full.rsplit("::").next().unwrap_or(full)
}

/// Renders the payload as JSON rather than a byte dump, for readable logs.
impl fmt::Display for InboundMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            r#"{{"type":{},"id":{},"payload":{}}}"#,
            Value::from(self.message_type.as_str()),
            Value::from(self.id.as_str()),
            self.payload
        )
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn decodes_device_response() {
        let frame = br#"{"type":"response","id":"register_0","payload":{"pairingType":"PROMPT","returnValue":true}}"#;
        let message = InboundMessage::decode(frame).unwrap();

        assert_eq!(message.message_type, "response");
        assert_eq!(message.id, "register_0");
        assert_eq!(message.payload["returnValue"], json!(true));
    }

    #[test]
    fn missing_fields_default() {
        let message = InboundMessage::decode(br#"{"payload":{"client-key":"abc123"}}"#).unwrap();

        assert_eq!(message.message_type, "");
        assert_eq!(message.id, "");
        assert_eq!(message.payload, json!({"client-key": "abc123"}));
    }

    #[test]
    fn lossy_decode_of_garbage_is_empty() {
        let (message, err) = InboundMessage::decode_lossy(b"not json at all");

        assert_eq!(message, InboundMessage::default());
        assert!(matches!(err, Some(ProtocolError::MalformedFrame(_))));
    }

    #[test]
    fn lossy_decode_keeps_well_typed_fields() {
        let (message, err) = InboundMessage::decode_lossy(br#"{"type":"response","id":7,"payload":[1]}"#);

        assert!(err.is_some());
        assert_eq!(message.message_type, "response");
        assert_eq!(message.id, "");
        assert_eq!(message.payload, json!([1]));
    }

    #[test]
    fn payload_as_reports_expected_shape() {
        #[derive(Debug, Deserialize)]
        struct Volume {
            #[allow(dead_code)]
            volume: u8,
        }

        let message = InboundMessage { payload: json!({"muted": true}), ..Default::default() };
        let err = message.payload_as::<Volume>().unwrap_err();

        assert!(matches!(err, ProtocolError::MalformedPayload { expected: "Volume", .. }));
    }

    #[test]
    fn display_renders_payload_json() {
        let message = InboundMessage {
            message_type: "error".into(),
            id: "q\"1".into(),
            payload: json!({"errorCode": -1000}),
        };

        assert!(message.is_error());
        assert_eq!(message.to_string(), r#"{"type":"error","id":"q\"1","payload":{"errorCode":-1000}}"#);
    }
}
