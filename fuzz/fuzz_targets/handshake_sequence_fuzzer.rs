//! Fuzz target for the pairing handshake
//!
//! Drives the state machine with an arbitrary stored credential followed by
//! arbitrary device frames.
//!
//! # Invariants
//!
//! - The path is `WithKey` iff a credential was stored
//! - Registration happens after exactly `expected_messages()` messages
//! - At most one credential is persisted, and only on the no-key path
//! - Messages after registration are rejected, never panic

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use tvremote_core::{Credential, Handshake, HandshakeAction, HandshakePath};
use tvremote_proto::{InboundMessage, RegisterPayload};

#[derive(Debug, Arbitrary)]
struct Scenario {
    stored: Option<String>,
    frames: Vec<Frame>,
}

#[derive(Debug, Arbitrary)]
enum Frame {
    Raw(Vec<u8>),
    Grant(String),
    Ack { message_type: String, id: String },
}

impl Frame {
    fn to_bytes(&self) -> Vec<u8> {
        match self {
            Self::Raw(bytes) => bytes.clone(),
            Self::Grant(key) => serde_json::json!({"payload": {"client-key": key}})
                .to_string()
                .into_bytes(),
            Self::Ack { message_type, id } => {
                serde_json::json!({"type": message_type, "id": id}).to_string().into_bytes()
            },
        }
    }
}

fuzz_target!(|scenario: Scenario| {
    let stored = scenario.stored.and_then(Credential::new);
    let had_credential = stored.is_some();

    let mut handshake = Handshake::new(RegisterPayload::new(serde_json::json!({})));
    let Ok(actions) = handshake.start(stored) else {
        return;
    };
    assert_eq!(actions.len(), 1);

    let path = handshake.path();
    assert_eq!(path == Some(HandshakePath::WithKey), had_credential);

    let mut persisted = 0;
    for frame in &scenario.frames {
        let (message, _) = InboundMessage::decode_lossy(&frame.to_bytes());
        let was_registered = handshake.is_registered();

        match handshake.handle_message(&message) {
            Ok(actions) => {
                assert!(!was_registered);
                persisted += actions
                    .iter()
                    .filter(|a| matches!(a, HandshakeAction::PersistCredential(_)))
                    .count();
            },
            Err(_) if was_registered => {},
            // Undecodable pairing response: the run is over
            Err(_) => return,
        }

        if handshake.is_registered() {
            if let Some(path) = path {
                assert_eq!(handshake.messages_consumed(), path.expected_messages());
            }
        }
    }

    assert!(persisted <= 1);
    if had_credential {
        assert_eq!(persisted, 0);
    }
});
