//! Property-based tests for command builders.

use proptest::prelude::*;
use tvremote_proto::{
    EnvelopeType, InboundMessage,
    commands::{self, LAUNCH_URI},
};

proptest! {
    #[test]
    fn prop_discriminator_only_changes_id(a in any::<u32>(), b in any::<u32>()) {
        prop_assume!(a != b);

        let first = commands::service_menu(a);
        let second = commands::service_menu(b);

        prop_assert_ne!(first.id(), second.id());
        prop_assert_eq!(first.kind(), second.kind());
        prop_assert_eq!(first.uri(), second.uri());
        prop_assert_eq!(first.payload(), second.payload());
    }

    #[test]
    fn prop_same_discriminator_is_deterministic(seq in any::<u32>()) {
        prop_assert_eq!(commands::service_menu(seq), commands::service_menu(seq));
    }

    #[test]
    fn prop_encoded_envelope_keeps_envelope_fields(seq in any::<u32>(), app in "[a-z.]{1,24}") {
        let envelope = commands::launch("launch", seq, &app, None);
        let encoded = envelope.encode().unwrap();

        // The device echoes request ids, so an encoded request must read back
        // with the same id through the inbound decoder.
        let echoed = InboundMessage::decode(encoded.as_bytes()).unwrap();
        prop_assert_eq!(echoed.id, commands::request_id("launch", seq));
        prop_assert_eq!(echoed.message_type, "request");
        prop_assert_eq!(envelope.kind(), EnvelopeType::Request);
        prop_assert_eq!(envelope.uri(), Some(LAUNCH_URI));
    }

    #[test]
    fn prop_lossy_decode_never_fails(frame in prop::collection::vec(any::<u8>(), 0..256)) {
        let (message, err) = InboundMessage::decode_lossy(&frame);

        if err.is_none() {
            prop_assert_eq!(Some(message), InboundMessage::decode(&frame).ok());
        }
    }
}
