//! Fuzz target for inbound frame decoding
//!
//! # Invariants
//!
//! - `decode_lossy` always yields exactly one message and NEVER panics
//! - When strict decoding succeeds, lossy decoding returns the same message
//!   and no error
//! - Pairing response extraction returns an error, never panics, and never
//!   accepts an empty key

#![no_main]

use libfuzzer_sys::fuzz_target;
use tvremote_proto::{InboundMessage, PairingResponse};

fuzz_target!(|data: &[u8]| {
    let (lossy, error) = InboundMessage::decode_lossy(data);

    match InboundMessage::decode(data) {
        Ok(strict) => {
            assert!(error.is_none());
            assert_eq!(strict, lossy);
        },
        Err(_) => assert!(error.is_some()),
    }

    if let Ok(response) = PairingResponse::from_message(&lossy) {
        assert!(!response.client_key.is_empty());
    }

    // Display must render for any message
    let _ = lossy.to_string();
});
