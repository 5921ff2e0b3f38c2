//! Wire model for the webOS remote-control protocol (SSAP).
//!
//! Every message on the device socket is a JSON text frame. Outbound traffic
//! is wrapped in an [`OutboundEnvelope`] (id, type, target URI, payload);
//! inbound traffic is decoded into an [`InboundMessage`] whose payload stays
//! as an untyped JSON value until a consumer asks for a concrete shape.
//!
//! # Components
//!
//! - [`OutboundEnvelope`]: Immutable request wrapper written to the device
//! - [`InboundMessage`]: Tolerant decoding of every frame the device sends
//! - [`RegisterPayload`] / [`PairingResponse`]: Pairing handshake payloads
//! - [`commands`]: Builders for device capabilities (app launch, service menu)
//!
//! This crate performs no I/O.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod commands;
mod envelope;
mod errors;
mod inbound;
mod pairing;

pub use envelope::{EnvelopeType, OutboundEnvelope};
pub use errors::ProtocolError;
pub use inbound::InboundMessage;
pub use pairing::{PairingResponse, REGISTER_ID, RegisterPayload, default_manifest};
