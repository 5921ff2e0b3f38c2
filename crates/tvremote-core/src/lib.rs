//! Core
//!
//! Sans-IO pairing logic for the webOS remote-control protocol.
//!
//! # Architecture
//!
//! The [`Handshake`] state machine never touches the network or the disk. The
//! caller feeds it the stored credential and each inbound message; it returns
//! [`HandshakeAction`]s (send an envelope, persist a credential) for the
//! caller to execute. This keeps the protocol contract testable without a
//! device.
//!
//! # Components
//!
//! - [`Handshake`]: Pairing state machine
//! - [`Credential`]: Opaque pairing secret granted by the device
//! - [`CredentialStore`]: Load/save capability for the credential
//! - [`FileCredentialStore`] / [`MemoryCredentialStore`]: Store implementations

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod credential;
pub mod error;
mod handshake;
pub mod store;

pub use credential::Credential;
pub use error::{CredentialError, HandshakeError};
pub use handshake::{Handshake, HandshakeAction, HandshakePath, HandshakeState};
pub use store::{CredentialStore, FileCredentialStore, MemoryCredentialStore};
