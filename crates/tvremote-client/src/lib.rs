//! Client
//!
//! Async runtime for the webOS remote-control protocol: connects to the
//! device, drives the pairing [`Handshake`](tvremote_core::Handshake), then
//! issues commands and observes device messages until interrupted.
//!
//! # Architecture
//!
//! Two tasks share nothing but the dispatch queue:
//!
//! ```text
//! Transport ──> receive loop ──> Dispatcher ═══> Inbox ──> Session (pair, run)
//!     ^                                                        │
//!     └──────────────────── CommandIssuer <────────────────────┘
//! ```
//!
//! The receive loop owns the read half of the transport; the [`Session`] owns
//! the write half (through the [`CommandIssuer`]) and the consumer end of the
//! queue. Channels are created per session and injected, so every component
//! can be driven in isolation with the [`transport::memory`] transport.
//!
//! # Components
//!
//! - [`Session`]: Handshake driver and main loop
//! - [`CommandIssuer`]: Fire-and-forget sends and id-correlated requests
//! - [`dispatch_queue`]: Ordered handoff from the receive loop
//! - [`run_receive_loop`]: Frame reader
//! - [`interrupt_channel`]: External shutdown signal
//! - [`transport`]: WebSocket and in-memory transports

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod config;
mod dispatch;
mod error;
mod interrupt;
mod issuer;
mod receiver;
mod session;
pub mod transport;

pub use config::{ClientConfig, DEFAULT_CONNECT_TIMEOUT, DEFAULT_PORT};
pub use dispatch::{Dispatcher, Inbox, PendingRequests, dispatch_queue};
pub use error::ClientError;
pub use interrupt::{Interrupt, InterruptHandle, interrupt_channel};
pub use issuer::CommandIssuer;
pub use receiver::{ReceiveExit, run_receive_loop};
pub use session::{PairingOutcome, SHUTDOWN_GRACE, Session};
pub use transport::TransportError;
