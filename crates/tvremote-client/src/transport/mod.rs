//! Duplex transport to the device.
//!
//! The transport is split into two halves so the receive loop can own the
//! read side while the control flow owns the write side. Implementations:
//!
//! - [`websocket`]: Secure WebSocket to a real device
//! - [`memory`]: In-process channels for tests and simulation

use std::future::Future;

use thiserror::Error;

pub mod memory;
pub mod websocket;

/// Transport errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Connection could not be established.
    #[error("connection failed: {0}")]
    Connection(String),

    /// Frame could not be written.
    #[error("send failed: {0}")]
    Send(String),

    /// Frame could not be read.
    #[error("receive failed: {0}")]
    Receive(String),

    /// Transport is closed.
    #[error("transport closed")]
    Closed,
}

impl TransportError {
    /// Returns true if this error only reports that the transport is closed.
    ///
    /// A closed transport is the expected outcome of shutdown and is not
    /// logged as a failure.
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }
}

/// Write half of the transport.
///
/// Exactly one owner writes at a time, so implementations need no internal
/// write lock.
pub trait FrameSink: Send {
    /// Write one text frame.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport is closed or the write fails.
    fn send(&mut self, frame: String) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Send the protocol close frame.
    ///
    /// # Errors
    ///
    /// Returns an error if the close frame cannot be written.
    fn close(&mut self) -> impl Future<Output = Result<(), TransportError>> + Send;
}

/// Read half of the transport.
pub trait FrameSource: Send {
    /// Read the next frame.
    ///
    /// Returns `TransportError::Closed` once the transport is closed.
    fn receive(&mut self) -> impl Future<Output = Result<Vec<u8>, TransportError>> + Send;
}
