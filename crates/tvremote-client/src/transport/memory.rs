//! In-process transport for tests and simulation.
//!
//! [`pair`] returns the two client halves plus a [`Device`] handle that plays
//! the television: it pushes inbound frames, injects read failures, and
//! observes everything the client writes, including the close frame.

use tokio::sync::mpsc;

use super::{FrameSink, FrameSource, TransportError};

type InboundFrame = Result<Vec<u8>, TransportError>;

/// Something the client wrote to the memory transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outgoing {
    /// Text frame
    Text(String),
    /// Protocol close frame
    Close,
}

impl Outgoing {
    /// Text of the frame, if this is a text frame.
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Close => None,
        }
    }
}

/// Create a connected memory transport.
pub fn pair() -> (MemorySink, MemorySource, Device) {
    let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
    let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();

    let sink = MemorySink { outbound: outbound_tx, loopback: inbound_tx.clone(), closed: false };
    let source = MemorySource { inbound: inbound_rx };
    let device = Device { inbound: inbound_tx, outbound: outbound_rx };

    (sink, source, device)
}

/// Write half of the memory transport.
#[derive(Debug)]
pub struct MemorySink {
    outbound: mpsc::UnboundedSender<Outgoing>,
    loopback: mpsc::UnboundedSender<InboundFrame>,
    closed: bool,
}

impl FrameSink for MemorySink {
    async fn send(&mut self, frame: String) -> Result<(), TransportError> {
        if self.closed {
            return Err(TransportError::Closed);
        }
        self.outbound.send(Outgoing::Text(frame)).map_err(|_| TransportError::Closed)
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        if self.closed {
            return Err(TransportError::Closed);
        }
        self.closed = true;
        self.outbound.send(Outgoing::Close).map_err(|_| TransportError::Closed)?;

        // Frames already queued are still read before the closure
        let _ = self.loopback.send(Err(TransportError::Closed));
        Ok(())
    }
}

/// Read half of the memory transport.
#[derive(Debug)]
pub struct MemorySource {
    inbound: mpsc::UnboundedReceiver<InboundFrame>,
}

impl FrameSource for MemorySource {
    async fn receive(&mut self) -> Result<Vec<u8>, TransportError> {
        self.inbound.recv().await.unwrap_or(Err(TransportError::Closed))
    }
}

/// Device side of the memory transport.
#[derive(Debug)]
pub struct Device {
    inbound: mpsc::UnboundedSender<InboundFrame>,
    outbound: mpsc::UnboundedReceiver<Outgoing>,
}

impl Device {
    /// Queue a frame for the client to read.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::Closed` if the client's read half is gone.
    pub fn push(&self, frame: impl Into<Vec<u8>>) -> Result<(), TransportError> {
        self.inbound.send(Ok(frame.into())).map_err(|_| TransportError::Closed)
    }

    /// Make the client's next read (after queued frames) fail with `error`.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::Closed` if the client's read half is gone.
    pub fn fail(&self, error: TransportError) -> Result<(), TransportError> {
        self.inbound.send(Err(error)).map_err(|_| TransportError::Closed)
    }

    /// Close the connection from the device side.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::Closed` if the client's read half is gone.
    pub fn hang_up(&self) -> Result<(), TransportError> {
        self.fail(TransportError::Closed)
    }

    /// Wait for the next thing the client writes.
    ///
    /// Returns `None` once the client's write half is dropped and everything
    /// it wrote has been observed.
    pub async fn next_sent(&mut self) -> Option<Outgoing> {
        self.outbound.recv().await
    }

    /// Next thing the client wrote, without waiting.
    pub fn try_sent(&mut self) -> Option<Outgoing> {
        self.outbound.try_recv().ok()
    }

    /// Everything the client wrote so far, oldest first.
    pub fn drain_sent(&mut self) -> Vec<Outgoing> {
        std::iter::from_fn(|| self.try_sent()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn frames_flow_both_ways() {
        let (mut sink, mut source, mut device) = pair();

        device.push("hello").unwrap();
        assert_eq!(source.receive().await.unwrap(), b"hello");

        sink.send("world".to_string()).await.unwrap();
        assert_eq!(device.next_sent().await, Some(Outgoing::Text("world".to_string())));
    }

    #[tokio::test]
    async fn close_is_observed_after_queued_frames() {
        let (mut sink, mut source, mut device) = pair();

        device.push("late").unwrap();
        sink.close().await.unwrap();

        assert_eq!(source.receive().await.unwrap(), b"late");
        assert_eq!(source.receive().await, Err(TransportError::Closed));
        assert_eq!(device.drain_sent(), vec![Outgoing::Close]);
    }

    #[tokio::test]
    async fn writes_after_close_fail_without_reaching_the_device() {
        let (mut sink, _source, mut device) = pair();

        sink.close().await.unwrap();

        assert_eq!(sink.send("x".to_string()).await, Err(TransportError::Closed));
        assert_eq!(sink.close().await, Err(TransportError::Closed));
        assert_eq!(device.drain_sent(), vec![Outgoing::Close]);
    }

    #[tokio::test]
    async fn injected_failure_is_returned_in_order() {
        let (_sink, mut source, device) = pair();

        device.push("first").unwrap();
        device.fail(TransportError::Receive("reset".into())).unwrap();

        assert_eq!(source.receive().await.unwrap(), b"first");
        assert_eq!(source.receive().await, Err(TransportError::Receive("reset".into())));
    }

    #[test]
    fn outgoing_text_accessor() {
        assert_eq!(Outgoing::Text("a".into()).text(), Some("a"));
        assert_eq!(Outgoing::Close.text(), None);
    }
}
