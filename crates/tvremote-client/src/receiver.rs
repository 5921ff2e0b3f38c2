//! Receive loop.
//!
//! Pulls frames off the transport for the lifetime of the connection and
//! forwards one [`InboundMessage`] per frame to the dispatch queue. A frame
//! that fails to decode still produces a (best-effort) message so positional
//! consumers see the same message count as frames on the wire.

use tvremote_proto::InboundMessage;

use crate::{
    dispatch::Dispatcher,
    transport::{FrameSource, TransportError},
};

/// Why the receive loop stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReceiveExit {
    /// Transport closed (expected during shutdown)
    Closed,
    /// Transport read failed; the error was forwarded to the consumer
    Failed(TransportError),
    /// Consumer dropped the inbox
    ConsumerGone,
}

/// Run the receive loop until the transport closes or fails.
///
/// The dispatcher is consumed: when the loop exits the queue closes.
pub async fn run_receive_loop<R: FrameSource>(
    mut source: R,
    dispatcher: Dispatcher,
) -> ReceiveExit {
    loop {
        let frame = match source.receive().await {
            Ok(frame) => frame,
            Err(e) if e.is_closed() => {
                tracing::debug!("transport closed, receive loop exiting");
                return ReceiveExit::Closed;
            },
            Err(e) => {
                tracing::error!(error = %e, "transport read failed");
                dispatcher.fail(e.clone());
                return ReceiveExit::Failed(e);
            },
        };

        let (message, decode_error) = InboundMessage::decode_lossy(&frame);
        match decode_error {
            Some(e) => tracing::warn!(error = %e, %message, "malformed frame, forwarding anyway"),
            None => tracing::debug!(%message, "received"),
        }

        if dispatcher.deliver(message).is_err() {
            tracing::debug!("inbox dropped, receive loop exiting");
            return ReceiveExit::ConsumerGone;
        }
    }
}
