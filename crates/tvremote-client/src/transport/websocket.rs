//! Secure WebSocket transport.
//!
//! The device serves its control socket over TLS with a self-signed
//! certificate, so the connector accepts any server certificate. Handshake
//! signatures are still verified against the presented certificate.

use std::{sync::Arc, time::Duration};

use futures::{
    SinkExt, StreamExt,
    stream::{SplitSink, SplitStream},
};
use rustls::{
    DigitallySignedStruct, SignatureScheme,
    client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier},
    crypto::{self, CryptoProvider},
    pki_types::{CertificateDer, ServerName, UnixTime},
};
use tokio::net::TcpStream;
use tokio_tungstenite::{
    Connector, MaybeTlsStream, WebSocketStream, connect_async_tls_with_config,
    tungstenite::{
        self, Message,
        protocol::{CloseFrame, frame::coding::CloseCode},
    },
};

use super::{FrameSink, FrameSource, TransportError};

type DeviceStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Write half of a device WebSocket.
pub struct WebSocketSink {
    inner: SplitSink<DeviceStream, Message>,
}

/// Read half of a device WebSocket.
pub struct WebSocketSource {
    inner: SplitStream<DeviceStream>,
}

/// Connect to the device at `url` (`wss://HOST:PORT/`).
///
/// # Errors
///
/// Returns `TransportError::Connection` if the TLS configuration cannot be
/// built, the WebSocket handshake fails, or `timeout` elapses first.
pub async fn connect(
    url: &str,
    timeout: Duration,
) -> Result<(WebSocketSink, WebSocketSource), TransportError> {
    let connector = Connector::Rustls(Arc::new(insecure_client_config()?));

    tracing::debug!(url, "dialing device");
    let dial = connect_async_tls_with_config(url, None, false, Some(connector));
    let (stream, _response) = tokio::time::timeout(timeout, dial)
        .await
        .map_err(|_| TransportError::Connection(format!("timed out after {timeout:?}")))?
        .map_err(|e| TransportError::Connection(e.to_string()))?;
    tracing::debug!(url, "device connected");

    let (sink, source) = stream.split();
    Ok((WebSocketSink { inner: sink }, WebSocketSource { inner: source }))
}

impl FrameSink for WebSocketSink {
    async fn send(&mut self, frame: String) -> Result<(), TransportError> {
        self.inner.send(Message::text(frame)).await.map_err(|e| TransportError::Send(e.to_string()))
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        let frame = CloseFrame { code: CloseCode::Normal, reason: "".into() };
        self.inner
            .send(Message::Close(Some(frame)))
            .await
            .map_err(|e| TransportError::Send(e.to_string()))
    }
}

impl FrameSource for WebSocketSource {
    async fn receive(&mut self) -> Result<Vec<u8>, TransportError> {
        loop {
            let message = match self.inner.next().await {
                None
                | Some(Err(
                    tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed,
                )) => return Err(TransportError::Closed),
                Some(Err(e)) => return Err(TransportError::Receive(e.to_string())),
                Some(Ok(message)) => message,
            };

            match message {
                Message::Text(text) => return Ok(text.as_str().as_bytes().to_vec()),
                Message::Binary(data) => return Ok(data.to_vec()),
                Message::Close(frame) => {
                    tracing::debug!(?frame, "device closed the connection");
                    return Err(TransportError::Closed);
                },
                // Control frames are answered by tungstenite itself
                Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => {},
            }
        }
    }
}

/// Build a TLS client config that accepts the device's self-signed
/// certificate.
fn insecure_client_config() -> Result<rustls::ClientConfig, TransportError> {
    let provider = Arc::new(crypto::ring::default_provider());
    let verifier = Arc::new(AcceptAnyServerCert { provider: Arc::clone(&provider) });

    let config = rustls::ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .map_err(|e| TransportError::Connection(format!("TLS configuration failed: {e}")))?
        .dangerous()
        .with_custom_certificate_verifier(verifier)
        .with_no_client_auth();

    Ok(config)
}

/// Certificate verifier that trusts any server certificate but checks
/// handshake signatures.
#[derive(Debug)]
struct AcceptAnyServerCert {
    provider: Arc<CryptoProvider>,
}

impl ServerCertVerifier for AcceptAnyServerCert {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        crypto::verify_tls12_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        crypto::verify_tls13_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.provider.signature_verification_algorithms.supported_schemes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tls_config_builds_with_ring_provider() {
        let config = insecure_client_config().unwrap();
        assert!(config.alpn_protocols.is_empty());
    }

    #[tokio::test]
    async fn connect_fails_for_unreachable_device() {
        // Port 9 (discard) is closed on test hosts; the dial fails fast.
        let result = connect("wss://127.0.0.1:9/", Duration::from_secs(5)).await;

        assert!(matches!(result, Err(TransportError::Connection(_))));
    }

    #[tokio::test]
    async fn interrupt_abandons_a_stalled_dial() {
        // Accepts TCP but never answers the TLS handshake
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("wss://{}/", listener.local_addr().unwrap());
        let (handle, mut interrupt) = crate::interrupt::interrupt_channel();

        let trigger = async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            handle.trigger();
        };
        let started = std::time::Instant::now();
        let (dialed, ()) =
            tokio::join!(interrupt.guard(connect(&url, Duration::from_secs(30))), trigger);

        assert!(dialed.is_none());
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn connect_rejects_non_websocket_url() {
        let result = connect("http://127.0.0.1:9/", Duration::from_secs(5)).await;

        assert!(matches!(result, Err(TransportError::Connection(_))));
    }
}
