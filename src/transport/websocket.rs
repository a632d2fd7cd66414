//! WebSocket transport over `tokio-tungstenite`.
//!
//! | Role | Entry point |
//! |------|-------------|
//! | Client (local end) | [`WebSocketTransport::connect`] |
//! | Server (remote end) | [`WebSocketTransport::accept`] |
//! | Existing stream | [`WebSocketTransport::from_stream`] |
//!
//! Only text frames carry messages. Ping/pong is handled by tungstenite;
//! binary frames are ignored.

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, trace, warn};
use url::Url;

use crate::error::{Error, Result};

use super::{FrameSink, FrameSource, Transport};

// ============================================================================
// Constants
// ============================================================================

/// Timeout for the opening handshake.
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(30);

// ============================================================================
// WebSocketTransport
// ============================================================================

/// A WebSocket carrying one protocol message per text frame.
#[derive(Debug)]
pub struct WebSocketTransport<S = MaybeTlsStream<TcpStream>> {
    stream: WebSocketStream<S>,
}

impl WebSocketTransport {
    /// Connects to a `ws://` endpoint.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if the URL is not a plain `ws` URL
    /// - [`Error::Connection`] if the handshake times out
    /// - [`Error::WebSocket`] if the handshake fails
    pub async fn connect(url: &str) -> Result<Self> {
        let url = parse_endpoint(url)?;
        debug!(%url, "Connecting WebSocket");

        let (stream, response) = timeout(HANDSHAKE_TIMEOUT, tokio_tungstenite::connect_async(url.as_str()))
            .await
            .map_err(|_| Error::connection(format!("handshake with {url} timed out")))??;

        debug!(status = %response.status(), "WebSocket connected");
        Ok(Self { stream })
    }
}

impl WebSocketTransport<TcpStream> {
    /// Accepts one client on `listener`.
    ///
    /// # Errors
    ///
    /// - [`Error::Connection`] if no client arrives in time
    /// - [`Error::Io`] if accepting the TCP connection fails
    /// - [`Error::WebSocket`] if the handshake fails
    pub async fn accept(listener: &TcpListener) -> Result<Self> {
        let (stream, addr) = timeout(HANDSHAKE_TIMEOUT, listener.accept())
            .await
            .map_err(|_| Error::connection("no WebSocket client connected in time"))??;
        debug!(?addr, "TCP connection accepted");

        let stream = tokio_tungstenite::accept_async(stream).await?;
        debug!(?addr, "WebSocket handshake complete");
        Ok(Self { stream })
    }
}

impl<S> WebSocketTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    /// Wraps an already established WebSocket.
    #[inline]
    #[must_use]
    pub fn from_stream(stream: WebSocketStream<S>) -> Self {
        Self { stream }
    }
}

impl<S> Transport for WebSocketTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    fn split(self) -> (Box<dyn FrameSink>, Box<dyn FrameSource>) {
        let (sink, source) = self.stream.split();
        (
            Box::new(WebSocketSink { sink }),
            Box::new(WebSocketSource { source }),
        )
    }
}

// ============================================================================
// Halves
// ============================================================================

struct WebSocketSink<S> {
    sink: SplitSink<WebSocketStream<S>, WsMessage>,
}

#[async_trait]
impl<S> FrameSink for WebSocketSink<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    async fn send(&mut self, frame: String) -> Result<()> {
        trace!(len = frame.len(), "Frame out");
        self.sink.send(WsMessage::Text(frame.into())).await?;
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.sink.close().await?;
        Ok(())
    }
}

struct WebSocketSource<S> {
    source: SplitStream<WebSocketStream<S>>,
}

#[async_trait]
impl<S> FrameSource for WebSocketSource<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    async fn recv(&mut self) -> Result<Option<String>> {
        loop {
            match self.source.next().await {
                Some(Ok(WsMessage::Text(text))) => {
                    trace!(len = text.len(), "Frame in");
                    return Ok(Some(text.as_str().to_owned()));
                }
                Some(Ok(WsMessage::Binary(bytes))) => {
                    warn!(len = bytes.len(), "Binary frame ignored");
                }
                Some(Ok(WsMessage::Close(frame))) => {
                    debug!(?frame, "Close frame received");
                    return Ok(None);
                }
                Some(Ok(_)) => {}
                Some(Err(err)) => return Err(err.into()),
                None => return Ok(None),
            }
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Parses and checks a client endpoint URL.
fn parse_endpoint(raw: &str) -> Result<Url> {
    let url = Url::parse(raw).map_err(|err| Error::config(format!("invalid URL {raw}: {err}")))?;
    match url.scheme() {
        "ws" => {}
        "wss" => return Err(Error::config("wss endpoints need a TLS-enabled build")),
        other => return Err(Error::config(format!("unsupported scheme {other}"))),
    }
    if url.host_str().is_none() {
        return Err(Error::config(format!("URL {raw} has no host")));
    }
    Ok(url)
}

// ============================================================================
// Tests
// ============================================================================
