//! In-memory transport.
//!
//! [`pair`] returns a transport for a [`Connection`](crate::Connection) and
//! the [`PeerEnd`] that plays the other side. Either end dropping closes the
//! direction it was sending on.

// ============================================================================
// Imports
// ============================================================================

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::error::{Error, Result};

use super::{FrameSink, FrameSource, Transport};

// ============================================================================
// Pair
// ============================================================================

/// Creates a connected transport and peer.
#[must_use]
pub fn pair() -> (ChannelTransport, PeerEnd) {
    let (to_peer, from_local) = mpsc::unbounded_channel();
    let (to_local, from_peer) = mpsc::unbounded_channel();
    (
        ChannelTransport {
            outbound: to_peer,
            inbound: from_peer,
        },
        PeerEnd {
            outbound: to_local,
            inbound: from_local,
        },
    )
}

// ============================================================================
// ChannelTransport
// ============================================================================

/// Local half of an in-memory pair.
#[derive(Debug)]
pub struct ChannelTransport {
    outbound: mpsc::UnboundedSender<String>,
    inbound: mpsc::UnboundedReceiver<String>,
}

impl Transport for ChannelTransport {
    fn split(self) -> (Box<dyn FrameSink>, Box<dyn FrameSource>) {
        (
            Box::new(ChannelSink {
                outbound: Some(self.outbound),
            }),
            Box::new(ChannelSource {
                inbound: self.inbound,
            }),
        )
    }
}

struct ChannelSink {
    outbound: Option<mpsc::UnboundedSender<String>>,
}

#[async_trait]
impl FrameSink for ChannelSink {
    async fn send(&mut self, frame: String) -> Result<()> {
        let outbound = self
            .outbound
            .as_ref()
            .ok_or_else(|| Error::connection("channel sink closed"))?;
        outbound
            .send(frame)
            .map_err(|_| Error::connection("channel peer dropped"))
    }

    async fn close(&mut self) -> Result<()> {
        self.outbound = None;
        Ok(())
    }
}

struct ChannelSource {
    inbound: mpsc::UnboundedReceiver<String>,
}

#[async_trait]
impl FrameSource for ChannelSource {
    async fn recv(&mut self) -> Result<Option<String>> {
        Ok(self.inbound.recv().await)
    }
}

// ============================================================================
// PeerEnd
// ============================================================================

/// Remote half of an in-memory pair.
#[derive(Debug)]
pub struct PeerEnd {
    outbound: mpsc::UnboundedSender<String>,
    inbound: mpsc::UnboundedReceiver<String>,
}

impl PeerEnd {
    /// Sends a raw frame to the local side.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Connection`] if the local side is gone.
    pub fn send(&self, frame: impl Into<String>) -> Result<()> {
        self.outbound
            .send(frame.into())
            .map_err(|_| Error::connection("channel transport dropped"))
    }

    /// Sends a JSON value as one frame.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Connection`] if the local side is gone.
    pub fn send_json(&self, value: &Value) -> Result<()> {
        self.send(value.to_string())
    }

    /// Receives the next frame from the local side.
    pub async fn recv(&mut self) -> Option<String> {
        self.inbound.recv().await
    }

    /// Receives and parses the next frame.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] if the frame is not JSON.
    pub async fn recv_json(&mut self) -> Result<Option<Value>> {
        match self.inbound.recv().await {
            Some(frame) => Ok(Some(serde_json::from_str(&frame)?)),
            None => Ok(None),
        }
    }

    /// Turns the peer into a transport, e.g. for a second connection.
    #[must_use]
    pub fn into_transport(self) -> ChannelTransport {
        ChannelTransport {
            outbound: self.outbound,
            inbound: self.inbound,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;
    use tokio_test::{assert_err, assert_ok};

    #[tokio::test]
    async fn test_frames_flow_both_ways() {
        let (transport, mut peer) = pair();
        let (mut sink, mut source) = transport.split();

        sink.send("to-peer".to_string()).await.expect("send");
        assert_eq!(peer.recv().await.as_deref(), Some("to-peer"));

        assert_ok!(peer.send_json(&json!({"id": 1})));
        assert_eq!(source.recv().await.expect("recv").as_deref(), Some(r#"{"id":1}"#));
    }

    #[tokio::test]
    async fn test_close_ends_peer_stream() {
        let (transport, mut peer) = pair();
        let (mut sink, _source) = transport.split();

        assert_ok!(sink.close().await);
        assert!(peer.recv().await.is_none());
        assert_err!(sink.send("late".to_string()).await);
    }

    #[tokio::test]
    async fn test_dropped_peer_ends_source() {
        let (transport, peer) = pair();
        let (_sink, mut source) = transport.split();
        drop(peer);
        assert!(source.recv().await.expect("recv").is_none());
    }

    #[tokio::test]
    async fn test_recv_json_rejects_garbage() {
        let (transport, mut peer) = pair();
        let (mut sink, _source) = transport.split();
        sink.send("{not json".to_string()).await.expect("send");
        assert_err!(peer.recv_json().await);
    }
}
