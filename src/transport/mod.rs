//! Frame transport layer.
//!
//! The engine sees a transport as two halves moving whole text frames, one
//! protocol message per frame. It never inspects frame boundaries or
//! connection state beyond "closed".
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   FrameSink::send    ┌──────────────┐
//! │  Event loop  │─────────────────────►│              │
//! │  (Router)    │                      │     Peer     │
//! │              │◄─────────────────────│              │
//! └──────────────┘  FrameSource::recv   └──────────────┘
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `websocket` | `tokio-tungstenite` client and server adapter |
//! | `channel` | In-memory pair for tests and in-process peers |

// ============================================================================
// Submodules
// ============================================================================

/// In-memory transport pair.
pub mod channel;

/// WebSocket transport.
pub mod websocket;

// ============================================================================
// Imports
// ============================================================================

use async_trait::async_trait;

use crate::error::Result;

// ============================================================================
// Re-exports
// ============================================================================

pub use channel::{ChannelTransport, PeerEnd, pair};
pub use websocket::WebSocketTransport;

// ============================================================================
// Traits
// ============================================================================

/// Outgoing half of a transport.
#[async_trait]
pub trait FrameSink: Send {
    /// Writes one frame.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport is closed or broken.
    async fn send(&mut self, frame: String) -> Result<()>;

    /// Closes the outgoing half.
    ///
    /// # Errors
    ///
    /// Returns an error if the close handshake fails.
    async fn close(&mut self) -> Result<()>;
}

/// Incoming half of a transport.
#[async_trait]
pub trait FrameSource: Send {
    /// Reads the next frame, or `None` once the peer has closed.
    ///
    /// Must be cancel safe: the event loop polls it inside `select!`.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport is broken.
    async fn recv(&mut self) -> Result<Option<String>>;
}

/// Duplex frame transport.
pub trait Transport: Send + 'static {
    /// Splits into independently owned halves.
    fn split(self) -> (Box<dyn FrameSink>, Box<dyn FrameSource>);
}
