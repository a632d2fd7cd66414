//! Error types for the BiDi engine.
//!
//! This module defines the local error type used throughout the crate.
//! Errors that a peer sent on the wire are carried as
//! [`ProtocolError`](crate::protocol::ProtocolError) inside [`Error::Protocol`].
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use bidi_engine::{Result, protocol::session};
//!
//! async fn example(connection: &Connection) -> Result<()> {
//!     let status = connection.send(session::Status::default()).await?;
//!     assert!(status.ready);
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Configuration | [`Error::Config`], [`Error::InvalidPattern`] |
//! | Schema | [`Error::Schema`], [`Error::UnknownType`], [`Error::Decode`] |
//! | Validation | [`Error::Validation`], [`Error::InvalidArgument`] |
//! | Protocol | [`Error::Protocol`], [`Error::UnknownCommand`] |
//! | Correlation | [`Error::DuplicateCommandId`], [`Error::TooManyPending`], [`Error::RequestTimeout`] |
//! | Connection | [`Error::Connection`], [`Error::SessionClosed`] |
//! | External | [`Error::Io`], [`Error::Json`], [`Error::WebSocket`], [`Error::ChannelClosed`] |

// ============================================================================
// Imports
// ============================================================================

use std::io::Error as IoError;
use std::result::Result as StdResult;

use thiserror::Error;
use tokio::sync::oneshot::error::RecvError;
use tokio_tungstenite::tungstenite::Error as WsError;

use crate::identifiers::CommandId;
use crate::protocol::{ErrorCode, ProtocolError};
use crate::validator::Violation;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// Each variant includes relevant context for debugging.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when connection options are invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// Event method pattern is malformed.
    #[error("Invalid event pattern: {pattern}")]
    InvalidPattern {
        /// The rejected pattern.
        pattern: String,
    },

    // ========================================================================
    // Schema Errors
    // ========================================================================
    /// Schema definitions are inconsistent.
    ///
    /// Returned while building the registry. Never surfaced to peers.
    #[error("Schema error: {message}")]
    Schema {
        /// Description of the inconsistency.
        message: String,
    },

    /// Schema type name is not registered.
    #[error("Unknown schema type: {name}")]
    UnknownType {
        /// The unresolved type name.
        name: String,
    },

    /// Typed model disagrees with a value that passed validation.
    #[error("Decode error at {path}: {source}")]
    Decode {
        /// Path of the offending field.
        path: String,
        /// Underlying serde error.
        source: serde_json::Error,
    },

    // ========================================================================
    // Validation Errors
    // ========================================================================
    /// Value does not conform to its schema.
    #[error("Validation failed: {0}")]
    Validation(#[from] Violation),

    /// Invalid argument supplied by the caller.
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Description of the invalid argument.
        message: String,
    },

    // ========================================================================
    // Protocol Errors
    // ========================================================================
    /// Structured error reported by the peer or mapped by the engine.
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Command method is not part of the schema.
    #[error("Unknown command: {method}")]
    UnknownCommand {
        /// The unrecognized command method.
        method: String,
    },

    // ========================================================================
    // Correlation Errors
    // ========================================================================
    /// Command id is already pending.
    #[error("Command id {id} is already pending")]
    DuplicateCommandId {
        /// The reused id.
        id: CommandId,
    },

    /// Too many commands awaiting a response.
    #[error("Too many pending commands: {pending}/{max}")]
    TooManyPending {
        /// Commands currently pending.
        pending: usize,
        /// Configured maximum.
        max: usize,
    },

    /// Command timed out waiting for its response.
    #[error("Command {id} timed out after {timeout_ms}ms")]
    RequestTimeout {
        /// The abandoned command id.
        id: CommandId,
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    // ========================================================================
    // Connection Errors
    // ========================================================================
    /// Transport failure.
    #[error("Connection failed: {message}")]
    Connection {
        /// Description of the connection error.
        message: String,
    },

    /// Session ended while the operation was outstanding.
    #[error("Session closed")]
    SessionClosed,

    // ========================================================================
    // External Errors
    // ========================================================================
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] WsError),

    /// Channel receive error.
    #[error("Channel closed")]
    ChannelClosed(#[from] RecvError),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a schema definition error.
    #[inline]
    pub fn schema(message: impl Into<String>) -> Self {
        Self::Schema {
            message: message.into(),
        }
    }

    /// Creates an unknown type error.
    #[inline]
    pub fn unknown_type(name: impl Into<String>) -> Self {
        Self::UnknownType { name: name.into() }
    }

    /// Creates an invalid argument error.
    #[inline]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Creates an unknown command error.
    #[inline]
    pub fn unknown_command(method: impl Into<String>) -> Self {
        Self::UnknownCommand {
            method: method.into(),
        }
    }

    /// Creates a connection error.
    #[inline]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates a request timeout error.
    #[inline]
    pub fn request_timeout(id: CommandId, timeout_ms: u64) -> Self {
        Self::RequestTimeout { id, timeout_ms }
    }

    /// Creates a decode error from a path-tracking serde error.
    pub(crate) fn decode(err: serde_path_to_error::Error<serde_json::Error>) -> Self {
        Self::Decode {
            path: err.path().to_string(),
            source: err.into_inner(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a timeout error.
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::RequestTimeout { .. })
    }

    /// Returns `true` if this is a connection error.
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::Connection { .. } | Self::SessionClosed | Self::WebSocket(_)
        )
    }

    /// Returns `true` if the peer reported this error.
    #[inline]
    #[must_use]
    pub fn is_protocol_error(&self) -> bool {
        matches!(self, Self::Protocol(_))
    }

    /// Returns `true` if this error is recoverable.
    ///
    /// Recoverable errors leave the session usable.
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            Self::Connection { .. }
                | Self::SessionClosed
                | Self::WebSocket(_)
                | Self::ChannelClosed(_)
                | Self::Schema { .. }
        )
    }

    /// Returns the protocol error code this error maps to.
    #[inline]
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        self.to_protocol_error().code
    }
}

// ============================================================================
// Tests
// ============================================================================
