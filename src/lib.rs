//! BiDi Engine - WebDriver BiDi schema validation and command correlation.
//!
//! This library validates, encodes and decodes WebDriver BiDi messages
//! against the protocol's declared type schema, and correlates asynchronous
//! command/response pairs over a long-lived duplex connection.
//!
//! # Architecture
//!
//! ```text
//! outbound: typed value ─► serde ─► self-check ─► transport
//! inbound:  transport ─► JSON ─► classify ─► validate ─► decode ─┬─► correlator
//!                                                                └─► dispatcher
//! ```
//!
//! Key design principles:
//!
//! - The schema lives in one immutable [`SchemaRegistry`], built once
//! - Every inbound message is validated before it is decoded
//! - Each [`Connection`] owns one event-loop task; no shared mutable state
//! - Callers get either a validated typed result or a [`ProtocolError`]
//!
//! # Quick Start
//!
//! ```no_run
//! use bidi_engine::{Connection, ConnectionOptions, Result};
//! use bidi_engine::protocol::{browsing_context, session};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let connection =
//!         Connection::connect("ws://127.0.0.1:9222/session", ConnectionOptions::new()).await?;
//!
//!     let status = connection.send(session::Status::default()).await?;
//!     println!("ready: {}", status.ready);
//!
//!     let tree = connection
//!         .send(browsing_context::GetTreeParameters::default())
//!         .await?;
//!     for context in &tree.contexts {
//!         println!("{} {}", context.context, context.url);
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`schema`] | Schema nodes and the type registry |
//! | [`validator`] | Structural validation with error paths |
//! | [`codec`] | Validating encode/decode |
//! | [`protocol`] | Typed messages for every namespace |
//! | [`correlator`] | Pending-command bookkeeping |
//! | [`dispatcher`] | Event subscriptions |
//! | [`router`] | Synchronous per-session routing core |
//! | [`connection`] | Async session handle and event loop |
//! | [`transport`] | WebSocket and in-memory transports |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Type-safe ID wrappers |

// ============================================================================
// Modules
// ============================================================================

/// Validating encode/decode between JSON and typed values.
pub mod codec;

/// Session connection and event loop.
///
/// Use [`Connection::new`] with any [`transport::Transport`], or
/// [`Connection::connect`] for a WebSocket endpoint.
pub mod connection;

/// Pending-command bookkeeping.
pub mod correlator;

/// Event subscriptions and fan-out.
pub mod dispatcher;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Type-safe identifiers.
///
/// Newtype wrappers prevent mixing incompatible IDs at compile time.
pub mod identifiers;

/// Typed protocol messages.
///
/// One module per protocol namespace, plus the message envelopes and the
/// command and event tables.
pub mod protocol;

/// Synchronous message router.
pub mod router;

/// Schema nodes and the built-in type registry.
pub mod schema;

/// Frame transports.
pub mod transport;

/// Structural validation.
pub mod validator;

// ============================================================================
// Re-exports
// ============================================================================

// Schema types
pub use codec::Codec;
pub use schema::{SchemaNode, SchemaRegistry};
pub use validator::{Path, Reason, ValidationResult, Validator, Violation};

// Session types
pub use connection::{
    CommandHandler, CommandTicket, Connection, ConnectionOptions, ConnectionStats, EventStream,
};
pub use dispatcher::MethodPattern;

// Protocol types
pub use protocol::{
    Command, CommandData, CommandType, ErrorCode, Event, EventData, Message, ProtocolError,
};

// Error types
pub use error::{Error, Result};

// Identifier types
pub use identifiers::{BrowsingContext, CommandId, Realm, SubscriptionId};
