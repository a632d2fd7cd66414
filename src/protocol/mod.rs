//! Typed protocol model.
//!
//! This module defines the message envelopes exchanged between the local
//! end (automation client) and the remote end (browser), and typed values
//! for every namespace.
//!
//! # Protocol Overview
//!
//! | Message | Direction | Key fields |
//! |---------|-----------|------------|
//! | `Command` | Local → Remote | `id`, `method`, `params` |
//! | `CommandResponse` | Remote → Local | `id`, `result` |
//! | `ErrorResponse` | Remote → Local | `id` (or null), `error`, `message` |
//! | `Event` | Remote → Local | `method`, `params` |
//!
//! Every envelope keeps undeclared keys in an [`Extensible`] bag.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `message` | Envelope classification and splitting |
//! | `commands` | `CommandData`, `CommandType`, command table |
//! | `events` | `EventData`, event table, context extraction |
//! | `error` | Error codes and local error mapping |
//! | `session` ... `log` | Namespace payloads |

// ============================================================================
// Submodules
// ============================================================================

/// `browser` namespace.
pub mod browser;

/// `browsingContext` namespace.
pub mod browsing_context;

/// Typed command table.
pub mod commands;

/// Error codes and mapping.
pub mod error;

/// Typed event table.
pub mod events;

/// `input` namespace.
pub mod input;

/// `log` namespace.
pub mod log;

/// Message envelopes.
pub mod message;

/// `network` namespace.
pub mod network;

/// `script` namespace.
pub mod script;

/// `session` namespace.
pub mod session;

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

// ============================================================================
// Re-exports
// ============================================================================

pub use commands::{CommandData, CommandType};
pub use error::{ErrorCode, ProtocolError};
pub use events::{EventContext, EventData};
pub use message::{
    Command, CommandMessage, CommandResponse, ErrorResponse, Event, EventMessage, Message,
    MessageKind,
};

// ============================================================================
// Shared Types
// ============================================================================

/// Undeclared keys of an open object, in arrival order.
pub type Extensible = Map<String, Value>;

/// Params of commands that take no arguments.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmptyParams {
    /// Extension keys.
    #[serde(flatten)]
    pub extensible: Extensible,
}

/// Result of commands that return nothing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmptyResult {
    /// Extension keys.
    #[serde(flatten)]
    pub extensible: Extensible,
}

/// Generates a single-value enum for a fixed `type` field.
macro_rules! tag_literal {
    ($(#[$meta:meta])* $name:ident => $wire:literal) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, Default, PartialEq, Eq, Hash,
            serde::Serialize, serde::Deserialize,
        )]
        pub enum $name {
            #[doc = concat!("`", $wire, "`")]
            #[default]
            #[serde(rename = $wire)]
            Tag,
        }
    };
}

pub(crate) use tag_literal;

/// Deserializes an optional nullable field, keeping `null` apart from absent.
///
/// Pair with `#[serde(default, skip_serializing_if = "Option::is_none")]`.
pub(crate) fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    #[test]
    fn test_empty_params_keep_extensions() {
        let params: EmptyParams =
            serde_json::from_value(json!({"vendor:flag": true})).expect("decode");
        assert_eq!(params.extensible.get("vendor:flag"), Some(&json!(true)));
        assert_eq!(
            serde_json::to_value(&params).expect("encode"),
            json!({"vendor:flag": true})
        );
    }

    #[test]
    fn test_nullable_distinguishes_null_and_absent() {
        #[derive(Debug, Deserialize, Serialize, PartialEq)]
        struct Parent {
            #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "nullable")]
            parent: Option<Option<String>>,
        }

        let absent: Parent = serde_json::from_value(json!({})).expect("decode");
        let null: Parent = serde_json::from_value(json!({"parent": null})).expect("decode");
        assert_eq!(absent.parent, None);
        assert_eq!(null.parent, Some(None));
        assert_eq!(serde_json::to_value(&null).expect("encode"), json!({"parent": null}));
    }
}
