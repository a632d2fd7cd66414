//! Type-safe identifiers for protocol entities.
//!
//! Newtype wrappers prevent mixing incompatible IDs at compile time.
//!
//! | Type | Wire type | Owner |
//! |------|-----------|-------|
//! | [`CommandId`] | `JsUint` | Command correlator |
//! | [`SubscriptionId`] | local only | Event dispatcher |
//! | [`BrowsingContext`], [`Navigation`], [`Realm`], ... | `text` | Remote end |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Largest integer exactly representable by a JavaScript number (`2^53 - 1`).
pub const MAX_SAFE_INTEGER: u64 = 9_007_199_254_740_991;

/// Smallest integer exactly representable by a JavaScript number (`-(2^53 - 1)`).
pub const MIN_SAFE_INTEGER: i64 = -9_007_199_254_740_991;

// ============================================================================
// CommandId
// ============================================================================

/// Command identifier used for command/response correlation.
///
/// Always within the `JsUint` range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommandId(u64);

impl CommandId {
    /// Creates a command ID, rejecting values outside `JsUint`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `value > 2^53 - 1`.
    pub fn new(value: u64) -> Result<Self> {
        if value > MAX_SAFE_INTEGER {
            return Err(Error::invalid_argument(format!(
                "command id {value} exceeds JsUint range"
            )));
        }
        Ok(Self(value))
    }

    /// Returns the raw integer value.
    #[inline]
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// SubscriptionId
// ============================================================================

/// Local handle for an event subscription.
///
/// Never sent on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    #[inline]
    pub(crate) const fn from_raw(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw integer value.
    #[inline]
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

// ============================================================================
// Text Identifiers
// ============================================================================

macro_rules! text_id {
    ($($(#[$meta:meta])* $name:ident),* $(,)?) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
            #[serde(transparent)]
            pub struct $name(String);

            impl $name {
                /// Creates the identifier from any string.
                #[inline]
                #[must_use]
                pub fn new(value: impl Into<String>) -> Self {
                    Self(value.into())
                }

                /// Returns the identifier as a string slice.
                #[inline]
                #[must_use]
                pub fn as_str(&self) -> &str {
                    &self.0
                }
            }

            impl fmt::Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(&self.0)
                }
            }

            impl From<&str> for $name {
                fn from(value: &str) -> Self {
                    Self(value.to_owned())
                }
            }

            impl From<String> for $name {
                fn from(value: String) -> Self {
                    Self(value)
                }
            }
        )*
    };
}

text_id! {
    /// Browsing context (tab, window or frame) identifier.
    BrowsingContext,
    /// Navigation identifier.
    Navigation,
    /// JavaScript realm identifier.
    Realm,
    /// Handle keeping a remote object alive.
    Handle,
    /// DOM node reference usable across realms.
    SharedId,
    /// Preload script identifier.
    PreloadScript,
    /// Script channel identifier.
    Channel,
    /// Network request identifier.
    Request,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_id_bounds() {
        assert!(CommandId::new(0).is_ok());
        assert!(CommandId::new(MAX_SAFE_INTEGER).is_ok());
        assert!(CommandId::new(MAX_SAFE_INTEGER + 1).is_err());
    }

    #[test]
    fn test_command_id_serializes_as_integer() {
        let id = CommandId::new(7).expect("valid id");
        assert_eq!(serde_json::to_string(&id).expect("serialize"), "7");
    }

    #[test]
    fn test_text_id_transparent() {
        let context = BrowsingContext::new("ctx-1");
        let json = serde_json::to_string(&context).expect("serialize");
        assert_eq!(json, "\"ctx-1\"");

        let parsed: BrowsingContext = serde_json::from_str(&json).expect("parse");
        assert_eq!(parsed, context);
        assert_eq!(parsed.as_str(), "ctx-1");
    }

    #[test]
    fn test_subscription_id_display() {
        assert_eq!(SubscriptionId::from_raw(3).to_string(), "sub-3");
    }
}
