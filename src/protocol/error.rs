//! Protocol error codes and the mapping from local failures onto them.
//!
//! Peers only ever see one of the closed [`ErrorCode`] values together with
//! a message. Internal failures (schema inconsistencies, decode mismatches,
//! IO) are reported as `unknown error` with a generic message.
//!
//! # Mapping
//!
//! | Local failure | Code |
//! |---------------|------|
//! | Outbound or inbound command violation | `invalid argument` |
//! | Unknown command method | `unknown command` |
//! | Response that fails its result schema | `unknown error` |
//! | Response with unknown or null id | `unknown error` |
//! | Session teardown | `session not created` |
//! | Anything else | `unknown error` |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::Error;
use crate::validator::Violation;

// ============================================================================
// Constants
// ============================================================================

/// Wire strings of every [`ErrorCode`], in declaration order.
pub static ERROR_CODES: [&str; 13] = [
    "invalid argument",
    "invalid session id",
    "no such alert",
    "no such frame",
    "no such handle",
    "no such node",
    "no such script",
    "session not created",
    "unable to capture screen",
    "unable to close browser",
    "unknown command",
    "unknown error",
    "unsupported operation",
];

// ============================================================================
// ErrorCode
// ============================================================================

/// Closed set of protocol error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    /// `invalid argument`
    #[serde(rename = "invalid argument")]
    InvalidArgument,
    /// `invalid session id`
    #[serde(rename = "invalid session id")]
    InvalidSessionId,
    /// `no such alert`
    #[serde(rename = "no such alert")]
    NoSuchAlert,
    /// `no such frame`
    #[serde(rename = "no such frame")]
    NoSuchFrame,
    /// `no such handle`
    #[serde(rename = "no such handle")]
    NoSuchHandle,
    /// `no such node`
    #[serde(rename = "no such node")]
    NoSuchNode,
    /// `no such script`
    #[serde(rename = "no such script")]
    NoSuchScript,
    /// `session not created`
    #[serde(rename = "session not created")]
    SessionNotCreated,
    /// `unable to capture screen`
    #[serde(rename = "unable to capture screen")]
    UnableToCaptureScreen,
    /// `unable to close browser`
    #[serde(rename = "unable to close browser")]
    UnableToCloseBrowser,
    /// `unknown command`
    #[serde(rename = "unknown command")]
    UnknownCommand,
    /// `unknown error`
    #[serde(rename = "unknown error")]
    UnknownError,
    /// `unsupported operation`
    #[serde(rename = "unsupported operation")]
    UnsupportedOperation,
}

impl ErrorCode {
    /// Every code, in the same order as [`ERROR_CODES`].
    pub const ALL: [Self; 13] = [
        Self::InvalidArgument,
        Self::InvalidSessionId,
        Self::NoSuchAlert,
        Self::NoSuchFrame,
        Self::NoSuchHandle,
        Self::NoSuchNode,
        Self::NoSuchScript,
        Self::SessionNotCreated,
        Self::UnableToCaptureScreen,
        Self::UnableToCloseBrowser,
        Self::UnknownCommand,
        Self::UnknownError,
        Self::UnsupportedOperation,
    ];

    /// Returns the wire string.
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        ERROR_CODES[self as usize]
    }

    /// Parses a wire string.
    #[must_use]
    pub fn parse(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|candidate| candidate.as_str() == code)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// ProtocolError
// ============================================================================

/// Structured error as carried by an error response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code}: {message}")]
pub struct ProtocolError {
    /// Error code.
    pub code: ErrorCode,
    /// Human-readable message.
    pub message: String,
    /// Remote stack trace, if the peer sent one.
    pub stacktrace: Option<String>,
}

impl ProtocolError {
    /// Creates an error without stack trace.
    #[inline]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            stacktrace: None,
        }
    }

    /// Attaches a stack trace.
    #[inline]
    #[must_use]
    pub fn with_stacktrace(mut self, stacktrace: impl Into<String>) -> Self {
        self.stacktrace = Some(stacktrace.into());
        self
    }

    /// Inbound command failed validation.
    #[must_use]
    pub fn invalid_command(violation: &Violation) -> Self {
        Self::new(ErrorCode::InvalidArgument, violation.to_string())
    }

    /// Inbound command names an unknown method.
    #[must_use]
    pub fn unknown_command(method: &str) -> Self {
        Self::new(ErrorCode::UnknownCommand, format!("unknown command {method}"))
    }

    /// Response for a pending command failed its result schema.
    #[must_use]
    pub fn malformed_response(violation: &Violation) -> Self {
        Self::new(
            ErrorCode::UnknownError,
            format!("malformed response: {violation}"),
        )
    }

    /// Response that matches no pending command.
    #[must_use]
    pub fn uncorrelated(id: Option<u64>) -> Self {
        let message = match id {
            Some(id) => format!("response for unknown command id {id}"),
            None => "error response without command id".to_string(),
        };
        Self::new(ErrorCode::UnknownError, message)
    }

    /// Session ended before the command completed.
    #[must_use]
    pub fn session_ended() -> Self {
        Self::new(ErrorCode::SessionNotCreated, "session ended")
    }
}

// ============================================================================
// Error Mapping
// ============================================================================

impl Error {
    /// Maps this error onto the protocol error a peer would see.
    ///
    /// Internal details never leave the process; unexpected failures become
    /// `unknown error` with a generic message.
    #[must_use]
    pub fn to_protocol_error(&self) -> ProtocolError {
        match self {
            Self::Protocol(err) => err.clone(),
            Self::Validation(violation) => ProtocolError::invalid_command(violation),
            Self::InvalidArgument { message } => {
                ProtocolError::new(ErrorCode::InvalidArgument, message.clone())
            }
            Self::UnknownCommand { method } => ProtocolError::unknown_command(method),
            Self::SessionClosed
            | Self::Connection { .. }
            | Self::WebSocket(_)
            | Self::ChannelClosed(_) => ProtocolError::session_ended(),
            Self::RequestTimeout { .. }
            | Self::DuplicateCommandId { .. }
            | Self::TooManyPending { .. } => {
                ProtocolError::new(ErrorCode::UnknownError, self.to_string())
            }
            Self::Config { .. }
            | Self::InvalidPattern { .. }
            | Self::Schema { .. }
            | Self::UnknownType { .. }
            | Self::Decode { .. }
            | Self::Io(_)
            | Self::Json(_) => ProtocolError::new(ErrorCode::UnknownError, "internal error"),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use crate::validator::{Path, Reason};

    #[test]
    fn test_code_wire_strings() {
        for code in ErrorCode::ALL {
            let json = serde_json::to_value(code).expect("serialize");
            assert_eq!(json, code.as_str());
            assert_eq!(ErrorCode::parse(code.as_str()), Some(code));
        }
        assert_eq!(ErrorCode::NoSuchFrame.as_str(), "no such frame");
        assert_eq!(ErrorCode::parse("no such window"), None);
    }

    #[test]
    fn test_protocol_error_display() {
        let err = ProtocolError::new(ErrorCode::NoSuchFrame, "context gone");
        assert_eq!(err.to_string(), "no such frame: context gone");
    }

    #[test]
    fn test_internal_errors_do_not_leak() {
        let err = Error::schema("type Foo defined twice");
        let mapped = err.to_protocol_error();
        assert_eq!(mapped.code, ErrorCode::UnknownError);
        assert!(!mapped.message.contains("Foo"));
    }

    #[test]
    fn test_validation_maps_to_invalid_argument() {
        let violation = Violation {
            path: Path::key("params").join("url"),
            reason: Reason::MissingField,
        };
        let mapped = Error::Validation(violation).to_protocol_error();
        assert_eq!(mapped.code, ErrorCode::InvalidArgument);
        assert!(mapped.message.contains("params.url"));
    }

    #[test]
    fn test_teardown_maps_to_session_not_created() {
        assert_eq!(Error::SessionClosed.code(), ErrorCode::SessionNotCreated);
        assert_eq!(
            Error::unknown_command("foo.bar").code(),
            ErrorCode::UnknownCommand
        );
    }

    #[test]
    fn test_malformed_response_cites_path() {
        let violation = Violation {
            path: Path::key("result").join("socksVersion"),
            reason: Reason::MissingField,
        };
        let err = ProtocolError::malformed_response(&violation);
        assert_eq!(err.code, ErrorCode::UnknownError);
        assert!(err.message.contains("result.socksVersion"));
    }
}
