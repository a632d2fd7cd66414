//! Message envelopes and classification.
//!
//! Frames are first parsed as JSON, classified by key presence, validated
//! against the root schema of their kind and only then split into an
//! envelope. Payloads stay as [`Value`] here; [`Command`] and [`Event`] are
//! the typed views.
//!
//! | Key present | Kind |
//! |-------------|------|
//! | `error` | [`MessageKind::ErrorResponse`] |
//! | `result` | [`MessageKind::CommandResponse`] |
//! | `method` and `id` | [`MessageKind::Command`] |
//! | `method` only | [`MessageKind::Event`] |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::identifiers::CommandId;
use crate::schema::registry::{
    COMMAND_RESPONSE_ROOT, COMMAND_ROOT, ERROR_RESPONSE_ROOT, EVENT_ROOT,
};

use super::{CommandData, ErrorCode, EventData, Extensible, ProtocolError};

// ============================================================================
// MessageKind
// ============================================================================

/// Envelope kind, decided by key presence alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// Local → remote request.
    Command,
    /// Successful reply.
    CommandResponse,
    /// Failed reply, possibly without id.
    ErrorResponse,
    /// Unsolicited notification.
    Event,
}

impl MessageKind {
    /// Classifies a parsed frame. Returns `None` for non-objects and objects
    /// matching no envelope.
    #[must_use]
    pub fn classify(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        if object.contains_key("error") {
            Some(Self::ErrorResponse)
        } else if object.contains_key("result") {
            Some(Self::CommandResponse)
        } else if object.contains_key("method") {
            if object.contains_key("id") {
                Some(Self::Command)
            } else {
                Some(Self::Event)
            }
        } else {
            None
        }
    }

    /// Returns the registry name of the root schema for this kind.
    #[inline]
    #[must_use]
    pub fn root_schema(self) -> &'static str {
        match self {
            Self::Command => COMMAND_ROOT,
            Self::CommandResponse => COMMAND_RESPONSE_ROOT,
            Self::ErrorResponse => ERROR_RESPONSE_ROOT,
            Self::Event => EVENT_ROOT,
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.root_schema())
    }
}

// ============================================================================
// Envelopes
// ============================================================================

/// Command envelope with an undecoded payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandMessage {
    pub id: CommandId,
    pub method: String,
    pub params: Value,
    #[serde(flatten)]
    pub extensible: Extensible,
}

impl CommandMessage {
    #[must_use]
    pub fn new(id: CommandId, method: impl Into<String>, params: Value) -> Self {
        Self {
            id,
            method: method.into(),
            params,
            extensible: Extensible::new(),
        }
    }
}

/// Successful reply with an undecoded result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandResponse {
    pub id: CommandId,
    pub result: Value,
    #[serde(flatten)]
    pub extensible: Extensible,
}

impl CommandResponse {
    #[must_use]
    pub fn new(id: CommandId, result: Value) -> Self {
        Self {
            id,
            result,
            extensible: Extensible::new(),
        }
    }
}

/// Failed reply. `id` is `null` when the failing command had no usable id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub id: Option<CommandId>,
    pub error: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stacktrace: Option<String>,
    #[serde(flatten)]
    pub extensible: Extensible,
}

impl ErrorResponse {
    /// Builds the reply carrying `error`.
    #[must_use]
    pub fn new(id: Option<CommandId>, error: ProtocolError) -> Self {
        Self {
            id,
            error: error.code,
            message: error.message,
            stacktrace: error.stacktrace,
            extensible: Extensible::new(),
        }
    }

    /// Returns the structured error this response carries.
    #[must_use]
    pub fn to_protocol_error(&self) -> ProtocolError {
        ProtocolError {
            code: self.error,
            message: self.message.clone(),
            stacktrace: self.stacktrace.clone(),
        }
    }
}

/// Event envelope with undecoded params.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventMessage {
    pub method: String,
    pub params: Value,
    #[serde(flatten)]
    pub extensible: Extensible,
}

impl EventMessage {
    #[must_use]
    pub fn new(method: impl Into<String>, params: Value) -> Self {
        Self {
            method: method.into(),
            params,
            extensible: Extensible::new(),
        }
    }
}

// ============================================================================
// Message
// ============================================================================

/// Any protocol message.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Message {
    Command(CommandMessage),
    CommandResponse(CommandResponse),
    ErrorResponse(ErrorResponse),
    Event(EventMessage),
}

impl Message {
    /// Splits a JSON value into its envelope.
    ///
    /// Does not validate; callers validate against
    /// [`MessageKind::root_schema`] first.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if the value matches no envelope,
    /// or [`Error::Decode`] if the envelope fields are malformed.
    pub fn from_value(value: Value) -> Result<Self> {
        let kind = MessageKind::classify(&value)
            .ok_or_else(|| Error::invalid_argument("message matches no envelope"))?;
        Ok(match kind {
            MessageKind::Command => Self::Command(decode(value)?),
            MessageKind::CommandResponse => Self::CommandResponse(decode(value)?),
            MessageKind::ErrorResponse => Self::ErrorResponse(decode(value)?),
            MessageKind::Event => Self::Event(decode(value)?),
        })
    }

    /// Serializes the message to a JSON value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] if serialization fails.
    pub fn into_value(self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    #[inline]
    #[must_use]
    pub fn kind(&self) -> MessageKind {
        match self {
            Self::Command(_) => MessageKind::Command,
            Self::CommandResponse(_) => MessageKind::CommandResponse,
            Self::ErrorResponse(_) => MessageKind::ErrorResponse,
            Self::Event(_) => MessageKind::Event,
        }
    }

    /// Returns the command id, if the message carries one.
    #[must_use]
    pub fn id(&self) -> Option<CommandId> {
        match self {
            Self::Command(command) => Some(command.id),
            Self::CommandResponse(response) => Some(response.id),
            Self::ErrorResponse(response) => response.id,
            Self::Event(_) => None,
        }
    }
}

impl From<CommandMessage> for Message {
    fn from(message: CommandMessage) -> Self {
        Self::Command(message)
    }
}

impl From<CommandResponse> for Message {
    fn from(message: CommandResponse) -> Self {
        Self::CommandResponse(message)
    }
}

impl From<ErrorResponse> for Message {
    fn from(message: ErrorResponse) -> Self {
        Self::ErrorResponse(message)
    }
}

impl From<EventMessage> for Message {
    fn from(message: EventMessage) -> Self {
        Self::Event(message)
    }
}

// ============================================================================
// Typed Envelopes
// ============================================================================

/// Command with a typed payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub id: CommandId,
    pub data: CommandData,
    pub extensible: Extensible,
}

impl Command {
    #[must_use]
    pub fn new(id: CommandId, data: impl Into<CommandData>) -> Self {
        Self {
            id,
            data: data.into(),
            extensible: Extensible::new(),
        }
    }

    /// Decodes the payload of a validated envelope.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] if the payload does not fit [`CommandData`].
    pub fn from_message(message: CommandMessage) -> Result<Self> {
        Ok(Self {
            id: message.id,
            data: decode_tagged(message.method, message.params)?,
            extensible: message.extensible,
        })
    }

    /// Splits the payload back into `method` and `params`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] if the payload cannot be serialized.
    pub fn into_message(self) -> Result<CommandMessage> {
        let method = self.data.method();
        let params = encode_params(&self.data)?;
        Ok(CommandMessage {
            id: self.id,
            method: method.to_string(),
            params,
            extensible: self.extensible,
        })
    }
}

/// Event with a typed payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub data: EventData,
    pub extensible: Extensible,
}

impl Event {
    #[must_use]
    pub fn new(data: EventData) -> Self {
        Self {
            data,
            extensible: Extensible::new(),
        }
    }

    /// Returns the wire method.
    #[inline]
    #[must_use]
    pub fn method(&self) -> &'static str {
        self.data.method()
    }

    /// Decodes the params of a validated envelope.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] if the params do not fit [`EventData`].
    pub fn from_message(message: EventMessage) -> Result<Self> {
        Ok(Self {
            data: decode_tagged(message.method, message.params)?,
            extensible: message.extensible,
        })
    }

    /// Splits the payload back into `method` and `params`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] if the payload cannot be serialized.
    pub fn into_message(self) -> Result<EventMessage> {
        let method = self.data.method();
        let params = encode_params(&self.data)?;
        Ok(EventMessage {
            method: method.to_string(),
            params,
            extensible: self.extensible,
        })
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn decode<T: DeserializeOwned>(value: Value) -> Result<T> {
    serde_path_to_error::deserialize(value).map_err(Error::decode)
}

/// Rebuilds `{"method", "params"}` and decodes the adjacently tagged payload.
fn decode_tagged<T: DeserializeOwned>(method: String, params: Value) -> Result<T> {
    let mut object = Map::with_capacity(2);
    object.insert("method".to_string(), Value::String(method));
    object.insert("params".to_string(), params);
    decode(Value::Object(object))
}

fn encode_params<T: Serialize>(data: &T) -> Result<Value> {
    match serde_json::to_value(data)? {
        Value::Object(mut object) => Ok(object
            .remove("params")
            .unwrap_or_else(|| Value::Object(Map::new()))),
        other => Err(Error::invalid_argument(format!(
            "payload serialized to {other}, expected an object"
        ))),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    use crate::protocol::session;

    #[test]
    fn test_classify() {
        let cases = [
            (json!({"id": 1, "error": "unknown error", "message": "x"}), Some(MessageKind::ErrorResponse)),
            (json!({"id": null, "error": "unknown error", "message": "x"}), Some(MessageKind::ErrorResponse)),
            (json!({"id": 1, "result": {}}), Some(MessageKind::CommandResponse)),
            (json!({"id": 1, "method": "session.status", "params": {}}), Some(MessageKind::Command)),
            (json!({"method": "log.entryAdded", "params": {}}), Some(MessageKind::Event)),
            (json!({"id": 1}), None),
            (json!([1, 2]), None),
        ];
        for (value, expected) in cases {
            assert_eq!(MessageKind::classify(&value), expected, "{value}");
        }
    }

    #[test]
    fn test_envelope_keeps_extension_keys() {
        let json = json!({"id": 4, "result": {"ready": true}, "vendor:trace": "abc"});
        let message = Message::from_value(json.clone()).expect("split");
        let Message::CommandResponse(response) = &message else {
            panic!("expected command response");
        };
        assert_eq!(response.extensible.get("vendor:trace"), Some(&json!("abc")));
        assert_eq!(message.id().map(CommandId::as_u64), Some(4));
        assert_eq!(message.into_value().expect("encode"), json);
    }

    #[test]
    fn test_error_response_null_id() {
        let json = json!({"id": null, "error": "no such frame", "message": "gone"});
        let message = Message::from_value(json.clone()).expect("split");
        let Message::ErrorResponse(response) = &message else {
            panic!("expected error response");
        };
        assert_eq!(response.id, None);
        assert_eq!(response.to_protocol_error().code, ErrorCode::NoSuchFrame);
        assert_eq!(message.into_value().expect("encode"), json);
    }

    #[test]
    fn test_typed_command_round_trip() {
        let id = CommandId::new(9).expect("id");
        let mut command = Command::new(id, session::Status::default());
        command
            .extensible
            .insert("goog:channel".to_string(), json!("x"));

        let message = command.clone().into_message().expect("split");
        assert_eq!(message.method, "session.status");
        assert_eq!(message.params, json!({}));

        let back = Command::from_message(message).expect("decode");
        assert_eq!(back, command);
    }

    #[test]
    fn test_typed_event_decode_error_has_path() {
        let message = EventMessage::new("script.realmDestroyed", json!({"realm": 5}));
        let err = Event::from_message(message).expect_err("realm must be a string");
        assert!(matches!(err, Error::Decode { ref path, .. } if path.contains("params")));
    }
}
