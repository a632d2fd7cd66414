//! Synchronous per-session message router.
//!
//! The router owns the [`Correlator`] and the [`Dispatcher`] of one session
//! and turns frames into outcomes without doing any I/O itself. The
//! connection event loop feeds it and acts on what it returns.
//!
//! # Inbound Pipeline
//!
//! ```text
//! frame ─► JSON ─► classify ─► validate ─► decode ─┬─► correlator (responses)
//!                                                  ├─► dispatcher (events)
//!                                                  └─► caller (commands)
//! ```
//!
//! | Invalid inbound | Outcome |
//! |-----------------|---------|
//! | command, unknown method | [`Inbound::Reply`] with `unknown command` |
//! | command, other violation | [`Inbound::Reply`] with `invalid argument` |
//! | response for a pending id | caller fails with `unknown error` |
//! | anything else | [`Inbound::Dropped`] |

// ============================================================================
// Imports
// ============================================================================

use std::result::Result as StdResult;

use serde_json::Value;
use tracing::{debug, error, trace, warn};

use crate::connection::ConnectionOptions;
use crate::correlator::{Correlator, PendingCommand, Resolution, Responder};
use crate::dispatcher::{Dispatcher, Listener, MethodPattern};
use crate::error::{Error, Result};
use crate::identifiers::{BrowsingContext, CommandId, SubscriptionId};
use crate::protocol::{
    Command, CommandMessage, CommandResponse, ErrorCode, ErrorResponse, Event, Message,
    MessageKind, ProtocolError,
};
use crate::schema::registry::{COMMAND_ROOT, COMMAND_RESPONSE_ROOT, EVENT_ROOT};
use crate::schema::{CommandSpec, SchemaRegistry};
use crate::validator::{Path, ValidationResult, Validator, Violation};

// ============================================================================
// Types
// ============================================================================

/// Outbound command ready to be written to the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedCommand {
    /// Allocated command id.
    pub id: CommandId,
    /// Registry entry of the command.
    pub spec: CommandSpec,
    /// Serialized frame.
    pub frame: String,
}

/// Outcome of one inbound frame.
#[derive(Debug)]
pub enum Inbound {
    /// A response settled (or failed to settle) a pending command.
    Settled(Resolution),
    /// An event was handed to `delivered` subscriptions.
    Delivered {
        method: &'static str,
        delivered: usize,
    },
    /// A valid command for the local command handler.
    Command(Command),
    /// A frame to send back to the peer.
    Reply(String),
    /// The frame was discarded.
    Dropped(String),
}

// ============================================================================
// Router
// ============================================================================

/// Per-session routing core.
#[derive(Debug)]
pub struct Router {
    registry: &'static SchemaRegistry,
    correlator: Correlator,
    dispatcher: Dispatcher,
    validate_outbound: bool,
    strict_events: bool,
}

impl Router {
    /// Creates a router over `registry`.
    #[must_use]
    pub fn new(registry: &'static SchemaRegistry, options: &ConnectionOptions) -> Self {
        Self {
            registry,
            correlator: Correlator::new(options.max_pending),
            dispatcher: Dispatcher::new(),
            validate_outbound: options.validate_outbound,
            strict_events: options.strict_events,
        }
    }

    #[inline]
    #[must_use]
    pub fn validator(&self) -> Validator<'static> {
        Validator::new(self.registry)
    }

    #[inline]
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.correlator.pending_count()
    }

    #[inline]
    #[must_use]
    pub fn subscription_count(&self) -> usize {
        self.dispatcher.len()
    }
}

// ============================================================================
// Outbound
// ============================================================================

impl Router {
    /// Allocates an id for `method` and serializes the command.
    ///
    /// The command is not tracked until [`Router::track`] is called.
    ///
    /// # Errors
    ///
    /// - [`Error::UnknownCommand`] if `method` is not a known command
    /// - [`Error::Validation`] if the self-check fails
    pub fn prepare_command(&mut self, method: &str, params: Value) -> Result<PreparedCommand> {
        let spec = *self
            .registry
            .command(method)
            .ok_or_else(|| Error::unknown_command(method))?;
        let id = self.correlator.next_id()?;
        let value = serde_json::to_value(CommandMessage::new(id, spec.method, params))?;

        if self.validate_outbound {
            self.self_check(&value, COMMAND_ROOT)
                .inspect_err(|err| warn!(%id, method, error = %err, "Outbound command rejected"))?;
        }

        trace!(%id, method, "Command prepared");
        Ok(PreparedCommand {
            id,
            spec,
            frame: value.to_string(),
        })
    }

    /// Starts waiting for the response to `prepared`.
    ///
    /// # Errors
    ///
    /// See [`Correlator::register`].
    pub fn track(&mut self, prepared: &PreparedCommand, responder: Responder) -> Result<()> {
        self.correlator
            .register(PendingCommand::new(prepared.id, &prepared.spec, responder))
    }

    /// Fails a pending command with a local error.
    pub fn fail(&mut self, id: CommandId, error: Error) -> bool {
        self.correlator.fail(id, error)
    }

    /// Forgets a pending command after a timeout.
    pub fn abandon(&mut self, id: CommandId) -> bool {
        self.correlator.abandon(id)
    }

    /// Serializes the reply to an inbound command.
    ///
    /// A successful result that violates the command's result schema is
    /// replaced by an `unknown error` response.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] if serialization fails.
    pub fn respond(
        &self,
        id: CommandId,
        method: &str,
        outcome: StdResult<Value, ProtocolError>,
    ) -> Result<String> {
        let message: Message = match outcome {
            Ok(result) => match self.check_result(method, &result)? {
                ValidationResult::Valid => CommandResponse::new(id, result).into(),
                ValidationResult::Invalid(violation) => {
                    warn!(%id, method, path = %violation.path, "Command handler produced invalid result");
                    ErrorResponse::new(
                        Some(id),
                        ProtocolError::new(ErrorCode::UnknownError, "internal error"),
                    )
                    .into()
                }
            },
            Err(err) => ErrorResponse::new(Some(id), err).into(),
        };
        Ok(serde_json::to_string(&message)?)
    }

    /// Serializes an event for the peer.
    ///
    /// # Errors
    ///
    /// - [`Error::Json`] if serialization fails
    /// - [`Error::Validation`] if the self-check fails
    pub fn encode_event(&self, event: Event) -> Result<String> {
        let method = event.method();
        let value = serde_json::to_value(Message::from(event.into_message()?))?;
        if self.validate_outbound {
            self.self_check(&value, EVENT_ROOT)
                .inspect_err(|err| warn!(method, error = %err, "Outbound event rejected"))?;
        }
        Ok(value.to_string())
    }

    fn check_result(&self, method: &str, result: &Value) -> Result<ValidationResult> {
        if !self.validate_outbound {
            return Ok(ValidationResult::Valid);
        }
        let Some(spec) = self.registry.command(method) else {
            let envelope = self.registry.resolve(COMMAND_RESPONSE_ROOT)?;
            let wrapped = serde_json::json!({"id": 0, "result": result});
            return Ok(self.validator().validate(&wrapped, envelope));
        };
        let schema = self.registry.resolve(spec.result)?;
        Ok(self
            .validator()
            .validate_at(result, schema, Path::key("result")))
    }

    fn self_check(&self, value: &Value, root: &str) -> Result<()> {
        self.check_root(value, root)?.into_result()?;
        Ok(())
    }

    fn check_root(&self, value: &Value, root: &str) -> Result<ValidationResult> {
        let schema = self.registry.resolve(root)?;
        Ok(self.validator().validate(value, schema))
    }
}

// ============================================================================
// Inbound
// ============================================================================

impl Router {
    /// Parses, validates and routes one inbound frame.
    pub fn handle_frame(&mut self, text: &str) -> Inbound {
        let value: Value = match serde_json::from_str(text) {
            Ok(value) => value,
            Err(err) => {
                warn!(error = %err, "Inbound frame is not JSON");
                return Inbound::Dropped(format!("invalid JSON: {err}"));
            }
        };
        let Some(kind) = MessageKind::classify(&value) else {
            warn!("Inbound frame matches no message kind");
            return Inbound::Dropped("unrecognized message".to_string());
        };

        match self.check_root(&value, kind.root_schema()) {
            Ok(ValidationResult::Valid) => self.route(value),
            Ok(ValidationResult::Invalid(violation)) => self.route_invalid(kind, &value, &violation),
            Err(err) => {
                error!(%kind, error = %err, "Root schema unavailable");
                Inbound::Dropped(err.to_string())
            }
        }
    }

    fn route(&mut self, value: Value) -> Inbound {
        let message = match Message::from_value(value) {
            Ok(message) => message,
            Err(err) => {
                error!(error = %err, "Validated envelope failed to decode");
                return Inbound::Dropped(err.to_string());
            }
        };

        match message {
            Message::CommandResponse(response) => {
                let validator = self.validator();
                Inbound::Settled(self.correlator.resolve(response, &validator))
            }
            Message::ErrorResponse(response) => Inbound::Settled(self.correlator.reject(&response)),
            Message::Event(message) => match Event::from_message(message) {
                Ok(event) => {
                    let delivered = self.dispatcher.publish(&event);
                    Inbound::Delivered {
                        method: event.method(),
                        delivered,
                    }
                }
                Err(err) => {
                    error!(error = %err, "Validated event failed to decode");
                    Inbound::Dropped(err.to_string())
                }
            },
            Message::Command(message) => {
                let id = message.id;
                match Command::from_message(message) {
                    Ok(command) => {
                        debug!(%id, method = command.data.method(), "Inbound command");
                        Inbound::Command(command)
                    }
                    Err(err) => {
                        error!(%id, error = %err, "Validated command failed to decode");
                        self.reply_error(
                            Some(id),
                            ProtocolError::new(ErrorCode::InvalidArgument, err.to_string()),
                        )
                    }
                }
            }
        }
    }

    fn route_invalid(&mut self, kind: MessageKind, value: &Value, violation: &Violation) -> Inbound {
        let id = value
            .get("id")
            .and_then(Value::as_u64)
            .and_then(|raw| CommandId::new(raw).ok());
        let method = value.get("method").and_then(Value::as_str);

        match kind {
            MessageKind::Command => {
                let error = match method {
                    Some(method) if self.registry.command(method).is_none() => {
                        debug!(method, "Inbound command is unknown");
                        ProtocolError::unknown_command(method)
                    }
                    _ => {
                        debug!(path = %violation.path, "Inbound command is invalid");
                        ProtocolError::invalid_command(violation)
                    }
                };
                self.reply_error(id, error)
            }
            MessageKind::CommandResponse | MessageKind::ErrorResponse => {
                Inbound::Settled(self.correlator.reject_malformed(id, violation))
            }
            MessageKind::Event => {
                let method = method.unwrap_or_default();
                if self.registry.event(method).is_none() && !self.strict_events {
                    trace!(method, "Unknown event dropped");
                } else {
                    warn!(method, path = %violation.path, "Invalid event dropped");
                }
                Inbound::Dropped(violation.to_string())
            }
        }
    }

    fn reply_error(&self, id: Option<CommandId>, error: ProtocolError) -> Inbound {
        let message = Message::from(ErrorResponse::new(id, error));
        match serde_json::to_string(&message) {
            Ok(frame) => Inbound::Reply(frame),
            Err(err) => {
                error!(error = %err, "Failed to encode error response");
                Inbound::Dropped(err.to_string())
            }
        }
    }
}

// ============================================================================
// Subscriptions & Teardown
// ============================================================================

impl Router {
    /// Adds an event subscription.
    pub fn subscribe(
        &mut self,
        pattern: MethodPattern,
        contexts: Option<Vec<BrowsingContext>>,
        listener: Listener,
    ) -> SubscriptionId {
        self.dispatcher.subscribe(pattern, contexts, listener)
    }

    /// Removes an event subscription.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.dispatcher.unsubscribe(id)
    }

    /// Fails every pending command and drops every subscription.
    ///
    /// Returns the number of failed commands.
    pub fn teardown(&mut self) -> usize {
        let failed = self.correlator.fail_all(|| Error::SessionClosed);
        let cleared = self.dispatcher.clear();
        debug!(failed, cleared, "Router torn down");
        failed
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;
    use tokio::sync::{mpsc, oneshot};

    use crate::codec::Codec;
    use crate::protocol::log::Entry;
    use crate::protocol::session::StatusResult;
    use crate::protocol::EventData;

    fn router() -> Router {
        Router::new(
            SchemaRegistry::global().expect("registry"),
            &ConnectionOptions::new(),
        )
    }

    fn send(
        router: &mut Router,
        method: &str,
        params: Value,
    ) -> (PreparedCommand, oneshot::Receiver<Result<Value>>) {
        let prepared = router.prepare_command(method, params).expect("prepare");
        let (tx, rx) = oneshot::channel();
        router.track(&prepared, tx).expect("track");
        (prepared, rx)
    }

    fn reply_json(inbound: Inbound) -> Value {
        let Inbound::Reply(frame) = inbound else {
            panic!("expected reply, got {inbound:?}");
        };
        serde_json::from_str(&frame).expect("reply JSON")
    }

    #[test]
    fn test_status_round_trip() {
        let mut router = router();
        let (prepared, mut rx) = send(&mut router, "session.status", json!({}));
        assert_eq!(
            serde_json::from_str::<Value>(&prepared.frame).expect("frame"),
            json!({"id": 1, "method": "session.status", "params": {}})
        );

        let inbound = router.handle_frame(r#"{"id":1,"result":{"ready":true,"message":"ok"}}"#);
        assert!(matches!(inbound, Inbound::Settled(Resolution::Resolved { .. })));

        let value = rx.try_recv().expect("settled").expect("result");
        let status: StatusResult = Codec::decode_validated(value).expect("decode");
        assert_eq!(
            status,
            StatusResult {
                ready: true,
                message: "ok".into()
            }
        );
    }

    #[test]
    fn test_log_entry_reaches_every_subscriber() {
        let mut router = router();
        let (first_tx, mut first_rx) = mpsc::unbounded_channel();
        let (second_tx, mut second_rx) = mpsc::unbounded_channel();
        router.subscribe(MethodPattern::parse("log.entryAdded").expect("p"), None, Listener::Channel(first_tx));
        router.subscribe(MethodPattern::parse("log").expect("p"), None, Listener::Channel(second_tx));

        let inbound = router.handle_frame(
            &json!({
                "method": "log.entryAdded",
                "params": {
                    "type": "javascript",
                    "level": "error",
                    "source": {"realm": "r1"},
                    "text": "boom",
                    "timestamp": 12345
                }
            })
            .to_string(),
        );
        assert!(matches!(
            inbound,
            Inbound::Delivered {
                method: "log.entryAdded",
                delivered: 2
            }
        ));

        for rx in [&mut first_rx, &mut second_rx] {
            let event = rx.try_recv().expect("event");
            let EventData::EntryAdded(Entry::Javascript(entry)) = event.data else {
                panic!("expected javascript entry");
            };
            assert_eq!(entry.base.text.as_deref(), Some("boom"));
        }
    }

    #[test]
    fn test_error_response_fails_caller() {
        let mut router = router();
        let _ = send(&mut router, "session.status", json!({}));
        let (prepared, mut rx) = send(
            &mut router,
            "browsingContext.getTree",
            json!({"root": "missing"}),
        );
        assert_eq!(prepared.id.as_u64(), 2);

        let inbound = router.handle_frame(
            r#"{"id":2,"error":"no such frame","message":"no frame with id missing"}"#,
        );
        assert!(matches!(inbound, Inbound::Settled(Resolution::Failed { .. })));

        let Err(Error::Protocol(err)) = rx.try_recv().expect("settled") else {
            panic!("expected protocol error");
        };
        assert_eq!(err.code, ErrorCode::NoSuchFrame);
    }

    #[test]
    fn test_malformed_result_is_never_success() {
        let mut router = router();
        let _ = send(&mut router, "session.status", json!({}));
        let _ = send(&mut router, "session.status", json!({}));
        let (prepared, mut rx) = send(
            &mut router,
            "session.new",
            json!({"capabilities": {}}),
        );
        assert_eq!(prepared.id.as_u64(), 3);

        let frame = json!({
            "id": 3,
            "result": {
                "sessionId": "s1",
                "capabilities": {
                    "acceptInsecureCerts": false,
                    "browserName": "firefox",
                    "browserVersion": "140.0",
                    "platformName": "linux",
                    "proxy": {"socksVersion": 300},
                    "setWindowRect": true
                }
            }
        });
        let Inbound::Settled(Resolution::Failed { error, .. }) = router.handle_frame(&frame.to_string())
        else {
            panic!("expected failure");
        };
        assert_eq!(error.code, ErrorCode::UnknownError);
        assert!(error.message.contains("socksVersion"));
        assert!(rx.try_recv().expect("settled").is_err());
        assert_eq!(router.pending_count(), 2);
    }

    #[test]
    fn test_outbound_self_check() {
        let mut router = router();
        let err = router
            .prepare_command("browsingContext.navigate", json!({"context": "c"}))
            .expect_err("url is required");
        let Error::Validation(violation) = err else {
            panic!("expected validation error, got {err:?}");
        };
        assert_eq!(violation.path.to_string(), "params.url");

        assert!(matches!(
            router.prepare_command("session.bogus", json!({})),
            Err(Error::UnknownCommand { .. })
        ));
    }

    #[test]
    fn test_inbound_unknown_command_reply() {
        let mut router = router();
        let reply = reply_json(router.handle_frame(r#"{"id":9,"method":"session.bogus","params":{}}"#));
        assert_eq!(reply["id"], 9);
        assert_eq!(reply["error"], "unknown command");
    }

    #[test]
    fn test_inbound_invalid_command_reply() {
        let mut router = router();
        let reply = reply_json(
            router.handle_frame(r#"{"id":4,"method":"browsingContext.navigate","params":{"context":"c"}}"#),
        );
        assert_eq!(reply["id"], 4);
        assert_eq!(reply["error"], "invalid argument");

        let reply = reply_json(router.handle_frame(r#"{"id":-1,"method":"session.status","params":{}}"#));
        assert_eq!(reply["id"], Value::Null);
        assert_eq!(reply["error"], "invalid argument");
    }

    #[test]
    fn test_inbound_valid_command() {
        let mut router = router();
        let inbound = router.handle_frame(r#"{"id":5,"method":"session.status","params":{}}"#);
        let Inbound::Command(command) = inbound else {
            panic!("expected command, got {inbound:?}");
        };
        assert_eq!(command.id.as_u64(), 5);
        assert_eq!(command.data.method(), "session.status");

        let frame = router
            .respond(command.id, "session.status", Ok(json!({"ready": true, "message": "ok"})))
            .expect("respond");
        let reply: Value = serde_json::from_str(&frame).expect("json");
        assert_eq!(reply, json!({"id": 5, "result": {"ready": true, "message": "ok"}}));

        let frame = router
            .respond(command.id, "session.status", Ok(json!({"ready": "yes"})))
            .expect("respond");
        let reply: Value = serde_json::from_str(&frame).expect("json");
        assert_eq!(reply["error"], "unknown error");
    }

    #[test]
    fn test_garbage_is_dropped() {
        let mut router = router();
        assert!(matches!(router.handle_frame("not json"), Inbound::Dropped(_)));
        assert!(matches!(router.handle_frame(r#"{"hello":1}"#), Inbound::Dropped(_)));
        assert!(matches!(
            router.handle_frame(r#"{"method":"browsingContext.load","params":{}}"#),
            Inbound::Dropped(_)
        ));
        assert!(matches!(
            router.handle_frame(r#"{"id":42,"result":{}}"#),
            Inbound::Settled(Resolution::Uncorrelated(_))
        ));
    }

    #[test]
    fn test_teardown_fails_pending() {
        let mut router = router();
        let (_, mut rx) = send(&mut router, "session.status", json!({}));
        let (tx, _events) = mpsc::unbounded_channel();
        router.subscribe(MethodPattern::parse("log").expect("p"), None, Listener::Channel(tx));

        assert_eq!(router.teardown(), 1);
        assert_eq!(router.subscription_count(), 0);
        let err = rx.try_recv().expect("settled").expect_err("closed");
        assert_eq!(err.to_protocol_error().code, ErrorCode::SessionNotCreated);
    }
}
