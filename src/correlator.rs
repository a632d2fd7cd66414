//! Pending-command bookkeeping.
//!
//! Every command sent to the peer gets an id and a [`PendingCommand`] record
//! holding the caller's reply channel. Responses settle the record:
//!
//! | Inbound | Pending | Outcome |
//! |---------|---------|---------|
//! | result, schema ok | yes | caller gets the JSON result |
//! | result, schema violated | yes | caller gets `unknown error` |
//! | error response | yes | caller gets the [`ProtocolError`] |
//! | any | abandoned | discarded |
//! | any | no | uncorrelated anomaly |
//!
//! The correlator is owned by a single task and never locked.

// ============================================================================
// Imports
// ============================================================================

use std::time::{Duration, Instant};

use rustc_hash::{FxHashMap, FxHashSet};
use serde_json::Value;
use tokio::sync::oneshot;
use tracing::{debug, trace, warn};

use crate::error::{Error, Result};
use crate::identifiers::{CommandId, MAX_SAFE_INTEGER};
use crate::protocol::{CommandResponse, ErrorResponse, ProtocolError};
use crate::schema::CommandSpec;
use crate::validator::{Path, ValidationResult, Validator, Violation};

// ============================================================================
// Constants
// ============================================================================

/// Default maximum number of commands awaiting a response.
pub const DEFAULT_MAX_PENDING: usize = 100;

/// Abandoned ids remembered before the set is reset.
const ABANDONED_CAPACITY: usize = 1024;

// ============================================================================
// Types
// ============================================================================

/// Channel the caller awaits a command result on.
pub type Responder = oneshot::Sender<Result<Value>>;

// ============================================================================
// PendingCommand
// ============================================================================

/// A sent command awaiting its response.
#[derive(Debug)]
pub struct PendingCommand {
    /// Command id.
    pub id: CommandId,
    /// Wire method.
    pub method: &'static str,
    /// Registry name of the expected result schema.
    pub result_schema: &'static str,
    /// When the command was registered.
    pub issued_at: Instant,
    responder: Responder,
}

impl PendingCommand {
    /// Creates a record for a command described by `spec`.
    #[must_use]
    pub fn new(id: CommandId, spec: &CommandSpec, responder: Responder) -> Self {
        Self::with_schema(id, spec.method, spec.result, responder)
    }

    /// Creates a record with an explicit result schema.
    #[must_use]
    pub fn with_schema(
        id: CommandId,
        method: &'static str,
        result_schema: &'static str,
        responder: Responder,
    ) -> Self {
        Self {
            id,
            method,
            result_schema,
            issued_at: Instant::now(),
            responder,
        }
    }

    /// Time since registration.
    #[inline]
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.issued_at.elapsed()
    }

    /// Hands the outcome to the caller.
    fn complete(self, outcome: Result<Value>) {
        if self.responder.send(outcome).is_err() {
            trace!(id = %self.id, method = self.method, "Caller dropped before completion");
        }
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// What happened to an inbound response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Caller received the result.
    Resolved {
        id: CommandId,
        method: &'static str,
    },
    /// Caller received an error.
    Failed {
        id: CommandId,
        method: &'static str,
        error: ProtocolError,
    },
    /// Response for an abandoned command, discarded.
    Discarded { id: CommandId },
    /// Response matching no pending command.
    Uncorrelated(ProtocolError),
}

impl Resolution {
    /// Returns `true` for outcomes no caller observed.
    #[inline]
    #[must_use]
    pub fn is_anomaly(&self) -> bool {
        matches!(self, Self::Discarded { .. } | Self::Uncorrelated(_))
    }

    /// Returns the settled command id, if any.
    #[must_use]
    pub fn id(&self) -> Option<CommandId> {
        match self {
            Self::Resolved { id, .. } | Self::Failed { id, .. } | Self::Discarded { id } => {
                Some(*id)
            }
            Self::Uncorrelated(_) => None,
        }
    }
}

// ============================================================================
// Correlator
// ============================================================================

/// Matches responses to pending commands.
#[derive(Debug)]
pub struct Correlator {
    next_id: u64,
    max_pending: usize,
    pending: FxHashMap<CommandId, PendingCommand>,
    abandoned: FxHashSet<CommandId>,
}

impl Default for Correlator {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PENDING)
    }
}

impl Correlator {
    /// Creates a correlator allowing at most `max_pending` open commands.
    #[must_use]
    pub fn new(max_pending: usize) -> Self {
        Self {
            next_id: 1,
            max_pending,
            pending: FxHashMap::default(),
            abandoned: FxHashSet::default(),
        }
    }

    /// Allocates the next command id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] once the id space is exhausted.
    pub fn next_id(&mut self) -> Result<CommandId> {
        if self.next_id > MAX_SAFE_INTEGER {
            return Err(Error::config("command id space exhausted"));
        }
        let id = CommandId::new(self.next_id)?;
        self.next_id += 1;
        Ok(id)
    }

    /// Starts tracking a sent command.
    ///
    /// On error the record is dropped, closing its responder.
    ///
    /// # Errors
    ///
    /// - [`Error::DuplicateCommandId`] if the id is already pending
    /// - [`Error::TooManyPending`] if the limit is reached
    pub fn register(&mut self, command: PendingCommand) -> Result<()> {
        if self.pending.contains_key(&command.id) {
            warn!(id = %command.id, method = command.method, "Duplicate command id");
            return Err(Error::DuplicateCommandId { id: command.id });
        }
        if self.pending.len() >= self.max_pending {
            warn!(
                pending = self.pending.len(),
                max = self.max_pending,
                "Too many pending commands"
            );
            return Err(Error::TooManyPending {
                pending: self.pending.len(),
                max: self.max_pending,
            });
        }

        trace!(id = %command.id, method = command.method, "Command registered");
        self.abandoned.remove(&command.id);
        self.pending.insert(command.id, command);
        Ok(())
    }

    /// Settles a pending command with a successful response.
    ///
    /// The result is checked against the command's result schema first.
    pub fn resolve(&mut self, response: CommandResponse, validator: &Validator<'_>) -> Resolution {
        let Some(command) = self.pending.remove(&response.id) else {
            return self.unmatched(response.id);
        };
        let id = command.id;
        let method = command.method;

        let schema = match validator.registry().resolve(command.result_schema) {
            Ok(schema) => schema,
            Err(err) => {
                warn!(%id, method, error = %err, "Result schema missing");
                let error = err.to_protocol_error();
                command.complete(Err(err));
                return Resolution::Failed { id, method, error };
            }
        };

        match validator.validate_at(&response.result, schema, Path::key("result")) {
            ValidationResult::Valid => {
                debug!(%id, method, elapsed_ms = command.elapsed().as_millis() as u64, "Command resolved");
                command.complete(Ok(response.result));
                Resolution::Resolved { id, method }
            }
            ValidationResult::Invalid(violation) => Self::malformed(command, &violation),
        }
    }

    /// Settles a pending command whose response envelope is malformed.
    pub fn reject_malformed(&mut self, id: Option<CommandId>, violation: &Violation) -> Resolution {
        let Some(id) = id else {
            warn!(path = %violation.path, "Malformed response without id");
            return Resolution::Uncorrelated(ProtocolError::uncorrelated(None));
        };
        match self.pending.remove(&id) {
            Some(command) => Self::malformed(command, violation),
            None => self.unmatched(id),
        }
    }

    /// Settles a pending command with an error response.
    pub fn reject(&mut self, response: &ErrorResponse) -> Resolution {
        let Some(id) = response.id else {
            warn!(code = %response.error, message = %response.message, "Error response without id");
            return Resolution::Uncorrelated(ProtocolError::uncorrelated(None));
        };
        let Some(command) = self.pending.remove(&id) else {
            return self.unmatched(id);
        };

        let error = response.to_protocol_error();
        debug!(%id, method = command.method, code = %error.code, "Command failed");
        let method = command.method;
        command.complete(Err(Error::Protocol(error.clone())));
        Resolution::Failed { id, method, error }
    }

    /// Fails a single pending command with a local error.
    ///
    /// Returns `false` if the id was not pending.
    pub fn fail(&mut self, id: CommandId, error: Error) -> bool {
        match self.pending.remove(&id) {
            Some(command) => {
                debug!(%id, method = command.method, %error, "Command failed locally");
                command.complete(Err(error));
                true
            }
            None => false,
        }
    }

    /// Stops tracking a command after a timeout or cancellation.
    ///
    /// A late response for `id` is discarded. Returns `false` if the id was
    /// not pending.
    pub fn abandon(&mut self, id: CommandId) -> bool {
        let Some(command) = self.pending.remove(&id) else {
            return false;
        };
        debug!(%id, method = command.method, "Command abandoned");
        if self.abandoned.len() >= ABANDONED_CAPACITY {
            self.abandoned.clear();
        }
        self.abandoned.insert(id);
        true
    }

    /// Fails every pending command, returning how many were failed.
    pub fn fail_all(&mut self, error: impl Fn() -> Error) -> usize {
        let count = self.pending.len();
        for (_, command) in self.pending.drain() {
            command.complete(Err(error()));
        }
        self.abandoned.clear();
        if count > 0 {
            debug!(count, "Failed pending commands");
        }
        count
    }

    /// Returns `true` if `id` awaits a response.
    #[inline]
    #[must_use]
    pub fn is_pending(&self, id: CommandId) -> bool {
        self.pending.contains_key(&id)
    }

    /// Number of commands awaiting a response.
    #[inline]
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Configured pending limit.
    #[inline]
    #[must_use]
    pub fn max_pending(&self) -> usize {
        self.max_pending
    }

    fn malformed(command: PendingCommand, violation: &Violation) -> Resolution {
        let id = command.id;
        let method = command.method;
        warn!(%id, method, path = %violation.path, "Malformed command result");
        let error = ProtocolError::malformed_response(violation);
        command.complete(Err(Error::Protocol(error.clone())));
        Resolution::Failed { id, method, error }
    }

    fn unmatched(&mut self, id: CommandId) -> Resolution {
        if self.abandoned.remove(&id) {
            warn!(%id, "Late response for abandoned command discarded");
            return Resolution::Discarded { id };
        }
        warn!(%id, "Response for unknown command");
        Resolution::Uncorrelated(ProtocolError::uncorrelated(Some(id.as_u64())))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    use crate::protocol::ErrorCode;
    use crate::schema::SchemaRegistry;

    fn validator() -> Validator<'static> {
        Validator::new(SchemaRegistry::global().expect("registry"))
    }

    fn id(value: u64) -> CommandId {
        CommandId::new(value).expect("id")
    }

    fn pending(
        correlator: &mut Correlator,
        method: &'static str,
        schema: &'static str,
    ) -> (CommandId, oneshot::Receiver<Result<Value>>) {
        let id = correlator.next_id().expect("id");
        let (tx, rx) = oneshot::channel();
        correlator
            .register(PendingCommand::with_schema(id, method, schema, tx))
            .expect("register");
        (id, rx)
    }

    #[test]
    fn test_ids_are_monotonic_from_one() {
        let mut correlator = Correlator::default();
        let first = correlator.next_id().expect("id");
        let second = correlator.next_id().expect("id");
        assert_eq!(first.as_u64(), 1);
        assert_eq!(second.as_u64(), 2);
        assert_ne!(first, second);
    }

    #[test]
    fn test_resolve_delivers_result() {
        let mut correlator = Correlator::default();
        let (id, mut rx) = pending(&mut correlator, "session.status", "Session.StatusResult");

        let resolution = correlator.resolve(
            CommandResponse::new(id, json!({"ready": true, "message": "ok"})),
            &validator(),
        );
        assert_eq!(
            resolution,
            Resolution::Resolved {
                id,
                method: "session.status"
            }
        );
        let value = rx.try_recv().expect("settled").expect("ok");
        assert_eq!(value["message"], "ok");
        assert_eq!(correlator.pending_count(), 0);
    }

    #[test]
    fn test_duplicate_response_is_anomaly() {
        let mut correlator = Correlator::default();
        for _ in 0..6 {
            correlator.next_id().expect("id");
        }
        let (id, mut rx) = pending(&mut correlator, "session.end", "EmptyResult");
        assert_eq!(id.as_u64(), 7);

        let first = correlator.resolve(CommandResponse::new(id, json!({})), &validator());
        assert!(!first.is_anomaly());
        let second = correlator.resolve(CommandResponse::new(id, json!({})), &validator());
        assert!(matches!(second, Resolution::Uncorrelated(ref err) if err.code == ErrorCode::UnknownError));

        assert!(rx.try_recv().expect("settled once").is_ok());
    }

    #[test]
    fn test_malformed_result_fails_caller() {
        let mut correlator = Correlator::default();
        let (id, mut rx) = pending(
            &mut correlator,
            "session.new",
            "Session.ProxyConfiguration",
        );

        let resolution = correlator.resolve(
            CommandResponse::new(id, json!({"proxyType": "manual", "socksVersion": 300})),
            &validator(),
        );
        let Resolution::Failed { error, .. } = resolution else {
            panic!("expected failure, got {resolution:?}");
        };
        assert_eq!(error.code, ErrorCode::UnknownError);
        assert!(error.message.contains("result.socksVersion"));

        let err = rx.try_recv().expect("settled").expect_err("must fail");
        assert!(err.is_protocol_error());
    }

    #[test]
    fn test_reject_carries_protocol_error() {
        let mut correlator = Correlator::default();
        let _ = correlator.next_id();
        let (id, mut rx) = pending(&mut correlator, "browsingContext.navigate", "BrowsingContext.NavigateResult");
        assert_eq!(id.as_u64(), 2);

        let response = ErrorResponse::new(
            Some(id),
            ProtocolError::new(ErrorCode::NoSuchFrame, "gone").with_stacktrace("at x"),
        );
        assert!(matches!(correlator.reject(&response), Resolution::Failed { .. }));

        let Err(Error::Protocol(err)) = rx.try_recv().expect("settled") else {
            panic!("expected protocol error");
        };
        assert_eq!(err.code, ErrorCode::NoSuchFrame);
        assert_eq!(err.stacktrace.as_deref(), Some("at x"));
    }

    #[test]
    fn test_reject_without_id_is_uncorrelated() {
        let mut correlator = Correlator::default();
        let response = ErrorResponse::new(None, ProtocolError::new(ErrorCode::InvalidArgument, "bad"));
        assert!(correlator.reject(&response).is_anomaly());
    }

    #[test]
    fn test_abandoned_late_response_is_discarded() {
        let mut correlator = Correlator::default();
        let (id, mut rx) = pending(&mut correlator, "session.status", "Session.StatusResult");

        assert!(correlator.abandon(id));
        assert!(!correlator.is_pending(id));

        let late = correlator.resolve(
            CommandResponse::new(id, json!({"ready": true, "message": "late"})),
            &validator(),
        );
        assert_eq!(late, Resolution::Discarded { id });
        assert!(rx.try_recv().is_err());

        let again = correlator.resolve(
            CommandResponse::new(id, json!({"ready": true, "message": "late"})),
            &validator(),
        );
        assert!(matches!(again, Resolution::Uncorrelated(_)));
    }

    #[test]
    fn test_register_rejects_duplicates_and_overflow() {
        let mut correlator = Correlator::new(1);
        let (tx, _rx) = oneshot::channel();
        correlator
            .register(PendingCommand::with_schema(id(5), "session.end", "EmptyResult", tx))
            .expect("register");

        let (tx, _rx) = oneshot::channel();
        let err = correlator
            .register(PendingCommand::with_schema(id(5), "session.end", "EmptyResult", tx))
            .expect_err("duplicate");
        assert!(matches!(err, Error::DuplicateCommandId { .. }));

        let (tx, _rx) = oneshot::channel();
        let err = correlator
            .register(PendingCommand::with_schema(id(6), "session.end", "EmptyResult", tx))
            .expect_err("overflow");
        assert!(matches!(err, Error::TooManyPending { pending: 1, max: 1 }));
    }

    #[test]
    fn test_fail_all_notifies_every_caller() {
        let mut correlator = Correlator::default();
        let (_, mut first) = pending(&mut correlator, "session.end", "EmptyResult");
        let (_, mut second) = pending(&mut correlator, "session.end", "EmptyResult");

        assert_eq!(correlator.fail_all(|| Error::SessionClosed), 2);
        assert!(matches!(first.try_recv(), Ok(Err(Error::SessionClosed))));
        assert!(matches!(second.try_recv(), Ok(Err(Error::SessionClosed))));
        assert_eq!(correlator.pending_count(), 0);
    }
}
