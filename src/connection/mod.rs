//! Session connection and event loop.
//!
//! A [`Connection`] is a cheap, cloneable handle. Each connection spawns one
//! event-loop task that owns the transport and the [`Router`]; handles talk
//! to it over an unbounded `mpsc` channel, so every state change happens on
//! that single task.
//!
//! # Architecture
//!
//! ```text
//! Connection ─┐                       ┌─► FrameSink ─► peer
//! Connection ─┼─► mpsc ─► event loop ─┤
//! CommandTicket┘          (Router)    └─◄ FrameSource ◄─ peer
//! ```
//!
//! # Lifecycle
//!
//! The loop ends when the peer closes, the transport fails, [`Connection::shutdown`]
//! is called, or every handle is dropped. On exit every pending command
//! fails with [`Error::SessionClosed`] and every subscription is removed.
//!
//! # Example
//!
//! ```ignore
//! use bidi_engine::{Connection, ConnectionOptions, protocol::session};
//!
//! let connection = Connection::connect("ws://127.0.0.1:9222/session", ConnectionOptions::new()).await?;
//! let status = connection.send(session::Status::default()).await?;
//! let mut loads = connection.subscribe("browsingContext.load", None).await?;
//! while let Some(event) = loads.recv().await {
//!     println!("{}", event.method());
//! }
//! ```

// ============================================================================
// Submodules
// ============================================================================

/// Connection configuration.
pub mod options;

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::marker::PhantomData;
use std::pin::Pin;
use std::result::Result as StdResult;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use futures_util::Stream;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;
use tracing::{debug, error, trace, warn};

use crate::codec::Codec;
use crate::correlator::Responder;
use crate::dispatcher::{Listener, MethodPattern};
use crate::error::{Error, Result};
use crate::identifiers::{BrowsingContext, CommandId, SubscriptionId};
use crate::protocol::{Command, CommandType, Event, ProtocolError};
use crate::router::{Inbound, Router};
use crate::schema::SchemaRegistry;
use crate::transport::{FrameSink, FrameSource, Transport, WebSocketTransport};

pub use options::{ConnectionOptions, DEFAULT_COMMAND_TIMEOUT};

// ============================================================================
// Types
// ============================================================================

/// Answers inbound commands when acting as the remote end.
pub type CommandHandler = Box<dyn FnMut(&Command) -> StdResult<Value, ProtocolError> + Send>;

/// Snapshot of event-loop state, refreshed after every loop step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConnectionStats {
    /// Commands awaiting a response.
    pub pending: usize,
    /// Active event subscriptions.
    pub subscriptions: usize,
    /// Frames read from the transport.
    pub frames_in: u64,
    /// Frames written to the transport.
    pub frames_out: u64,
    /// Whether the event loop has exited.
    pub closed: bool,
}

/// Requests from handles to the event loop.
enum LoopCommand {
    Send {
        method: String,
        params: Value,
        responder: Responder,
        ack: oneshot::Sender<Result<CommandId>>,
    },
    Abandon(CommandId),
    Emit {
        event: Event,
        ack: oneshot::Sender<Result<()>>,
    },
    Subscribe {
        pattern: MethodPattern,
        contexts: Option<Vec<BrowsingContext>>,
        listener: Listener,
        ack: oneshot::Sender<SubscriptionId>,
    },
    Unsubscribe {
        id: SubscriptionId,
        ack: oneshot::Sender<bool>,
    },
    SetCommandHandler {
        handler: Option<CommandHandler>,
        ack: oneshot::Sender<()>,
    },
    Shutdown,
}

// ============================================================================
// Connection
// ============================================================================

/// Handle to one protocol session.
#[derive(Clone)]
pub struct Connection {
    command_tx: mpsc::UnboundedSender<LoopCommand>,
    stats: Arc<Mutex<ConnectionStats>>,
    options: Arc<ConnectionOptions>,
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("stats", &*self.stats.lock())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Connection {
    /// Starts a session over `transport`.
    ///
    /// Spawns the event loop; must be called inside a tokio runtime.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if the options are invalid
    /// - [`Error::Schema`] if the built-in registry fails to load
    pub fn new(transport: impl Transport, options: ConnectionOptions) -> Result<Self> {
        options.validate()?;
        let registry = SchemaRegistry::global()?;

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let stats = Arc::new(Mutex::new(ConnectionStats::default()));
        let (sink, source) = transport.split();

        let event_loop = EventLoop {
            router: Router::new(registry, &options),
            sink,
            source,
            command_rx,
            command_handler: None,
            stats: Arc::clone(&stats),
            frames_in: 0,
            frames_out: 0,
        };
        tokio::spawn(event_loop.run());

        Ok(Self {
            command_tx,
            stats,
            options: Arc::new(options),
        })
    }

    /// Connects to a WebSocket endpoint and starts a session.
    ///
    /// # Errors
    ///
    /// As [`WebSocketTransport::connect`] and [`Connection::new`].
    pub async fn connect(url: &str, options: ConnectionOptions) -> Result<Self> {
        options.validate()?;
        let transport = WebSocketTransport::connect(url).await?;
        Self::new(transport, options)
    }

    /// Returns the options this connection was created with.
    #[inline]
    #[must_use]
    pub fn options(&self) -> &ConnectionOptions {
        &self.options
    }
}

// ============================================================================
// Commands
// ============================================================================

impl Connection {
    /// Sends a command and waits for its typed result with the default timeout.
    ///
    /// # Errors
    ///
    /// - [`Error::Validation`] if the params fail the outbound self-check
    /// - [`Error::Protocol`] if the peer answers with an error, or with a
    ///   result that violates the schema
    /// - [`Error::RequestTimeout`] if no response arrives in time
    /// - [`Error::SessionClosed`] if the session ends first
    pub async fn send<C: CommandType>(&self, params: C) -> Result<C::Result> {
        self.send_with_timeout(params, self.options.command_timeout)
            .await
    }

    /// Sends a command and waits at most `request_timeout` for its result.
    ///
    /// # Errors
    ///
    /// As [`Connection::send`].
    pub async fn send_with_timeout<C: CommandType>(
        &self,
        params: C,
        request_timeout: Duration,
    ) -> Result<C::Result> {
        self.dispatch(params).await?.wait_timeout(request_timeout).await
    }

    /// Sends a command and returns a ticket for its result.
    ///
    /// # Errors
    ///
    /// Fails before anything is written if the command is rejected locally:
    /// [`Error::Validation`], [`Error::TooManyPending`] or
    /// [`Error::SessionClosed`].
    pub async fn dispatch<C: CommandType>(&self, params: C) -> Result<CommandTicket<C::Result>> {
        let params = serde_json::to_value(&params)?;
        self.dispatch_value(C::METHOD, params).await
    }

    /// Sends a command by method name and waits for its JSON result.
    ///
    /// The result is still validated against the command's result schema.
    ///
    /// # Errors
    ///
    /// As [`Connection::send`], plus [`Error::UnknownCommand`].
    pub async fn send_raw(&self, method: &str, params: Value) -> Result<Value> {
        self.dispatch_value::<Value>(method, params)
            .await?
            .wait()
            .await
    }

    async fn dispatch_value<T>(&self, method: &str, params: Value) -> Result<CommandTicket<T>> {
        let (responder, receiver) = oneshot::channel();
        let (ack, ack_rx) = oneshot::channel();

        self.post(LoopCommand::Send {
            method: method.to_string(),
            params,
            responder,
            ack,
        })?;
        let id = ack_rx.await.map_err(|_| Error::SessionClosed)??;

        Ok(CommandTicket {
            id,
            receiver,
            command_tx: self.command_tx.clone(),
            timeout: self.options.command_timeout,
            settled: false,
            _result: PhantomData,
        })
    }
}

// ============================================================================
// Events
// ============================================================================

impl Connection {
    /// Subscribes to events matching `pattern` and returns them as a stream.
    ///
    /// `pattern` is a module (`log`) or a full method (`log.entryAdded`).
    /// With `contexts`, events carrying a browsing context are delivered only
    /// if it is listed.
    ///
    /// This is a local subscription; the peer still has to be asked to emit
    /// the events with `session.subscribe`.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidPattern`] if the pattern is malformed
    /// - [`Error::SessionClosed`] if the session has ended
    pub async fn subscribe(
        &self,
        pattern: &str,
        contexts: Option<Vec<BrowsingContext>>,
    ) -> Result<EventStream> {
        let pattern = MethodPattern::parse(pattern)?;
        let (tx, receiver) = mpsc::unbounded_channel();
        let id = self
            .add_listener(pattern, contexts, Listener::Channel(tx))
            .await?;
        Ok(EventStream { id, receiver })
    }

    /// Subscribes a callback run on the event loop for each matching event.
    ///
    /// The callback must not block.
    ///
    /// # Errors
    ///
    /// As [`Connection::subscribe`].
    pub async fn on_event<F>(
        &self,
        pattern: &str,
        contexts: Option<Vec<BrowsingContext>>,
        handler: F,
    ) -> Result<SubscriptionId>
    where
        F: FnMut(&Event) + Send + 'static,
    {
        let pattern = MethodPattern::parse(pattern)?;
        self.add_listener(pattern, contexts, Listener::Callback(Box::new(handler)))
            .await
    }

    /// Removes a subscription. Returns `false` if it did not exist.
    ///
    /// Events already queued on its stream stay there.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SessionClosed`] if the session has ended.
    pub async fn unsubscribe(&self, id: SubscriptionId) -> Result<bool> {
        let (ack, ack_rx) = oneshot::channel();
        self.post(LoopCommand::Unsubscribe { id, ack })?;
        ack_rx.await.map_err(|_| Error::SessionClosed)
    }

    /// Sends an event to the peer (remote-end role).
    ///
    /// # Errors
    ///
    /// - [`Error::Validation`] if the event fails the outbound self-check
    /// - [`Error::SessionClosed`] if the session has ended
    pub async fn emit(&self, event: Event) -> Result<()> {
        let (ack, ack_rx) = oneshot::channel();
        self.post(LoopCommand::Emit { event, ack })?;
        ack_rx.await.map_err(|_| Error::SessionClosed)?
    }

    async fn add_listener(
        &self,
        pattern: MethodPattern,
        contexts: Option<Vec<BrowsingContext>>,
        listener: Listener,
    ) -> Result<SubscriptionId> {
        let (ack, ack_rx) = oneshot::channel();
        self.post(LoopCommand::Subscribe {
            pattern,
            contexts,
            listener,
            ack,
        })?;
        ack_rx.await.map_err(|_| Error::SessionClosed)
    }
}

// ============================================================================
// Remote End
// ============================================================================

impl Connection {
    /// Installs the handler that answers inbound commands.
    ///
    /// Without a handler, valid inbound commands are answered with
    /// `unknown command`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SessionClosed`] if the session has ended.
    pub async fn set_command_handler<F>(&self, handler: F) -> Result<()>
    where
        F: FnMut(&Command) -> StdResult<Value, ProtocolError> + Send + 'static,
    {
        self.replace_command_handler(Some(Box::new(handler))).await
    }

    /// Removes the command handler.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SessionClosed`] if the session has ended.
    pub async fn clear_command_handler(&self) -> Result<()> {
        self.replace_command_handler(None).await
    }

    async fn replace_command_handler(&self, handler: Option<CommandHandler>) -> Result<()> {
        let (ack, ack_rx) = oneshot::channel();
        self.post(LoopCommand::SetCommandHandler { handler, ack })?;
        ack_rx.await.map_err(|_| Error::SessionClosed)
    }
}

// ============================================================================
// State
// ============================================================================

impl Connection {
    /// Returns the number of commands awaiting a response.
    #[inline]
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.stats.lock().pending
    }

    /// Returns the number of active subscriptions.
    #[inline]
    #[must_use]
    pub fn subscription_count(&self) -> usize {
        self.stats.lock().subscriptions
    }

    /// Returns a snapshot of event-loop state.
    #[inline]
    #[must_use]
    pub fn stats(&self) -> ConnectionStats {
        *self.stats.lock()
    }

    /// Returns `true` once the event loop has exited.
    #[inline]
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.command_tx.is_closed() || self.stats.lock().closed
    }

    /// Ends the session. Pending commands fail with [`Error::SessionClosed`].
    pub fn shutdown(&self) {
        let _ = self.command_tx.send(LoopCommand::Shutdown);
    }

    fn post(&self, command: LoopCommand) -> Result<()> {
        self.command_tx
            .send(command)
            .map_err(|_| Error::SessionClosed)
    }
}

// ============================================================================
// CommandTicket
// ============================================================================

/// A sent command whose result has not been awaited yet.
///
/// Dropping an unsettled ticket, directly or by cancelling the future that
/// waits on it, abandons the command locally. The peer is not told; its
/// response is discarded when it arrives.
pub struct CommandTicket<T> {
    id: CommandId,
    receiver: oneshot::Receiver<Result<Value>>,
    command_tx: mpsc::UnboundedSender<LoopCommand>,
    timeout: Duration,
    settled: bool,
    _result: PhantomData<fn() -> T>,
}

impl<T> fmt::Debug for CommandTicket<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandTicket")
            .field("id", &self.id)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl<T: DeserializeOwned> CommandTicket<T> {
    /// Id the command was sent with.
    #[inline]
    #[must_use]
    pub fn id(&self) -> CommandId {
        self.id
    }

    /// Waits for the result with the connection's default timeout.
    ///
    /// # Errors
    ///
    /// As [`Connection::send`].
    pub async fn wait(self) -> Result<T> {
        let request_timeout = self.timeout;
        self.wait_timeout(request_timeout).await
    }

    /// Waits at most `request_timeout` for the result.
    ///
    /// On timeout the command is abandoned locally; the peer is not told.
    ///
    /// # Errors
    ///
    /// As [`Connection::send`].
    pub async fn wait_timeout(mut self, request_timeout: Duration) -> Result<T> {
        let outcome = timeout(request_timeout, &mut self.receiver).await;
        let value = match outcome {
            Ok(Ok(outcome)) => {
                self.settled = true;
                outcome?
            }
            Ok(Err(err)) => {
                self.settled = true;
                return Err(err.into());
            }
            // Drop abandons the command.
            Err(_) => {
                let timeout_ms = u64::try_from(request_timeout.as_millis()).unwrap_or(u64::MAX);
                return Err(Error::request_timeout(self.id, timeout_ms));
            }
        };
        Codec::decode_validated(value)
    }
}

impl<T> Drop for CommandTicket<T> {
    fn drop(&mut self) {
        if !self.settled {
            trace!(id = %self.id, "Ticket dropped before settling");
            let _ = self.command_tx.send(LoopCommand::Abandon(self.id));
        }
    }
}

// ============================================================================
// EventStream
// ============================================================================

/// Events delivered to one subscription.
///
/// Ends when the subscription is removed and the queue is drained, or when
/// the session closes.
#[derive(Debug)]
pub struct EventStream {
    id: SubscriptionId,
    receiver: mpsc::UnboundedReceiver<Event>,
}

impl EventStream {
    /// Subscription id, for [`Connection::unsubscribe`].
    #[inline]
    #[must_use]
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Waits for the next event.
    pub async fn recv(&mut self) -> Option<Event> {
        self.receiver.recv().await
    }

    /// Returns a queued event without waiting.
    pub fn try_recv(&mut self) -> Option<Event> {
        self.receiver.try_recv().ok()
    }
}

impl Stream for EventStream {
    type Item = Event;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Event>> {
        self.get_mut().receiver.poll_recv(cx)
    }
}

// ============================================================================
// Event Loop
// ============================================================================

struct EventLoop {
    router: Router,
    sink: Box<dyn FrameSink>,
    source: Box<dyn FrameSource>,
    command_rx: mpsc::UnboundedReceiver<LoopCommand>,
    command_handler: Option<CommandHandler>,
    stats: Arc<Mutex<ConnectionStats>>,
    frames_in: u64,
    frames_out: u64,
}

impl EventLoop {
    async fn run(mut self) {
        loop {
            let keep_running = tokio::select! {
                frame = self.source.recv() => match frame {
                    Ok(Some(text)) => self.on_frame(&text).await,
                    Ok(None) => {
                        debug!("Transport closed by peer");
                        false
                    }
                    Err(err) => {
                        warn!(error = %err, "Transport failed");
                        false
                    }
                },
                command = self.command_rx.recv() => match command {
                    Some(command) => self.on_command(command).await,
                    None => {
                        debug!("All connection handles dropped");
                        false
                    }
                },
            };

            self.publish_stats(false);
            if !keep_running {
                break;
            }
        }

        self.router.teardown();
        if let Err(err) = self.sink.close().await {
            debug!(error = %err, "Transport close failed");
        }
        self.publish_stats(true);
        debug!("Event loop terminated");
    }

    async fn on_frame(&mut self, text: &str) -> bool {
        self.frames_in += 1;
        match self.router.handle_frame(text) {
            Inbound::Settled(_) | Inbound::Delivered { .. } | Inbound::Dropped(_) => true,
            Inbound::Reply(frame) => self.write(frame).await,
            Inbound::Command(command) => {
                let method = command.data.method();
                let outcome = match self.command_handler.as_mut() {
                    Some(handler) => handler(&command),
                    None => Err(ProtocolError::unknown_command(method)),
                };
                match self.router.respond(command.id, method, outcome) {
                    Ok(frame) => self.write(frame).await,
                    Err(err) => {
                        error!(id = %command.id, method, error = %err, "Failed to encode reply");
                        true
                    }
                }
            }
        }
    }

    async fn on_command(&mut self, command: LoopCommand) -> bool {
        match command {
            LoopCommand::Send {
                method,
                params,
                responder,
                ack,
            } => {
                let prepared = match self.router.prepare_command(&method, params) {
                    Ok(prepared) => prepared,
                    Err(err) => {
                        let _ = ack.send(Err(err));
                        return true;
                    }
                };
                if let Err(err) = self.router.track(&prepared, responder) {
                    let _ = ack.send(Err(err));
                    return true;
                }

                let id = prepared.id;
                if ack.send(Ok(id)).is_err() {
                    debug!(%id, method, "Caller gone before send");
                    self.router.abandon(id);
                    return true;
                }
                if !self.write(prepared.frame).await {
                    self.router
                        .fail(id, Error::connection("transport write failed"));
                    return false;
                }
                trace!(%id, method, "Command sent");
                true
            }

            LoopCommand::Abandon(id) => {
                self.router.abandon(id);
                true
            }

            LoopCommand::Emit { event, ack } => match self.router.encode_event(event) {
                Ok(frame) => {
                    let written = self.write(frame).await;
                    let _ = ack.send(if written {
                        Ok(())
                    } else {
                        Err(Error::connection("transport write failed"))
                    });
                    written
                }
                Err(err) => {
                    let _ = ack.send(Err(err));
                    true
                }
            },

            LoopCommand::Subscribe {
                pattern,
                contexts,
                listener,
                ack,
            } => {
                let id = self.router.subscribe(pattern, contexts, listener);
                let _ = ack.send(id);
                true
            }

            LoopCommand::Unsubscribe { id, ack } => {
                let _ = ack.send(self.router.unsubscribe(id));
                true
            }

            LoopCommand::SetCommandHandler { handler, ack } => {
                self.command_handler = handler;
                let _ = ack.send(());
                true
            }

            LoopCommand::Shutdown => {
                debug!("Shutdown requested");
                false
            }
        }
    }

    async fn write(&mut self, frame: String) -> bool {
        match self.sink.send(frame).await {
            Ok(()) => {
                self.frames_out += 1;
                true
            }
            Err(err) => {
                warn!(error = %err, "Failed to write frame");
                false
            }
        }
    }

    fn publish_stats(&self, closed: bool) {
        *self.stats.lock() = ConnectionStats {
            pending: self.router.pending_count(),
            subscriptions: self.router.subscription_count(),
            frames_in: self.frames_in,
            frames_out: self.frames_out,
            closed,
        };
    }
}

// ============================================================================
// Tests
// ============================================================================
