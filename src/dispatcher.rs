//! Event fan-out to local subscriptions.
//!
//! A subscription pairs a [`MethodPattern`] with an optional browsing-context
//! filter and a [`Listener`]. [`Dispatcher::publish`] walks subscriptions in
//! registration order and hands the event to every match.
//!
//! # Patterns
//!
//! | Pattern | Matches |
//! |---------|---------|
//! | `log` | every `log.*` event |
//! | `browsingContext.load` | exactly that event |
//!
//! Events whose payload carries no browsing context pass every context
//! filter.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use rustc_hash::FxHashSet;
use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::identifiers::{BrowsingContext, SubscriptionId};
use crate::protocol::{Event, EventContext};

// ============================================================================
// MethodPattern
// ============================================================================

static PATTERN_SYNTAX: LazyLock<std::result::Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^([a-zA-Z]+)(?:\.([a-zA-Z]+))?$"));

/// Event method selector: a module name or a full `module.event` method.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodPattern {
    module: String,
    event: Option<String>,
}

impl MethodPattern {
    /// Parses `module` or `module.event`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPattern`] for any other shape.
    pub fn parse(pattern: &str) -> Result<Self> {
        let syntax = PATTERN_SYNTAX
            .as_ref()
            .map_err(|err| Error::config(format!("pattern syntax: {err}")))?;
        let captures = syntax.captures(pattern).ok_or_else(|| Error::InvalidPattern {
            pattern: pattern.to_string(),
        })?;

        Ok(Self {
            module: captures[1].to_string(),
            event: captures.get(2).map(|m| m.as_str().to_string()),
        })
    }

    /// Module part of the pattern.
    #[inline]
    #[must_use]
    pub fn module(&self) -> &str {
        &self.module
    }

    /// Returns `true` if the pattern names a whole module.
    #[inline]
    #[must_use]
    pub fn is_module(&self) -> bool {
        self.event.is_none()
    }

    /// Returns `true` if `method` is selected by this pattern.
    #[must_use]
    pub fn matches(&self, method: &str) -> bool {
        let Some((module, event)) = method.split_once('.') else {
            return false;
        };
        module == self.module && self.event.as_deref().is_none_or(|wanted| wanted == event)
    }
}

impl FromStr for MethodPattern {
    type Err = Error;

    fn from_str(pattern: &str) -> Result<Self> {
        Self::parse(pattern)
    }
}

impl fmt::Display for MethodPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.event {
            Some(event) => write!(f, "{}.{event}", self.module),
            None => f.write_str(&self.module),
        }
    }
}

// ============================================================================
// Listener
// ============================================================================

/// Callback invoked on the event loop for every matching event.
pub type EventHandler = Box<dyn FnMut(&Event) + Send>;

/// Where a subscription's events go.
pub enum Listener {
    /// Queue drained by an [`EventStream`](crate::connection::EventStream).
    Channel(mpsc::UnboundedSender<Event>),
    /// Inline callback.
    Callback(EventHandler),
}

impl Listener {
    /// Delivers `event`. Returns `false` once the receiving side is gone.
    fn deliver(&mut self, event: &Event) -> bool {
        match self {
            Self::Channel(tx) => tx.send(event.clone()).is_ok(),
            Self::Callback(handler) => {
                handler(event);
                true
            }
        }
    }
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Channel(_) => f.write_str("Listener::Channel"),
            Self::Callback(_) => f.write_str("Listener::Callback"),
        }
    }
}

// ============================================================================
// Subscription
// ============================================================================

#[derive(Debug)]
struct Subscription {
    id: SubscriptionId,
    pattern: MethodPattern,
    contexts: Option<FxHashSet<BrowsingContext>>,
    listener: Listener,
}

impl Subscription {
    fn accepts(&self, event: &Event) -> bool {
        if !self.pattern.matches(event.method()) {
            return false;
        }
        match (&self.contexts, event.data.browsing_context()) {
            (Some(filter), Some(context)) => filter.contains(context),
            _ => true,
        }
    }
}

// ============================================================================
// Dispatcher
// ============================================================================

/// Ordered list of event subscriptions.
#[derive(Debug)]
pub struct Dispatcher {
    next_id: u64,
    subscriptions: Vec<Subscription>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_id: 1,
            subscriptions: Vec::new(),
        }
    }

    /// Adds a subscription and returns its id.
    ///
    /// `contexts` restricts delivery to events from those browsing contexts.
    pub fn subscribe(
        &mut self,
        pattern: MethodPattern,
        contexts: Option<Vec<BrowsingContext>>,
        listener: Listener,
    ) -> SubscriptionId {
        let id = SubscriptionId::from_raw(self.next_id);
        self.next_id += 1;
        debug!(%id, %pattern, "Subscription added");
        self.subscriptions.push(Subscription {
            id,
            pattern,
            contexts: contexts.map(|list| list.into_iter().collect()),
            listener,
        });
        id
    }

    /// Removes a subscription. Returns `false` if it did not exist.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|sub| sub.id != id);
        let removed = self.subscriptions.len() != before;
        if removed {
            debug!(%id, "Subscription removed");
        }
        removed
    }

    /// Delivers `event` to every matching subscription in registration order.
    ///
    /// Subscriptions whose stream was dropped are removed. Returns the number
    /// of deliveries.
    pub fn publish(&mut self, event: &Event) -> usize {
        let mut delivered = 0;
        let mut closed = Vec::new();

        for sub in &mut self.subscriptions {
            if !sub.accepts(event) {
                continue;
            }
            if sub.listener.deliver(event) {
                delivered += 1;
            } else {
                closed.push(sub.id);
            }
        }

        if !closed.is_empty() {
            self.subscriptions.retain(|sub| !closed.contains(&sub.id));
            debug!(count = closed.len(), "Dropped closed subscriptions");
        }
        trace!(method = event.method(), delivered, "Event published");
        delivered
    }

    /// Removes every subscription, returning how many there were.
    pub fn clear(&mut self) -> usize {
        let count = self.subscriptions.len();
        self.subscriptions.clear();
        count
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }
}

// ============================================================================
// Tests
// ============================================================================
