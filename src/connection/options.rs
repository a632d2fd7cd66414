//! Session connection configuration.
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use bidi_engine::ConnectionOptions;
//!
//! let options = ConnectionOptions::new()
//!     .with_command_timeout(Duration::from_secs(5))
//!     .with_max_pending(16)
//!     .with_strict_events(false);
//!
//! options.validate()?;
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use crate::correlator::DEFAULT_MAX_PENDING;
use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Default time a command may wait for its response.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

/// Upper bound accepted for [`ConnectionOptions::max_pending`].
pub const MAX_PENDING_LIMIT: usize = 65_536;

// ============================================================================
// ConnectionOptions
// ============================================================================

/// Per-session settings for a [`Connection`](super::Connection).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionOptions {
    /// Time a command may wait for its response.
    pub command_timeout: Duration,

    /// Maximum commands awaiting a response at once.
    pub max_pending: usize,

    /// Check outbound messages against the schema before sending.
    pub validate_outbound: bool,

    /// Log events with unknown methods as warnings instead of traces.
    pub strict_events: bool,
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Constructors
// ============================================================================

impl ConnectionOptions {
    /// Creates options with default settings.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
            max_pending: DEFAULT_MAX_PENDING,
            validate_outbound: true,
            strict_events: true,
        }
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl ConnectionOptions {
    /// Sets the command timeout.
    #[inline]
    #[must_use]
    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    /// Sets the pending-command limit.
    #[inline]
    #[must_use]
    pub fn with_max_pending(mut self, max_pending: usize) -> Self {
        self.max_pending = max_pending;
        self
    }

    /// Enables or disables the outbound self-check.
    #[inline]
    #[must_use]
    pub fn with_outbound_validation(mut self, enabled: bool) -> Self {
        self.validate_outbound = enabled;
        self
    }

    /// Sets how loudly unknown events are reported.
    #[inline]
    #[must_use]
    pub fn with_strict_events(mut self, strict: bool) -> Self {
        self.strict_events = strict;
        self
    }
}

// ============================================================================
// Validation
// ============================================================================

impl ConnectionOptions {
    /// Checks the options for consistency.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the timeout is zero or the pending limit
    /// is outside `1..=MAX_PENDING_LIMIT`.
    pub fn validate(&self) -> Result<()> {
        if self.command_timeout.is_zero() {
            return Err(Error::config("command timeout must be non-zero"));
        }
        if self.max_pending == 0 || self.max_pending > MAX_PENDING_LIMIT {
            return Err(Error::config(format!(
                "max pending must be between 1 and {MAX_PENDING_LIMIT}, got {}",
                self.max_pending
            )));
        }
        Ok(())
    }

    /// Command timeout in whole milliseconds.
    #[inline]
    #[must_use]
    pub fn timeout_ms(&self) -> u64 {
        u64::try_from(self.command_timeout.as_millis()).unwrap_or(u64::MAX)
    }
}

// ============================================================================
// Tests
// ============================================================================
