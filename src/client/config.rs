//! Client configuration.
//!
//! Timeouts and connection options shared by every head a client
//! attaches. All knobs have working defaults; construction goes through
//! [`crate::client::ClientBuilder`], which validates before building.
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use hydra_head_client::ClientConfig;
//!
//! let config = ClientConfig::new()
//!     .with_ack_timeout(Duration::from_secs(5))
//!     .with_history(true);
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Default window for a submission to be acknowledged.
const DEFAULT_ACK_TIMEOUT: Duration = Duration::from_secs(30);

/// Default window for an acknowledged submission to be confirmed.
const DEFAULT_CONFIRM_TIMEOUT: Duration = Duration::from_secs(60);

/// Default window for an initializing head to open.
const DEFAULT_COMMIT_TIMEOUT: Duration = Duration::from_secs(60);

/// Default retention of settled tracker entries.
const DEFAULT_RETENTION_WINDOW: Duration = Duration::from_secs(300);

/// Default limit on dialing plus the node greeting.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

// ============================================================================
// ClientConfig
// ============================================================================

/// Tunable parameters of a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// How long a submission may stay unacknowledged before it expires.
    pub ack_timeout: Duration,

    /// How long an acknowledged submission may stay unconfirmed before it
    /// expires.
    pub confirm_timeout: Duration,

    /// How long an initializing head may wait for commits before falling
    /// back to `Idle`.
    pub commit_timeout: Duration,

    /// How long settled submissions stay readable before pruning.
    pub retention_window: Duration,

    /// Limit on dialing the node and receiving its greeting.
    pub connect_timeout: Duration,

    /// Whether the node should replay past events on connect.
    pub history: bool,

    /// Participant address used as the node-side event filter and for
    /// chain-query pre-validation.
    pub address: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Constructors
// ============================================================================

impl ClientConfig {
    /// Creates a configuration with default settings.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            ack_timeout: DEFAULT_ACK_TIMEOUT,
            confirm_timeout: DEFAULT_CONFIRM_TIMEOUT,
            commit_timeout: DEFAULT_COMMIT_TIMEOUT,
            retention_window: DEFAULT_RETENTION_WINDOW,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            history: false,
            address: None,
        }
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl ClientConfig {
    /// Sets the acknowledgement window.
    #[inline]
    #[must_use]
    pub fn with_ack_timeout(mut self, timeout: Duration) -> Self {
        self.ack_timeout = timeout;
        self
    }

    /// Sets the confirmation window.
    #[inline]
    #[must_use]
    pub fn with_confirm_timeout(mut self, timeout: Duration) -> Self {
        self.confirm_timeout = timeout;
        self
    }

    /// Sets the commit window.
    #[inline]
    #[must_use]
    pub fn with_commit_timeout(mut self, timeout: Duration) -> Self {
        self.commit_timeout = timeout;
        self
    }

    /// Sets the settled-entry retention window.
    #[inline]
    #[must_use]
    pub fn with_retention_window(mut self, window: Duration) -> Self {
        self.retention_window = window;
        self
    }

    /// Sets the connect limit.
    #[inline]
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Enables or disables event replay on connect.
    #[inline]
    #[must_use]
    pub fn with_history(mut self, history: bool) -> Self {
        self.history = history;
        self
    }

    /// Sets the participant address filter.
    #[inline]
    #[must_use]
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }
}

// ============================================================================
// Validation
// ============================================================================

impl ClientConfig {
    /// Checks the configuration for unusable values.
    ///
    /// # Errors
    ///
    /// [`Error::Config`] naming the offending field.
    pub fn validate(&self) -> Result<()> {
        if self.ack_timeout.is_zero() {
            return Err(Error::config("ack_timeout must be positive"));
        }
        if self.confirm_timeout.is_zero() {
            return Err(Error::config("confirm_timeout must be positive"));
        }
        if self.commit_timeout.is_zero() {
            return Err(Error::config("commit_timeout must be positive"));
        }
        if self.connect_timeout.is_zero() {
            return Err(Error::config("connect_timeout must be positive"));
        }
        if let Some(address) = &self.address
            && address.is_empty()
        {
            return Err(Error::config("address filter must not be empty"));
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
