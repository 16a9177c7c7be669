//! Error types for the Hydra head client.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use hydra_head_client::{Client, Result};
//!
//! async fn example(client: &Client) -> Result<()> {
//!     let head = client.create_head(participants).await?;
//!     client.wait_for_state(&head, HeadState::Open, timeout).await?;
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Configuration | [`Error::Config`], [`Error::InvalidArgument`] |
//! | Connection | [`Error::Connection`], [`Error::ConnectionTimeout`], [`Error::ConnectionClosed`] |
//! | Transport | [`Error::Transport`], [`Error::WebSocket`] |
//! | Head | [`Error::HeadNotFound`], [`Error::InvalidState`], [`Error::ResyncRequired`] |
//! | Waiting | [`Error::Timeout`] |
//! | Capabilities | [`Error::Signing`], [`Error::ChainQuery`] |
//! | External | [`Error::Io`], [`Error::Json`], [`Error::ChannelClosed`] |

// ============================================================================
// Imports
// ============================================================================

use std::io::Error as IoError;
use std::result::Result as StdResult;

use thiserror::Error;
use tokio::sync::oneshot::error::RecvError;
use tokio_tungstenite::tungstenite::Error as WsError;

use crate::identifiers::HeadId;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// Each variant includes relevant context for debugging. Failures are
/// scoped to one head or one pending transaction; nothing here is fatal
/// to the process.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when client configuration is invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// Invalid argument supplied to an operation.
    ///
    /// Returned when a payload fails client-side validation before send.
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Description of the invalid argument.
        message: String,
    },

    // ========================================================================
    // Connection Errors
    // ========================================================================
    /// Node connection failed.
    ///
    /// Returned when the WebSocket connection cannot be established.
    /// Retrying is caller policy; the client never redials on its own.
    #[error("Connection failed: {message}")]
    Connection {
        /// Description of the connection error.
        message: String,
    },

    /// Connection timeout waiting for the node greeting.
    ///
    /// Returned when the node does not complete the attach handshake
    /// within the timeout period.
    #[error("Connection timeout after {timeout_ms}ms")]
    ConnectionTimeout {
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    /// Connection closed while an operation was in flight.
    #[error("Connection closed")]
    ConnectionClosed,

    /// Send failed on a live-but-broken link.
    ///
    /// The session converts this into a synthetic `ConnectionLost` event
    /// so downstream recovery is uniform; callers see this variant only
    /// from the write path that triggered it.
    #[error("Transport error: {message}")]
    Transport {
        /// Description of the transport fault.
        message: String,
    },

    // ========================================================================
    // Head Errors
    // ========================================================================
    /// Head not found.
    ///
    /// Returned when the head id is not attached to this client.
    #[error("Head not found: {head_id}")]
    HeadNotFound {
        /// The missing head id.
        head_id: HeadId,
    },

    /// Operation not valid for the head's current lifecycle state.
    #[error("Cannot {operation} while head is {state}")]
    InvalidState {
        /// The refused operation.
        operation: String,
        /// Lifecycle state at the time of refusal.
        state: String,
    },

    /// Writes refused until the head is resynchronized.
    ///
    /// Returned after a connection loss; call `reconnect` to clear it.
    #[error("Resync required for head {head_id}: connection was lost")]
    ResyncRequired {
        /// The head awaiting resync.
        head_id: HeadId,
    },

    // ========================================================================
    // Waiting Errors
    // ========================================================================
    /// Operation timeout.
    ///
    /// Returned when a wait exceeds its deadline. The underlying
    /// submission or head record is unaffected.
    #[error("Timeout after {timeout_ms}ms: {operation}")]
    Timeout {
        /// Description of the operation that timed out.
        operation: String,
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    // ========================================================================
    // Capability Errors
    // ========================================================================
    /// External signer failed.
    ///
    /// Surfaced verbatim; the client does not retry signing.
    #[error("Signing failed: {message}")]
    Signing {
        /// Message from the signer capability.
        message: String,
    },

    /// External chain query failed.
    ///
    /// Surfaced verbatim; pre-validation callers degrade this to a
    /// warning since the node validates authoritatively.
    #[error("Chain query failed: {message}")]
    ChainQuery {
        /// Message from the chain-query capability.
        message: String,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] WsError),

    /// Channel receive error.
    #[error("Channel closed")]
    ChannelClosed(#[from] RecvError),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates an invalid argument error.
    #[inline]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Creates a connection error.
    #[inline]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates a connection timeout error.
    #[inline]
    pub fn connection_timeout(timeout_ms: u64) -> Self {
        Self::ConnectionTimeout { timeout_ms }
    }

    /// Creates a transport error.
    #[inline]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Creates a head not found error.
    #[inline]
    pub fn head_not_found(head_id: HeadId) -> Self {
        Self::HeadNotFound { head_id }
    }

    /// Creates an invalid state error.
    #[inline]
    pub fn invalid_state(operation: impl Into<String>, state: impl Into<String>) -> Self {
        Self::InvalidState {
            operation: operation.into(),
            state: state.into(),
        }
    }

    /// Creates a resync required error.
    #[inline]
    pub fn resync_required(head_id: HeadId) -> Self {
        Self::ResyncRequired { head_id }
    }

    /// Creates a timeout error.
    #[inline]
    pub fn timeout(operation: impl Into<String>, timeout_ms: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            timeout_ms,
        }
    }

    /// Creates a signing error.
    #[inline]
    pub fn signing(message: impl Into<String>) -> Self {
        Self::Signing {
            message: message.into(),
        }
    }

    /// Creates a chain query error.
    #[inline]
    pub fn chain_query(message: impl Into<String>) -> Self {
        Self::ChainQuery {
            message: message.into(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a timeout error.
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::ConnectionTimeout { .. } | Self::Timeout { .. }
        )
    }

    /// Returns `true` if this is a connection-level error.
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::Connection { .. }
                | Self::ConnectionTimeout { .. }
                | Self::ConnectionClosed
                | Self::Transport { .. }
                | Self::WebSocket(_)
        )
    }

    /// Returns `true` if this is an external capability error.
    #[inline]
    #[must_use]
    pub fn is_capability_error(&self) -> bool {
        matches!(self, Self::Signing { .. } | Self::ChainQuery { .. })
    }

    /// Returns `true` if this error is recoverable.
    ///
    /// Recoverable errors may succeed on retry or after a reconnect.
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::ConnectionTimeout { .. }
                | Self::Timeout { .. }
                | Self::Transport { .. }
                | Self::ResyncRequired { .. }
        )
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::ErrorKind;

    #[test]
    fn test_error_display() {
        let err = Error::connection("failed to connect");
        assert_eq!(err.to_string(), "Connection failed: failed to connect");
    }

    #[test]
    fn test_config_error() {
        let err = Error::config("missing node url");
        assert_eq!(err.to_string(), "Configuration error: missing node url");
    }

    #[test]
    fn test_invalid_state_display() {
        let err = Error::invalid_state("close", "Idle");
        assert_eq!(err.to_string(), "Cannot close while head is Idle");
    }

    #[test]
    fn test_is_timeout() {
        let timeout_err = Error::timeout("await_result", 2000);
        let other_err = Error::connection("test");

        assert!(timeout_err.is_timeout());
        assert!(!other_err.is_timeout());
    }

    #[test]
    fn test_is_connection_error() {
        let conn_err = Error::connection("test");
        let timeout_err = Error::connection_timeout(1000);
        let closed_err = Error::ConnectionClosed;
        let transport_err = Error::transport("send failed");
        let other_err = Error::config("test");

        assert!(conn_err.is_connection_error());
        assert!(timeout_err.is_connection_error());
        assert!(closed_err.is_connection_error());
        assert!(transport_err.is_connection_error());
        assert!(!other_err.is_connection_error());
    }

    #[test]
    fn test_is_capability_error() {
        assert!(Error::signing("no key").is_capability_error());
        assert!(Error::chain_query("unreachable").is_capability_error());
        assert!(!Error::config("test").is_capability_error());
    }

    #[test]
    fn test_is_recoverable() {
        let timeout_err = Error::timeout("wait_for_state", 1000);
        let resync_err = Error::resync_required(HeadId::new("h1"));
        let config_err = Error::config("test");

        assert!(timeout_err.is_recoverable());
        assert!(resync_err.is_recoverable());
        assert!(!config_err.is_recoverable());
    }

    #[test]
    fn test_from_io_error() {
        let io_err = IoError::new(ErrorKind::NotFound, "socket gone");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<String>("invalid").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Json(_)));
    }
}
