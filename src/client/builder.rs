//! Builder pattern for client configuration.
//!
//! Provides a fluent API for configuring and creating [`Client`] instances.
//!
//! # Example
//!
//! ```no_run
//! use hydra_head_client::{Client, ClientConfig};
//!
//! # fn example() -> hydra_head_client::Result<()> {
//! let client = Client::builder()
//!     .node_url("http://127.0.0.1:4001")
//!     .config(ClientConfig::new().with_history(false))
//!     .build()?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use url::Url;

use crate::error::{Error, Result};
use crate::external::{ChainQuery, PreSignedSigner, Signer};

use super::config::ClientConfig;
use super::core::Client;

// ============================================================================
// ClientBuilder
// ============================================================================

/// Builder for configuring a [`Client`] instance.
///
/// Use [`Client::builder()`] to create a new builder. Building performs
/// validation only; no connection is opened until a head is created or
/// joined.
#[derive(Default, Clone)]
pub struct ClientBuilder {
    /// Base URL of the hydra-node API endpoint.
    node_url: Option<String>,
    /// Protocol timing and subscription configuration.
    config: ClientConfig,
    /// Signing backend for unwitnessed envelopes.
    signer: Option<Arc<dyn Signer>>,
    /// Optional layer-1 lookup backend.
    chain_query: Option<Arc<dyn ChainQuery>>,
}

impl fmt::Debug for ClientBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientBuilder")
            .field("node_url", &self.node_url)
            .field("config", &self.config)
            .field("signer", &self.signer.as_ref().map(|_| "dyn Signer"))
            .field("chain_query", &self.chain_query.as_ref().map(|_| "dyn ChainQuery"))
            .finish()
    }
}

// ============================================================================
// ClientBuilder Implementation
// ============================================================================

impl ClientBuilder {
    /// Creates a new client builder with no configuration.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the base URL of the hydra-node API endpoint.
    ///
    /// Accepts `http`, `https`, `ws`, and `wss` schemes; HTTP schemes are
    /// rewritten to their WebSocket equivalents when dialing.
    ///
    /// # Arguments
    ///
    /// * `url` - Node endpoint (e.g., "http://127.0.0.1:4001")
    #[inline]
    #[must_use]
    pub fn node_url(mut self, url: impl Into<String>) -> Self {
        self.node_url = Some(url.into());
        self
    }

    /// Sets the full protocol configuration.
    ///
    /// Replaces any configuration set so far, including values applied
    /// through [`history()`](Self::history) or [`address()`](Self::address).
    #[inline]
    #[must_use]
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets whether the node replays buffered history on attach.
    #[inline]
    #[must_use]
    pub fn history(mut self, history: bool) -> Self {
        self.config.history = history;
        self
    }

    /// Restricts the event subscription to one address.
    ///
    /// # Arguments
    ///
    /// * `address` - Bech32 address to filter events for
    #[inline]
    #[must_use]
    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.config.address = Some(address.into());
        self
    }

    /// Sets the signing backend for unwitnessed envelopes.
    ///
    /// Defaults to [`PreSignedSigner`], which rejects unwitnessed payloads.
    #[inline]
    #[must_use]
    pub fn signer(mut self, signer: Arc<dyn Signer>) -> Self {
        self.signer = Some(signer);
        self
    }

    /// Sets the layer-1 lookup backend used for commitment pre-validation.
    ///
    /// Without one, pre-validation is skipped and the node's own checks
    /// are the only gate.
    #[inline]
    #[must_use]
    pub fn chain_query(mut self, chain_query: Arc<dyn ChainQuery>) -> Self {
        self.chain_query = Some(chain_query);
        self
    }

    /// Builds the client with validation.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if the node URL is missing, unparseable, or
    ///   carries an unsupported scheme
    /// - [`Error::Config`] if a timeout is zero or the address filter is
    ///   empty
    pub fn build(self) -> Result<Client> {
        let node_url = self.validate_node_url()?;
        self.config.validate()?;

        let signer = self
            .signer
            .unwrap_or_else(|| Arc::new(PreSignedSigner::new()));

        Ok(Client::new(node_url, self.config, signer, self.chain_query))
    }
}

// ============================================================================
// Validation
// ============================================================================

impl ClientBuilder {
    /// Validates the node URL configuration.
    fn validate_node_url(&self) -> Result<Url> {
        let raw = self.node_url.as_deref().ok_or_else(|| {
            Error::config(
                "Node URL is required. Use .node_url() to set it.\n\
                 Example: Client::builder().node_url(\"http://127.0.0.1:4001\")",
            )
        })?;

        let url = Url::parse(raw).map_err(|e| {
            Error::config(format!(
                "Node URL is not valid: {e}\n\
                 Example: Client::builder().node_url(\"http://127.0.0.1:4001\")"
            ))
        })?;

        match url.scheme() {
            "http" | "https" | "ws" | "wss" => Ok(url),
            other => Err(Error::config(format!(
                "Unsupported node URL scheme \"{other}\". Use http, https, ws, or wss."
            ))),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    #[test]
    fn test_new_creates_empty_builder() {
        let builder = ClientBuilder::new();
        assert!(builder.node_url.is_none());
        assert!(builder.signer.is_none());
        assert!(builder.chain_query.is_none());
        assert_eq!(builder.config, ClientConfig::default());
    }

    #[test]
    fn test_node_url_sets_endpoint() {
        let builder = ClientBuilder::new().node_url("http://127.0.0.1:4001");
        assert_eq!(builder.node_url.as_deref(), Some("http://127.0.0.1:4001"));
    }

    #[test]
    fn test_config_replaces_configuration() {
        let config = ClientConfig::new().with_ack_timeout(Duration::from_secs(5));
        let builder = ClientBuilder::new().history(false).config(config.clone());
        assert_eq!(builder.config, config);
    }

    #[test]
    fn test_history_and_address_adjust_config() {
        let builder = ClientBuilder::new()
            .history(false)
            .address("addr_test1vq0");

        assert!(!builder.config.history);
        assert_eq!(builder.config.address.as_deref(), Some("addr_test1vq0"));
    }

    #[test]
    fn test_build_fails_without_node_url() {
        let result = ClientBuilder::new().build();
        assert!(result.is_err());

        let err = result.unwrap_err();
        assert!(err.to_string().contains("Node URL"));
    }

    #[test]
    fn test_build_fails_with_unparseable_url() {
        let result = ClientBuilder::new().node_url("not a url").build();
        assert!(result.is_err());
    }

    #[test]
    fn test_build_fails_with_unsupported_scheme() {
        let result = ClientBuilder::new().node_url("ftp://node:4001").build();
        assert!(result.is_err());

        let err = result.unwrap_err();
        assert!(err.to_string().contains("scheme"));
    }

    #[test]
    fn test_build_fails_with_zero_timeout() {
        let result = ClientBuilder::new()
            .node_url("http://127.0.0.1:4001")
            .config(ClientConfig::new().with_ack_timeout(Duration::ZERO))
            .build();

        assert!(result.is_err());
    }

    #[test]
    fn test_build_defaults_to_pre_signed_signer() {
        let client = ClientBuilder::new()
            .node_url("http://127.0.0.1:4001")
            .build()
            .expect("build");

        assert_eq!(client.node_url().as_str(), "http://127.0.0.1:4001/");
        assert_eq!(client.config(), &ClientConfig::default());
    }

    #[test]
    fn test_builder_is_clone() {
        let builder = ClientBuilder::new().node_url("ws://node:4001");
        let cloned = builder.clone();
        assert_eq!(builder.node_url, cloned.node_url);
    }
}
