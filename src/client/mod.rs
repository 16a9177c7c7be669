//! Client facade module.
//!
//! This module provides the main entry point for driving Hydra heads.
//!
//! # Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Client`] | Facade over attached heads and their sessions |
//! | [`ClientBuilder`] | Fluent configuration builder |
//! | [`ClientConfig`] | Timeouts and connection options |
//!
//! # Example
//!
//! ```no_run
//! use hydra_head_client::{Client, Participant, Result};
//!
//! # async fn example() -> Result<()> {
//! let client = Client::builder()
//!     .node_url("http://127.0.0.1:4001")
//!     .build()?;
//!
//! let head = client
//!     .create_head(&[Participant::new("addr_test1vq0")])
//!     .await?;
//!
//! println!("head {head} is initializing");
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Submodules
// ============================================================================

/// Fluent builder pattern for client configuration.
pub mod builder;

/// Timeouts and connection options.
pub mod config;

/// Core client implementation.
pub mod core;

/// Event delivery and per-head maintenance tasks.
pub(crate) mod pump;

// ============================================================================
// Re-exports
// ============================================================================

pub use builder::ClientBuilder;
pub use config::ClientConfig;
pub use core::Client;
