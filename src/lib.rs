//! Hydra head client - Client-side protocol engine for Hydra heads.
//!
//! This library drives Cardano Hydra heads through a node's WebSocket
//! event API: it opens heads, submits transactions into them, tracks each
//! submission to a terminal status and settles heads back to layer one.
//!
//! # Architecture
//!
//! The client follows a client-node model:
//!
//! - **Client (Rust)**: Sends commands, receives events via WebSocket
//! - **hydra-node**: Validates commands, emits the authoritative events
//!
//! Key design principles:
//!
//! - Each attached head owns: WebSocket session + state machine + tracker
//! - The node is the source of truth; local state is a validated cache
//! - Event-driven architecture (no polling)
//! - Connection loss is explicit: writes refuse until a resync
//!
//! # Quick Start
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use hydra_head_client::{Client, HeadState, Participant, Result, TxEnvelope};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     // Build a client against a node's API endpoint
//!     let client = Client::builder()
//!         .node_url("http://127.0.0.1:4001")
//!         .build()?;
//!
//!     // Open a head and wait for all participants to commit
//!     let head = client
//!         .create_head(&[Participant::new("addr_test1vq0")])
//!         .await?;
//!     client
//!         .wait_for_state(&head, HeadState::Open, Duration::from_secs(600))
//!         .await?;
//!
//!     // Submit a transaction and wait for it to settle
//!     let local_ref = client
//!         .submit_transaction(&head, TxEnvelope::witnessed("84a300..."))
//!         .await?;
//!     let status = client
//!         .await_result(&head, local_ref, Duration::from_secs(60))
//!         .await?;
//!     println!("settled: {status}");
//!
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`client`] | [`Client`] facade and configuration |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`external`] | Signer and chain-query capability seams |
//! | [`head`] | Lifecycle machine and transaction tracking |
//! | [`identifiers`] | Type-safe ID wrappers |
//! | [`protocol`] | Wire message types (internal) |
//! | [`transport`] | WebSocket transport layer (internal) |
//!
//! # Features
//!
//! - **Multi-head**: Independent heads over one client
//! - **Correlated submissions**: Local references survive uncorrelated echoes
//! - **Protocol validation**: Invalid node events are recorded, never applied
//! - **Explicit recovery**: Resync after loss re-adopts the node's state

// ============================================================================
// Modules
// ============================================================================

/// Client facade and configuration.
///
/// Use [`Client::builder()`] to create a configured client instance.
pub mod client;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// External capability seams.
///
/// Trait seams for transaction signing and layer-1 lookups, with a
/// pass-through signer as the default.
pub mod external;

/// Head domain: lifecycle machine, transaction tracking.
///
/// - [`HeadState`] - Lifecycle state, `Idle` through `Final`
/// - [`HeadView`] - Point-in-time read of one head
/// - [`TxStatus`] - Submission lifecycle status
pub mod head;

/// Type-safe identifiers for protocol entities.
///
/// Newtype wrappers prevent mixing incompatible IDs at compile time.
pub mod identifiers;

/// Hydra node wire protocol.
///
/// Internal module defining command/event/model structures.
pub mod protocol;

/// WebSocket transport layer.
///
/// Internal module handling the session event loop and URL derivation.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Client types
pub use client::{Client, ClientBuilder, ClientConfig};

// Error types
pub use error::{Error, Result};

// Capability seams
pub use external::{AddressInfo, ChainQuery, PreSignedSigner, Signer};

// Head types
pub use head::{HeadState, HeadView, ProtocolViolation, TxStatus};

// Identifier types
pub use identifiers::{HeadId, LocalRef, Participant, TxId};

// Wire model types
pub use protocol::{
    NodeEvent, OutputRef, Party, Snapshot, TxEnvelope, TxKind, Utxo, UtxoSet, ValueMap,
};
