//! Hydra node wire protocol.
//!
//! This module defines the JSON message surface between the client and a
//! Hydra node: outbound commands, inbound events and the ledger data model
//! both share.
//!
//! # Protocol Overview
//!
//! All frames are JSON objects discriminated by a `tag` field:
//!
//! | Message Type | Direction | Purpose |
//! |--------------|-----------|---------|
//! | [`ClientCommand`] | Client → Node | Head lifecycle and submission inputs |
//! | [`NodeEvent`] | Node → Client | Lifecycle, ledger and failure notifications |
//!
//! The node owns the wire format; this module is the single place where
//! untyped wire data becomes typed values. Unknown inbound tags decode to
//! [`NodeEvent::Unknown`] so a node upgrade never breaks the stream.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `command` | Outbound command definitions |
//! | `event` | Inbound event decoding |
//! | `model` | Envelopes, UTxO sets, snapshots, parties |

// ============================================================================
// Submodules
// ============================================================================

/// Outbound command definitions.
pub mod command;

/// Inbound event decoding.
pub mod event;

/// Ledger data model shared by commands and events.
pub mod model;

// ============================================================================
// Re-exports
// ============================================================================

pub use command::ClientCommand;
pub use event::{NodeEvent, decode_frame};
pub use model::{
    LOVELACE, NodeHeadStatus, OutputRef, Party, Snapshot, SnapshotPayload, TxEnvelope, TxKind,
    Utxo, UtxoSet, ValidationError, ValueMap,
};
