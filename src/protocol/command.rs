//! Outbound command definitions.
//!
//! Commands are the client inputs the node accepts over the WebSocket,
//! discriminated by a `tag` field.
//!
//! # Commands
//!
//! | Tag | Purpose |
//! |-----|---------|
//! | `Init` | Start head initialization |
//! | `Abort` | Abandon an initializing head |
//! | `NewTx` | Submit a transaction into the open head |
//! | `Decommit` | Withdraw outputs from the open head to layer 1 |
//! | `GetUTxO` | Request the confirmed UTxO set |
//! | `Close` | Close the head with the latest snapshot |
//! | `Contest` | Contest a close with a newer snapshot |
//! | `Fanout` | Distribute final outputs after the deadline |

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};

use super::model::TxEnvelope;

// ============================================================================
// ClientCommand
// ============================================================================

/// All commands the client can post to the node.
///
/// Serializes to the node's `{"tag": ...}` wire shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "tag")]
pub enum ClientCommand {
    /// Start initialization of a new head.
    Init,

    /// Abandon the head while it is still initializing.
    Abort,

    /// Submit a transaction into the open head.
    NewTx {
        /// Envelope to submit.
        transaction: TxEnvelope,
    },

    /// Withdraw the outputs spent by this transaction from the open
    /// head back to layer 1.
    Decommit {
        /// Transaction spending the outputs to withdraw.
        #[serde(rename = "decommitTx")]
        decommit_tx: TxEnvelope,
    },

    /// Request the node's confirmed UTxO set.
    #[serde(rename = "GetUTxO")]
    GetUtxo,

    /// Close the head with the latest known snapshot.
    Close,

    /// Contest a close by posting a newer snapshot.
    Contest,

    /// Distribute the final outputs after the contestation deadline.
    Fanout,
}

impl ClientCommand {
    /// Returns the wire tag of this command.
    #[inline]
    #[must_use]
    pub const fn tag(&self) -> &'static str {
        match self {
            Self::Init => "Init",
            Self::Abort => "Abort",
            Self::NewTx { .. } => "NewTx",
            Self::Decommit { .. } => "Decommit",
            Self::GetUtxo => "GetUTxO",
            Self::Close => "Close",
            Self::Contest => "Contest",
            Self::Fanout => "Fanout",
        }
    }

    /// Creates a `NewTx` command.
    #[inline]
    #[must_use]
    pub fn new_tx(transaction: TxEnvelope) -> Self {
        Self::NewTx { transaction }
    }

    /// Creates a `Decommit` command.
    #[inline]
    #[must_use]
    pub fn decommit(decommit_tx: TxEnvelope) -> Self {
        Self::Decommit { decommit_tx }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_wire_shape() {
        let json = serde_json::to_string(&ClientCommand::Init).expect("serialize");
        assert_eq!(json, r#"{"tag":"Init"}"#);
    }

    #[test]
    fn test_get_utxo_wire_shape() {
        let json = serde_json::to_string(&ClientCommand::GetUtxo).expect("serialize");
        assert_eq!(json, r#"{"tag":"GetUTxO"}"#);
    }

    #[test]
    fn test_new_tx_wire_shape() {
        let cmd = ClientCommand::new_tx(TxEnvelope::witnessed("84a3"));
        let json = serde_json::to_string(&cmd).expect("serialize");

        assert!(json.contains(r#""tag":"NewTx""#));
        assert!(json.contains(r#""transaction""#));
        assert!(json.contains(r#""cborHex":"84a3""#));
    }

    #[test]
    fn test_decommit_wire_shape() {
        let cmd = ClientCommand::decommit(TxEnvelope::witnessed("84a3"));
        let json = serde_json::to_string(&cmd).expect("serialize");

        assert!(json.contains(r#""tag":"Decommit""#));
        assert!(json.contains(r#""decommitTx""#));
        assert!(json.contains(r#""cborHex":"84a3""#));
        assert_eq!(cmd.tag(), "Decommit");
    }

    #[test]
    fn test_lifecycle_command_tags() {
        assert_eq!(ClientCommand::Close.tag(), "Close");
        assert_eq!(ClientCommand::Contest.tag(), "Contest");
        assert_eq!(ClientCommand::Fanout.tag(), "Fanout");
        assert_eq!(ClientCommand::Abort.tag(), "Abort");
    }

    #[test]
    fn test_command_roundtrip() {
        let cmd = ClientCommand::new_tx(TxEnvelope::witnessed("84a3"));
        let json = serde_json::to_string(&cmd).expect("serialize");
        let back: ClientCommand = serde_json::from_str(&json).expect("parse");
        assert_eq!(back, cmd);
    }
}
