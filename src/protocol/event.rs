//! Inbound event decoding.
//!
//! The node pushes JSON frames discriminated by a `tag` field. This module
//! is the only translation boundary from untyped wire data into the closed
//! [`NodeEvent`] set; tolerance for unknown tags and extra fields lives
//! here and nowhere else.
//!
//! # Event Tags
//!
//! | Category | Tags |
//! |----------|------|
//! | Lifecycle | `HeadIsInitializing`, `Committed`, `HeadIsOpen`, `HeadIsClosed`, `HeadIsContested`, `ReadyToFanout`, `HeadIsAborted`, `HeadIsFinalized` |
//! | Ledger | `SnapshotConfirmed`, `TxValid`, `TxInvalid`, `GetUTxOResponse` |
//! | Decommit | `DecommitRequested`, `DecommitApproved`, `DecommitFinalized`, `DecommitInvalid` |
//! | Session | `Greetings`, `PeerConnected`, `PeerDisconnected` |
//! | Failures | `InvalidInput`, `CommandFailed`, `PostTxOnChainFailed` |
//!
//! `ConnectionLost` is synthetic: the transport session injects it when the
//! link drops, and no wire frame can produce it.

// ============================================================================
// Imports
// ============================================================================

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::Result;
use crate::identifiers::{HeadId, TxId};

use super::model::{NodeHeadStatus, Party, SnapshotPayload, TxEnvelope, UtxoSet, ValidationError};

// ============================================================================
// NodeEvent
// ============================================================================

/// Decoded inbound event.
///
/// Produced by [`decode_frame`], consumed exactly once by the head state
/// machine and transaction tracker, never mutated after creation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "tag")]
pub enum NodeEvent {
    /// Node handshake on connect; carries the authoritative head status.
    Greetings {
        /// Node-reported head status.
        #[serde(rename = "headStatus")]
        head_status: NodeHeadStatus,
        /// Last confirmed UTxO known to the node.
        #[serde(rename = "snapshotUtxo", default)]
        snapshot_utxo: Option<UtxoSet>,
        /// Node software version.
        #[serde(rename = "hydraNodeVersion", default)]
        hydra_node_version: Option<String>,
        /// The party this node signs for.
        #[serde(default)]
        me: Option<Party>,
    },

    /// An `Init` was observed on chain; commits may now be posted.
    HeadIsInitializing {
        /// Head being initialized.
        #[serde(rename = "headId")]
        head_id: HeadId,
        /// Full member set, fixed from here on.
        #[serde(default)]
        parties: Vec<Party>,
    },

    /// One party's deposit was registered.
    Committed {
        /// Head the commit belongs to.
        #[serde(rename = "headId", default)]
        head_id: Option<HeadId>,
        /// Party that committed.
        party: Party,
        /// Outputs pledged into the head.
        #[serde(default)]
        utxo: UtxoSet,
    },

    /// All commits collected; the head is open.
    HeadIsOpen {
        /// Opened head.
        #[serde(rename = "headId")]
        head_id: HeadId,
        /// Initial ledger state (snapshot zero).
        #[serde(default)]
        utxo: UtxoSet,
    },

    /// A snapshot reached multi-signed confirmation.
    SnapshotConfirmed {
        /// Head the snapshot belongs to.
        #[serde(rename = "headId", default)]
        head_id: Option<HeadId>,
        /// Confirmed snapshot body.
        snapshot: SnapshotPayload,
    },

    /// A submitted transaction passed ledger validation.
    TxValid {
        /// Head that validated the transaction.
        #[serde(rename = "headId", default)]
        head_id: Option<HeadId>,
        /// Echo of the submitted envelope.
        transaction: TxEnvelope,
    },

    /// A submitted transaction failed ledger validation.
    TxInvalid {
        /// Head that rejected the transaction.
        #[serde(rename = "headId", default)]
        head_id: Option<HeadId>,
        /// Echo of the submitted envelope.
        transaction: TxEnvelope,
        /// Why the ledger rejected it.
        #[serde(rename = "validationError", default)]
        validation_error: ValidationError,
        /// UTxO the validation ran against.
        #[serde(default)]
        utxo: UtxoSet,
    },

    /// A party asked to withdraw outputs from the head to layer 1.
    DecommitRequested {
        /// Head the withdrawal targets.
        #[serde(rename = "headId", default)]
        head_id: Option<HeadId>,
        /// Transaction spending the outputs being withdrawn.
        #[serde(rename = "decommitTx")]
        decommit_tx: TxEnvelope,
        /// Outputs leaving the head if the request is approved.
        #[serde(rename = "utxoToDecommit", default)]
        utxo_to_decommit: UtxoSet,
    },

    /// All parties signed off on a pending withdrawal.
    DecommitApproved {
        /// Head the withdrawal targets.
        #[serde(rename = "headId", default)]
        head_id: Option<HeadId>,
        /// Id of the approved decommit transaction.
        #[serde(rename = "decommitTxId")]
        decommit_tx_id: TxId,
        /// Outputs leaving the head.
        #[serde(rename = "utxoToDecommit", default)]
        utxo_to_decommit: UtxoSet,
    },

    /// A withdrawal settled on layer 1; its outputs left the head.
    DecommitFinalized {
        /// Head the withdrawal targeted.
        #[serde(rename = "headId", default)]
        head_id: Option<HeadId>,
        /// Id of the settled decommit transaction.
        #[serde(rename = "decommitTxId")]
        decommit_tx_id: TxId,
    },

    /// The node refused a withdrawal request.
    DecommitInvalid {
        /// Head the withdrawal targeted.
        #[serde(rename = "headId", default)]
        head_id: Option<HeadId>,
        /// The refused decommit transaction.
        #[serde(rename = "decommitTx")]
        decommit_tx: TxEnvelope,
        /// Node-side refusal detail.
        #[serde(rename = "decommitInvalidReason", default)]
        decommit_invalid_reason: Value,
    },

    /// A close was posted; the contestation window is running.
    HeadIsClosed {
        /// Closed head.
        #[serde(rename = "headId")]
        head_id: HeadId,
        /// Snapshot number the close was posted with.
        #[serde(rename = "snapshotNumber")]
        snapshot_number: u64,
        /// End of the contestation window.
        #[serde(rename = "contestationDeadline", default)]
        contestation_deadline: Option<String>,
    },

    /// Another participant contested the close with a newer snapshot.
    HeadIsContested {
        /// Contested head.
        #[serde(rename = "headId")]
        head_id: HeadId,
        /// Snapshot number of the contesting close.
        #[serde(rename = "snapshotNumber")]
        snapshot_number: u64,
        /// End of the extended contestation window.
        #[serde(rename = "contestationDeadline", default)]
        contestation_deadline: Option<String>,
    },

    /// Contestation deadline passed; fanout may be posted.
    ReadyToFanout {
        /// Head ready for fanout.
        #[serde(rename = "headId")]
        head_id: HeadId,
    },

    /// The initializing head was abandoned.
    HeadIsAborted {
        /// Aborted head.
        #[serde(rename = "headId")]
        head_id: HeadId,
        /// Returned commits.
        #[serde(default)]
        utxo: UtxoSet,
    },

    /// The head settled back to layer one.
    HeadIsFinalized {
        /// Finalized head.
        #[serde(rename = "headId")]
        head_id: HeadId,
        /// Distributed outputs.
        #[serde(default)]
        utxo: UtxoSet,
    },

    /// Reply to a `GetUTxO` command.
    #[serde(rename = "GetUTxOResponse")]
    GetUtxoResponse {
        /// Head the UTxO belongs to.
        #[serde(rename = "headId", default)]
        head_id: Option<HeadId>,
        /// Confirmed UTxO set.
        #[serde(default)]
        utxo: UtxoSet,
    },

    /// The node could not parse a client input.
    InvalidInput {
        /// Parser error text.
        #[serde(default)]
        reason: String,
        /// Offending input, truncated by the node.
        #[serde(default)]
        input: String,
    },

    /// A client command was refused in the current head state.
    CommandFailed {
        /// The refused command.
        #[serde(rename = "clientInput", default)]
        client_input: Value,
    },

    /// A chain transaction posted by the node failed.
    PostTxOnChainFailed {
        /// The failed chain transaction.
        #[serde(rename = "postChainTx", default)]
        post_chain_tx: Value,
        /// Node-side failure detail.
        #[serde(rename = "postTxError", default)]
        post_tx_error: Value,
    },

    /// A peer node connected.
    PeerConnected {
        /// Peer identity.
        peer: String,
    },

    /// A peer node disconnected.
    PeerDisconnected {
        /// Peer identity.
        peer: String,
    },

    /// Synthetic event injected by the transport session on link drop.
    ///
    /// Never decoded from the wire.
    #[serde(skip)]
    ConnectionLost,

    /// Catch-all for tags this client does not know.
    #[serde(other)]
    Unknown,
}

// ============================================================================
// NodeEvent Accessors
// ============================================================================

impl NodeEvent {
    /// Returns the tag name of this event.
    #[must_use]
    pub const fn tag(&self) -> &'static str {
        match self {
            Self::Greetings { .. } => "Greetings",
            Self::HeadIsInitializing { .. } => "HeadIsInitializing",
            Self::Committed { .. } => "Committed",
            Self::HeadIsOpen { .. } => "HeadIsOpen",
            Self::SnapshotConfirmed { .. } => "SnapshotConfirmed",
            Self::TxValid { .. } => "TxValid",
            Self::TxInvalid { .. } => "TxInvalid",
            Self::DecommitRequested { .. } => "DecommitRequested",
            Self::DecommitApproved { .. } => "DecommitApproved",
            Self::DecommitFinalized { .. } => "DecommitFinalized",
            Self::DecommitInvalid { .. } => "DecommitInvalid",
            Self::HeadIsClosed { .. } => "HeadIsClosed",
            Self::HeadIsContested { .. } => "HeadIsContested",
            Self::ReadyToFanout { .. } => "ReadyToFanout",
            Self::HeadIsAborted { .. } => "HeadIsAborted",
            Self::HeadIsFinalized { .. } => "HeadIsFinalized",
            Self::GetUtxoResponse { .. } => "GetUTxOResponse",
            Self::InvalidInput { .. } => "InvalidInput",
            Self::CommandFailed { .. } => "CommandFailed",
            Self::PostTxOnChainFailed { .. } => "PostTxOnChainFailed",
            Self::PeerConnected { .. } => "PeerConnected",
            Self::PeerDisconnected { .. } => "PeerDisconnected",
            Self::ConnectionLost => "ConnectionLost",
            Self::Unknown => "Unknown",
        }
    }

    /// Returns the head id the event is scoped to, when it carries one.
    #[must_use]
    pub fn head_id(&self) -> Option<&HeadId> {
        match self {
            Self::HeadIsInitializing { head_id, .. }
            | Self::HeadIsOpen { head_id, .. }
            | Self::HeadIsClosed { head_id, .. }
            | Self::HeadIsContested { head_id, .. }
            | Self::ReadyToFanout { head_id }
            | Self::HeadIsAborted { head_id, .. }
            | Self::HeadIsFinalized { head_id, .. } => Some(head_id),
            Self::Committed { head_id, .. }
            | Self::SnapshotConfirmed { head_id, .. }
            | Self::TxValid { head_id, .. }
            | Self::TxInvalid { head_id, .. }
            | Self::DecommitRequested { head_id, .. }
            | Self::DecommitApproved { head_id, .. }
            | Self::DecommitFinalized { head_id, .. }
            | Self::DecommitInvalid { head_id, .. }
            | Self::GetUtxoResponse { head_id, .. } => head_id.as_ref(),
            _ => None,
        }
    }
}

// ============================================================================
// Frame Decoding
// ============================================================================

/// Decodes one raw text frame into a [`NodeEvent`].
///
/// Unknown tags decode to [`NodeEvent::Unknown`] (logged, not an error).
/// Malformed JSON or known tags with invalid payloads return an error;
/// callers skip the frame and keep processing the stream.
///
/// # Errors
///
/// [`Error::Json`](crate::Error::Json) when the frame is not valid JSON or
/// a known tag carries an invalid payload.
pub fn decode_frame(text: &str) -> Result<NodeEvent> {
    let value: Value = serde_json::from_str(text)?;

    let tag = value
        .get("tag")
        .and_then(Value::as_str)
        .unwrap_or("<missing>")
        .to_string();

    match serde_json::from_value::<NodeEvent>(value) {
        Ok(NodeEvent::Unknown) => {
            debug!(%tag, "ignoring unrecognized event tag");
            Ok(NodeEvent::Unknown)
        }
        Ok(event) => Ok(event),
        Err(err) => {
            warn!(%tag, error = %err, "malformed event frame");
            Err(err.into())
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use crate::protocol::model::TxKind;

    #[test]
    fn test_decode_greetings() {
        let frame = r#"{
            "tag": "Greetings",
            "me": {"vkey": "ab01"},
            "headStatus": "Open",
            "snapshotUtxo": {},
            "timestamp": "2024-02-01T10:02:23.01234Z",
            "hydraNodeVersion": "0.19.0"
        }"#;

        let event = decode_frame(frame).expect("decode");
        match event {
            NodeEvent::Greetings {
                head_status,
                snapshot_utxo,
                hydra_node_version,
                me,
            } => {
                assert_eq!(head_status, NodeHeadStatus::Open);
                assert!(snapshot_utxo.expect("utxo").is_empty());
                assert_eq!(hydra_node_version.as_deref(), Some("0.19.0"));
                assert_eq!(me.expect("me").vkey, "ab01");
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_decode_head_is_initializing() {
        let frame = r#"{
            "tag": "HeadIsInitializing",
            "headId": "84e6af02",
            "parties": [{"vkey": "aa"}, {"vkey": "bb"}],
            "seq": 1,
            "timestamp": "2024-02-01T10:02:23.01234Z"
        }"#;

        let event = decode_frame(frame).expect("decode");
        assert_eq!(event.tag(), "HeadIsInitializing");
        assert_eq!(event.head_id().map(HeadId::as_str), Some("84e6af02"));

        match event {
            NodeEvent::HeadIsInitializing { parties, .. } => {
                assert_eq!(parties.len(), 2);
                assert_eq!(parties[0].vkey, "aa");
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_decode_snapshot_confirmed() {
        let frame = r#"{
            "tag": "SnapshotConfirmed",
            "headId": "84e6af02",
            "snapshot": {
                "headId": "84e6af02",
                "snapshotNumber": 5,
                "utxo": {},
                "confirmedTransactions": ["aabb"]
            },
            "seq": 12
        }"#;

        let event = decode_frame(frame).expect("decode");
        match event {
            NodeEvent::SnapshotConfirmed { snapshot, .. } => {
                assert_eq!(snapshot.snapshot_number, 5);
                assert_eq!(
                    snapshot.confirmed_tx_ids(),
                    Some(vec!["aabb".to_string()])
                );
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_decode_tx_valid() {
        let frame = r#"{
            "tag": "TxValid",
            "headId": "84e6af02",
            "transaction": {
                "type": "Witnessed Tx ConwayEra",
                "description": "",
                "cborHex": "84a300d901",
                "txId": "beef01"
            }
        }"#;

        let event = decode_frame(frame).expect("decode");
        match event {
            NodeEvent::TxValid { transaction, .. } => {
                assert_eq!(transaction.kind, TxKind::Witnessed);
                assert_eq!(transaction.cbor_hex, "84a300d901");
                assert_eq!(transaction.tx_id, Some(TxId::new("beef01")));
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_decode_tx_invalid_reason() {
        let frame = r#"{
            "tag": "TxInvalid",
            "headId": "84e6af02",
            "utxo": {},
            "transaction": {
                "type": "Witnessed Tx ConwayEra",
                "description": "",
                "cborHex": "84a300d901"
            },
            "validationError": {"reason": "MissingVKeyWitnessesUTXOW"}
        }"#;

        let event = decode_frame(frame).expect("decode");
        match event {
            NodeEvent::TxInvalid {
                validation_error, ..
            } => {
                assert_eq!(validation_error.reason, "MissingVKeyWitnessesUTXOW");
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_decode_decommit_requested() {
        let frame = r#"{
            "tag": "DecommitRequested",
            "headId": "84e6af02",
            "decommitTx": {
                "type": "Witnessed Tx ConwayEra",
                "description": "",
                "cborHex": "84a300d901"
            },
            "utxoToDecommit": {
                "aabb#0": {"address": "addr_test1vq0", "value": {"lovelace": 500}}
            },
            "seq": 14,
            "timestamp": "2024-02-01T10:05:23.01234Z"
        }"#;

        let event = decode_frame(frame).expect("decode");
        assert_eq!(event.head_id().map(HeadId::as_str), Some("84e6af02"));

        match event {
            NodeEvent::DecommitRequested {
                decommit_tx,
                utxo_to_decommit,
                ..
            } => {
                assert_eq!(decommit_tx.cbor_hex, "84a300d901");
                assert_eq!(utxo_to_decommit.total_lovelace(), 500);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_decode_decommit_approved_and_finalized() {
        let approved = decode_frame(
            r#"{
                "tag": "DecommitApproved",
                "headId": "84e6af02",
                "decommitTxId": "beef01",
                "utxoToDecommit": {}
            }"#,
        )
        .expect("decode");
        match approved {
            NodeEvent::DecommitApproved { decommit_tx_id, .. } => {
                assert_eq!(decommit_tx_id, TxId::new("beef01"));
            }
            other => panic!("unexpected event: {other:?}"),
        }

        let finalized = decode_frame(
            r#"{
                "tag": "DecommitFinalized",
                "headId": "84e6af02",
                "decommitTxId": "beef01"
            }"#,
        )
        .expect("decode");
        assert_eq!(finalized.tag(), "DecommitFinalized");
    }

    #[test]
    fn test_decode_decommit_invalid_reason() {
        let frame = r#"{
            "tag": "DecommitInvalid",
            "headId": "84e6af02",
            "decommitTx": {
                "type": "Witnessed Tx ConwayEra",
                "description": "",
                "cborHex": "84a300d901"
            },
            "decommitInvalidReason": {
                "tag": "DecommitTxInvalid",
                "localUtxo": {}
            }
        }"#;

        let event = decode_frame(frame).expect("decode");
        match event {
            NodeEvent::DecommitInvalid {
                decommit_invalid_reason,
                ..
            } => {
                assert_eq!(decommit_invalid_reason["tag"], "DecommitTxInvalid");
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_decode_head_is_closed() {
        let frame = r#"{
            "tag": "HeadIsClosed",
            "headId": "84e6af02",
            "snapshotNumber": 7,
            "contestationDeadline": "2024-02-01T10:12:23.01234Z"
        }"#;

        let event = decode_frame(frame).expect("decode");
        match event {
            NodeEvent::HeadIsClosed {
                snapshot_number,
                contestation_deadline,
                ..
            } => {
                assert_eq!(snapshot_number, 7);
                assert!(contestation_deadline.is_some());
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_decode_peer_events() {
        let connected = decode_frame(r#"{"tag": "PeerConnected", "peer": "2"}"#).expect("decode");
        assert_eq!(connected, NodeEvent::PeerConnected { peer: "2".into() });

        let disconnected =
            decode_frame(r#"{"tag": "PeerDisconnected", "peer": "2"}"#).expect("decode");
        assert_eq!(disconnected.tag(), "PeerDisconnected");
    }

    #[test]
    fn test_unknown_tag_is_not_an_error() {
        let event = decode_frame(r#"{"tag": "SomethingNew", "field": 1}"#).expect("decode");
        assert_eq!(event, NodeEvent::Unknown);
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        assert!(decode_frame("{not json").is_err());
    }

    #[test]
    fn test_missing_tag_is_an_error() {
        assert!(decode_frame(r#"{"headId": "84e6af02"}"#).is_err());
    }

    #[test]
    fn test_known_tag_with_bad_payload_is_an_error() {
        let frame = r#"{
            "tag": "SnapshotConfirmed",
            "snapshot": {"snapshotNumber": "not-a-number"}
        }"#;
        assert!(decode_frame(frame).is_err());
    }

    #[test]
    fn test_connection_lost_cannot_come_from_the_wire() {
        let event = decode_frame(r#"{"tag": "ConnectionLost"}"#).expect("decode");
        assert_eq!(event, NodeEvent::Unknown);
    }

    #[test]
    fn test_command_failed_carries_client_input() {
        let frame = r#"{
            "tag": "CommandFailed",
            "clientInput": {"tag": "NewTx", "transaction": {"cborHex": "84a3"}}
        }"#;

        let event = decode_frame(frame).expect("decode");
        match event {
            NodeEvent::CommandFailed { client_input } => {
                assert_eq!(client_input["tag"], "NewTx");
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }
}
