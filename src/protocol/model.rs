//! Ledger data model shared by commands and events.
//!
//! These types mirror the JSON shapes the Hydra node produces and accepts:
//! transaction envelopes, UTxO sets keyed by `txid#index` references, flat
//! unit-to-quantity value maps, and confirmed snapshot payloads.
//!
//! # Types
//!
//! | Type | Wire shape |
//! |------|-----------|
//! | [`TxEnvelope`] | `{"type", "description", "cborHex", "txId"?}` |
//! | [`OutputRef`] | `"{tx_id}#{index}"` map key |
//! | [`Utxo`] | `{"address", "value", "datum"?, ...}` |
//! | [`UtxoSet`] | object keyed by output reference |
//! | [`ValueMap`] | `{"lovelace": n, "{policy}{asset}": n, ...}` |
//! | [`SnapshotPayload`] | `"snapshot"` body of `SnapshotConfirmed` |

// ============================================================================
// Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::identifiers::{HeadId, TxId};

// ============================================================================
// Constants
// ============================================================================

/// Unit key for ada quantities inside a [`ValueMap`].
pub const LOVELACE: &str = "lovelace";

// ============================================================================
// TxKind
// ============================================================================

/// Envelope type accepted by the node for `NewTx`.
///
/// The wire names are the cardano-cli text-envelope types for the current
/// era.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxKind {
    /// Transaction body without witnesses; must pass through a signer.
    #[serde(rename = "Unwitnessed Tx ConwayEra")]
    Unwitnessed,

    /// Fully witnessed transaction, ready for submission.
    #[serde(rename = "Witnessed Tx ConwayEra")]
    Witnessed,

    /// Plain signed transaction envelope.
    #[serde(rename = "Tx ConwayEra")]
    Plain,
}

impl TxKind {
    /// Returns the wire name of this envelope type.
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unwitnessed => "Unwitnessed Tx ConwayEra",
            Self::Witnessed => "Witnessed Tx ConwayEra",
            Self::Plain => "Tx ConwayEra",
        }
    }

    /// Returns `true` if envelopes of this type carry witnesses.
    #[inline]
    #[must_use]
    pub const fn is_witnessed(self) -> bool {
        matches!(self, Self::Witnessed | Self::Plain)
    }
}

impl fmt::Display for TxKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// TxEnvelope
// ============================================================================

/// CBOR transaction envelope submitted via `NewTx` and echoed back in
/// `TxValid` / `TxInvalid` events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TxEnvelope {
    /// Envelope type.
    #[serde(rename = "type")]
    pub kind: TxKind,

    /// Free-form description; the node ignores it.
    #[serde(default)]
    pub description: String,

    /// Hex-encoded CBOR transaction body.
    #[serde(rename = "cborHex")]
    pub cbor_hex: String,

    /// Transaction id, when already known.
    #[serde(rename = "txId", default, skip_serializing_if = "Option::is_none")]
    pub tx_id: Option<TxId>,
}

impl TxEnvelope {
    /// Creates an envelope of the given type.
    #[inline]
    #[must_use]
    pub fn new(kind: TxKind, cbor_hex: impl Into<String>) -> Self {
        Self {
            kind,
            description: String::new(),
            cbor_hex: cbor_hex.into(),
            tx_id: None,
        }
    }

    /// Creates an unwitnessed envelope.
    #[inline]
    #[must_use]
    pub fn unwitnessed(cbor_hex: impl Into<String>) -> Self {
        Self::new(TxKind::Unwitnessed, cbor_hex)
    }

    /// Creates a witnessed envelope.
    #[inline]
    #[must_use]
    pub fn witnessed(cbor_hex: impl Into<String>) -> Self {
        Self::new(TxKind::Witnessed, cbor_hex)
    }

    /// Sets the description.
    #[inline]
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the transaction id.
    #[inline]
    #[must_use]
    pub fn with_tx_id(mut self, tx_id: TxId) -> Self {
        self.tx_id = Some(tx_id);
        self
    }

    /// Returns `true` if this envelope carries witnesses.
    #[inline]
    #[must_use]
    pub const fn is_witnessed(&self) -> bool {
        self.kind.is_witnessed()
    }

    /// Returns the payload fingerprint used to correlate node echoes.
    ///
    /// The node does not echo client correlation ids, so `TxValid` /
    /// `TxInvalid` matching falls back to the CBOR hex when no `txId`
    /// is present.
    #[inline]
    #[must_use]
    pub fn fingerprint(&self) -> &str {
        &self.cbor_hex
    }

    /// Validates the envelope before it is sent to the node.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] when the CBOR hex is empty or not valid
    /// hex.
    pub fn validate(&self) -> Result<()> {
        if self.cbor_hex.is_empty() {
            return Err(Error::invalid_argument("transaction cborHex is empty"));
        }

        if self.cbor_hex.len() % 2 != 0 || !is_hex(&self.cbor_hex) {
            return Err(Error::invalid_argument(format!(
                "transaction cborHex is not valid hex: {}",
                truncate_for_display(&self.cbor_hex)
            )));
        }

        Ok(())
    }
}

impl fmt::Display for TxEnvelope {
    /// Prints the node-assigned id when known, a truncated payload
    /// otherwise.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.tx_id {
            Some(tx_id) => write!(f, "{tx_id}"),
            None => f.write_str(&truncate_for_display(&self.cbor_hex)),
        }
    }
}

/// Returns `true` if the string is non-empty ASCII hex.
#[inline]
fn is_hex(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Shortens long payloads for error messages.
///
/// Cuts on a char boundary; payloads that fail hex validation can carry
/// arbitrary UTF-8.
fn truncate_for_display(s: &str) -> String {
    match s.char_indices().nth(32) {
        Some((i, _)) => format!("{}...", &s[..i]),
        None => s.to_string(),
    }
}

// ============================================================================
// ValidationError
// ============================================================================

/// Ledger validation failure attached to a `TxInvalid` event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationError {
    /// Node-side reason text.
    #[serde(default)]
    pub reason: String,
}

impl ValidationError {
    /// Creates a validation error with a reason.
    #[inline]
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

// ============================================================================
// ValueMap
// ============================================================================

/// Flat unit-to-quantity asset map.
///
/// Ada lives under the [`LOVELACE`] key; native assets under their
/// concatenated `{policy_id}{asset_name}` unit. Quantities are unsigned;
/// negative wire values fail decoding.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValueMap(BTreeMap<String, u64>);

impl ValueMap {
    /// Creates an empty value map.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a value map holding only ada.
    #[inline]
    #[must_use]
    pub fn from_lovelace(quantity: u64) -> Self {
        let mut map = BTreeMap::new();
        map.insert(LOVELACE.to_string(), quantity);
        Self(map)
    }

    /// Returns the ada quantity.
    #[inline]
    #[must_use]
    pub fn lovelace(&self) -> u64 {
        self.quantity_of(LOVELACE)
    }

    /// Returns the quantity of one unit, zero when absent.
    #[inline]
    #[must_use]
    pub fn quantity_of(&self, unit: &str) -> u64 {
        self.0.get(unit).copied().unwrap_or_default()
    }

    /// Adds a quantity to one unit.
    pub fn add(&mut self, unit: impl Into<String>, quantity: u64) {
        let entry = self.0.entry(unit.into()).or_default();
        *entry = entry.saturating_add(quantity);
    }

    /// Accumulates every unit of another map into this one.
    pub fn merge(&mut self, other: &ValueMap) {
        for (unit, quantity) in &other.0 {
            self.add(unit.clone(), *quantity);
        }
    }

    /// Iterates over `(unit, quantity)` pairs in unit order.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (&String, &u64)> {
        self.0.iter()
    }

    /// Returns `true` if no units are present.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// ============================================================================
// OutputRef
// ============================================================================

/// Reference to one transaction output, the `"{tx_id}#{index}"` key of a
/// [`UtxoSet`] entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OutputRef {
    /// Transaction that produced the output.
    pub tx_id: TxId,
    /// Output position within that transaction.
    pub index: u32,
}

impl OutputRef {
    /// Creates an output reference.
    #[inline]
    #[must_use]
    pub const fn new(tx_id: TxId, index: u32) -> Self {
        Self { tx_id, index }
    }

    /// Parses a `"{tx_id}#{index}"` reference.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] when the separator is missing, the tx id
    /// is not hex, or the index is not numeric.
    pub fn parse(reference: &str) -> Result<Self> {
        let (tx_id, index) = reference
            .split_once('#')
            .ok_or_else(|| invalid_reference(reference))?;

        if !is_hex(tx_id) {
            return Err(invalid_reference(reference));
        }

        let index: u32 = index.parse().map_err(|_| invalid_reference(reference))?;

        Ok(Self::new(TxId::new(tx_id), index))
    }
}

impl fmt::Display for OutputRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.tx_id, self.index)
    }
}

impl FromStr for OutputRef {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[inline]
fn invalid_reference(reference: &str) -> Error {
    Error::invalid_argument(format!("invalid output reference: {reference}"))
}

// ============================================================================
// Utxo
// ============================================================================

/// One unspent transaction output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Utxo {
    /// Address holding the output.
    pub address: String,

    /// Assets locked in the output.
    pub value: ValueMap,

    /// Attached datum, when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datum: Option<Value>,

    /// Hash of the attached datum.
    #[serde(rename = "datumhash", default, skip_serializing_if = "Option::is_none")]
    pub datum_hash: Option<String>,

    /// Inline datum, when present.
    #[serde(rename = "inlineDatum", default, skip_serializing_if = "Option::is_none")]
    pub inline_datum: Option<Value>,

    /// Reference script attached to the output.
    #[serde(
        rename = "referenceScript",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub reference_script: Option<Value>,
}

impl Utxo {
    /// Creates an output with an address and value.
    #[inline]
    #[must_use]
    pub fn new(address: impl Into<String>, value: ValueMap) -> Self {
        Self {
            address: address.into(),
            value,
            datum: None,
            datum_hash: None,
            inline_datum: None,
            reference_script: None,
        }
    }
}

// ============================================================================
// UtxoSet
// ============================================================================

/// UTxO map keyed by output reference, as the node serializes it.
///
/// Keys stay in their wire form; [`OutputRef::parse`] validates them at
/// the call sites that need the structured form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UtxoSet(BTreeMap<String, Utxo>);

impl UtxoSet {
    /// Creates an empty set.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of outputs in the set.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the set holds no outputs.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Inserts an output under its reference.
    pub fn insert(&mut self, reference: OutputRef, utxo: Utxo) {
        self.0.insert(reference.to_string(), utxo);
    }

    /// Looks up an output by reference.
    #[inline]
    #[must_use]
    pub fn get(&self, reference: &OutputRef) -> Option<&Utxo> {
        self.0.get(&reference.to_string())
    }

    /// Returns `true` if the reference is present.
    #[inline]
    #[must_use]
    pub fn contains(&self, reference: &OutputRef) -> bool {
        self.0.contains_key(&reference.to_string())
    }

    /// Iterates over `(reference, output)` pairs in reference order.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Utxo)> {
        self.0.iter()
    }

    /// Total ada across all outputs.
    #[must_use]
    pub fn total_lovelace(&self) -> u64 {
        self.0
            .values()
            .fold(0u64, |acc, utxo| acc.saturating_add(utxo.value.lovelace()))
    }

    /// Total quantity of one unit across all outputs.
    #[must_use]
    pub fn total_of(&self, unit: &str) -> u64 {
        self.0.values().fold(0u64, |acc, utxo| {
            acc.saturating_add(utxo.value.quantity_of(unit))
        })
    }

    /// Aggregate value across all outputs.
    #[must_use]
    pub fn aggregate_value(&self) -> ValueMap {
        let mut total = ValueMap::new();
        for utxo in self.0.values() {
            total.merge(&utxo.value);
        }
        total
    }

    /// Outputs held by one address.
    pub fn held_by<'a>(&'a self, address: &'a str) -> impl Iterator<Item = (&'a String, &'a Utxo)> {
        self.0.iter().filter(move |(_, utxo)| utxo.address == address)
    }
}

// ============================================================================
// Party
// ============================================================================

/// Head member as the node identifies it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Party {
    /// Hydra verification key of the member.
    pub vkey: String,
}

impl Party {
    /// Creates a party from its verification key.
    #[inline]
    #[must_use]
    pub fn new(vkey: impl Into<String>) -> Self {
        Self { vkey: vkey.into() }
    }
}

// ============================================================================
// NodeHeadStatus
// ============================================================================

/// Head status as reported by the node in `Greetings`.
///
/// This is the node's vocabulary, not the local lifecycle: `Closed` covers
/// both the contestation window and the fanout wait, which the local state
/// machine distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeHeadStatus {
    /// No head is in progress.
    Idle,
    /// Init observed, commits outstanding.
    Initializing,
    /// Head is open for transactions.
    Open,
    /// Close posted; contestation in progress.
    Closed,
    /// Contestation deadline passed; fanout may be posted.
    FanoutPossible,
    /// Head settled back to layer one.
    Final,
}

impl NodeHeadStatus {
    /// Returns the wire name of the status.
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Initializing => "Initializing",
            Self::Open => "Open",
            Self::Closed => "Closed",
            Self::FanoutPossible => "FanoutPossible",
            Self::Final => "Final",
        }
    }
}

impl fmt::Display for NodeHeadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SnapshotPayload
// ============================================================================

/// Body of the `snapshot` field in a `SnapshotConfirmed` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotPayload {
    /// Head the snapshot belongs to.
    #[serde(rename = "headId", default, skip_serializing_if = "Option::is_none")]
    pub head_id: Option<HeadId>,

    /// Monotonic snapshot sequence number.
    #[serde(rename = "snapshotNumber")]
    pub snapshot_number: u64,

    /// Confirmed ledger state at this snapshot.
    #[serde(default)]
    pub utxo: UtxoSet,

    /// Transactions the snapshot confirms.
    ///
    /// Node versions differ here: id strings, envelope objects, or the
    /// field missing entirely. `None` means the node did not say.
    #[serde(
        rename = "confirmedTransactions",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub confirmed_transactions: Option<Vec<Value>>,

    /// Outputs scheduled to leave the head.
    #[serde(
        rename = "utxoToDecommit",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub utxo_to_decommit: Option<UtxoSet>,

    /// Snapshot format version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u64>,
}

impl SnapshotPayload {
    /// Extracts the confirmed transaction identities, tolerating the shape
    /// differences across node versions.
    ///
    /// Returns `None` when the node omitted the field; an empty vec means
    /// the snapshot explicitly confirms nothing.
    #[must_use]
    pub fn confirmed_tx_ids(&self) -> Option<Vec<String>> {
        let raw = self.confirmed_transactions.as_ref()?;

        let ids = raw
            .iter()
            .filter_map(|entry| match entry {
                Value::String(id) => Some(id.clone()),
                Value::Object(fields) => fields
                    .get("txId")
                    .or_else(|| fields.get("id"))
                    .or_else(|| fields.get("cborHex"))
                    .and_then(Value::as_str)
                    .map(str::to_string),
                _ => None,
            })
            .collect();

        Some(ids)
    }
}

// ============================================================================
// Snapshot
// ============================================================================

/// Latest confirmed snapshot cached locally for one head.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Snapshot sequence number, non-decreasing over the head's lifetime.
    pub number: u64,

    /// Confirmed ledger state at this snapshot.
    pub utxo: UtxoSet,
}

impl Snapshot {
    /// Creates a snapshot.
    #[inline]
    #[must_use]
    pub const fn new(number: u64, utxo: UtxoSet) -> Self {
        Self { number, utxo }
    }

    /// Creates the initial snapshot from the opening UTxO.
    #[inline]
    #[must_use]
    pub const fn genesis(utxo: UtxoSet) -> Self {
        Self::new(0, utxo)
    }
}

impl From<SnapshotPayload> for Snapshot {
    fn from(payload: SnapshotPayload) -> Self {
        Self::new(payload.snapshot_number, payload.utxo)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tx_kind_wire_names() {
        let json = serde_json::to_string(&TxKind::Witnessed).expect("serialize");
        assert_eq!(json, "\"Witnessed Tx ConwayEra\"");

        let back: TxKind = serde_json::from_str("\"Unwitnessed Tx ConwayEra\"").expect("parse");
        assert_eq!(back, TxKind::Unwitnessed);
    }

    #[test]
    fn test_envelope_validate_ok() {
        let tx = TxEnvelope::witnessed("84a300d901");
        assert!(tx.validate().is_ok());
    }

    #[test]
    fn test_envelope_validate_empty() {
        let tx = TxEnvelope::witnessed("");
        let err = tx.validate().unwrap_err();
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn test_envelope_validate_not_hex() {
        let tx = TxEnvelope::witnessed("zzzz");
        assert!(tx.validate().is_err());

        let odd = TxEnvelope::witnessed("abc");
        assert!(odd.validate().is_err());
    }

    #[test]
    fn test_envelope_validate_non_ascii_payload() {
        // 33 bytes, odd length, with a multi-byte char straddling byte 32.
        let odd = TxEnvelope::witnessed(format!("a{}", "é".repeat(16)));
        assert!(odd.validate().is_err());

        // 34 bytes, even length, rejected by the hex check instead.
        let not_hex = TxEnvelope::witnessed(format!("a{}b", "é".repeat(16)));
        assert!(not_hex.validate().is_err());
    }

    #[test]
    fn test_envelope_display_truncates_on_char_boundary() {
        let tx = TxEnvelope::witnessed("é".repeat(40));
        let shown = tx.to_string();
        assert!(shown.ends_with("..."));
        assert_eq!(shown.chars().count(), 32 + 3);
    }

    #[test]
    fn test_envelope_serde_field_names() {
        let tx = TxEnvelope::unwitnessed("84a3")
            .with_description("payment")
            .with_tx_id(TxId::new("aabb"));
        let json = serde_json::to_string(&tx).expect("serialize");

        assert!(json.contains("\"type\":\"Unwitnessed Tx ConwayEra\""));
        assert!(json.contains("\"cborHex\":\"84a3\""));
        assert!(json.contains("\"txId\":\"aabb\""));
    }

    #[test]
    fn test_envelope_tx_id_omitted_when_absent() {
        let tx = TxEnvelope::witnessed("84a3");
        let json = serde_json::to_string(&tx).expect("serialize");
        assert!(!json.contains("txId"));
    }

    #[test]
    fn test_value_map_lovelace() {
        let value = ValueMap::from_lovelace(1_500_000);
        assert_eq!(value.lovelace(), 1_500_000);
        assert_eq!(value.quantity_of("missing"), 0);
    }

    #[test]
    fn test_value_map_merge() {
        let mut a = ValueMap::from_lovelace(100);
        a.add("policytoken", 5);

        let mut b = ValueMap::from_lovelace(50);
        b.add("policytoken", 3);

        a.merge(&b);
        assert_eq!(a.lovelace(), 150);
        assert_eq!(a.quantity_of("policytoken"), 8);
    }

    #[test]
    fn test_value_map_rejects_negative() {
        let result: std::result::Result<ValueMap, _> =
            serde_json::from_str(r#"{"lovelace": -5}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_output_ref_roundtrip() {
        let reference = OutputRef::new(TxId::new("deadbeef"), 2);
        assert_eq!(reference.to_string(), "deadbeef#2");

        let parsed = OutputRef::parse("deadbeef#2").expect("parse");
        assert_eq!(parsed, reference);
    }

    #[test]
    fn test_output_ref_rejects_malformed() {
        assert!(OutputRef::parse("deadbeef").is_err());
        assert!(OutputRef::parse("nothex#0").is_err());
        assert!(OutputRef::parse("deadbeef#x").is_err());
        assert!(OutputRef::parse("#0").is_err());
    }

    #[test]
    fn test_output_ref_orders_by_tx_id_then_index() {
        let mut refs: Vec<OutputRef> = ["bb#0", "aa#1", "aa#0", "cc#2"]
            .iter()
            .map(|r| OutputRef::parse(r).expect("parse"))
            .collect();
        refs.sort();

        let ordered: Vec<String> = refs.iter().map(OutputRef::to_string).collect();
        assert_eq!(ordered, vec!["aa#0", "aa#1", "bb#0", "cc#2"]);
    }

    #[test]
    fn test_utxo_set_totals() {
        let mut set = UtxoSet::new();
        set.insert(
            OutputRef::new(TxId::new("aa"), 0),
            Utxo::new("addr_test1vq0", ValueMap::from_lovelace(400)),
        );
        set.insert(
            OutputRef::new(TxId::new("bb"), 1),
            Utxo::new("addr_test1vq1", ValueMap::from_lovelace(600)),
        );

        assert_eq!(set.len(), 2);
        assert_eq!(set.total_lovelace(), 1000);
        assert_eq!(set.held_by("addr_test1vq0").count(), 1);
    }

    #[test]
    fn test_utxo_set_decode_wire_shape() {
        let json = r#"{
            "aabbcc#0": {
                "address": "addr_test1vq0",
                "value": {"lovelace": 989834587},
                "datumhash": null
            }
        }"#;

        let set: UtxoSet = serde_json::from_str(json).expect("decode");
        assert_eq!(set.len(), 1);
        assert_eq!(set.total_lovelace(), 989834587);

        let reference = OutputRef::parse("aabbcc#0").expect("parse");
        let utxo = set.get(&reference).expect("entry");
        assert_eq!(utxo.address, "addr_test1vq0");
        assert!(utxo.datum_hash.is_none());
    }

    #[test]
    fn test_snapshot_payload_decode() {
        let json = r#"{
            "headId": "84e6af02",
            "snapshotNumber": 7,
            "utxo": {},
            "confirmedTransactions": ["aabb", {"txId": "ccdd"}],
            "version": 1
        }"#;

        let payload: SnapshotPayload = serde_json::from_str(json).expect("decode");
        assert_eq!(payload.snapshot_number, 7);
        assert_eq!(payload.head_id, Some(HeadId::new("84e6af02")));

        let ids = payload.confirmed_tx_ids().expect("ids present");
        assert_eq!(ids, vec!["aabb".to_string(), "ccdd".to_string()]);
    }

    #[test]
    fn test_snapshot_payload_missing_confirmed_list() {
        let json = r#"{"snapshotNumber": 1}"#;
        let payload: SnapshotPayload = serde_json::from_str(json).expect("decode");
        assert!(payload.confirmed_tx_ids().is_none());
        assert!(payload.utxo.is_empty());
    }

    #[test]
    fn test_snapshot_from_payload() {
        let json = r#"{"snapshotNumber": 3, "utxo": {}}"#;
        let payload: SnapshotPayload = serde_json::from_str(json).expect("decode");

        let snapshot = Snapshot::from(payload);
        assert_eq!(snapshot.number, 3);
        assert!(snapshot.utxo.is_empty());
    }

    #[test]
    fn test_node_head_status_wire_names() {
        let status: NodeHeadStatus = serde_json::from_str("\"FanoutPossible\"").expect("parse");
        assert_eq!(status, NodeHeadStatus::FanoutPossible);
        assert_eq!(status.to_string(), "FanoutPossible");
    }
}
