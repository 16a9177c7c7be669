//! Type-safe identifiers for protocol entities.
//!
//! Newtype wrappers prevent mixing up the various string and numeric
//! identifiers that cross the wire.
//!
//! | Type | Source | Description |
//! |------|--------|-------------|
//! | [`HeadId`] | node | Opaque identifier of one head instance |
//! | [`TxId`] | node | Ledger transaction identifier |
//! | [`LocalRef`] | client | Correlation id for a local submission |
//! | [`Participant`] | caller | Address identity of one head member |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// HeadId
// ============================================================================

/// Opaque identifier of a head, assigned by the node at initialization.
///
/// The node derives it on-chain; the client treats it as an opaque token
/// and never inspects its structure.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HeadId(String);

impl HeadId {
    /// Creates a head identifier from its wire representation.
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HeadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for HeadId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

// ============================================================================
// TxId
// ============================================================================

/// Ledger transaction identifier, assigned by the node.
///
/// Hex-encoded hash of the transaction body. Absent on a pending
/// submission until the node acknowledges it. Ordered so that output
/// references keyed on it sort deterministically.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TxId(String);

impl TxId {
    /// Creates a transaction identifier from its wire representation.
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TxId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

// ============================================================================
// LocalRef
// ============================================================================

/// Client-generated correlation identifier for one submission.
///
/// Unique per process run. Never sent to the node; used to correlate a
/// caller's submission handle with the tracker entry it resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocalRef(Uuid);

impl LocalRef {
    /// Generates a fresh correlation identifier.
    #[inline]
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for LocalRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Participant
// ============================================================================

/// Address identity of one head member.
///
/// Bech32 Cardano address text. Participant sets are fixed at head
/// initialization and immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Participant(String);

impl Participant {
    /// Creates a participant identity from an address string.
    #[inline]
    #[must_use]
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    /// Returns the address as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Participant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Participant {
    fn from(address: &str) -> Self {
        Self(address.to_string())
    }
}

// ============================================================================
// Tests
// ============================================================================
