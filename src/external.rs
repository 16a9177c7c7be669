//! External capability seams.
//!
//! Signing and chain queries stay outside the core: the client never holds
//! private key material and never speaks HTTP itself. Callers plug
//! implementations of these traits in through the client builder.
//!
//! | Trait | Used for |
//! |-------|----------|
//! | [`Signer`] | Witnessing unwitnessed envelopes before `NewTx` |
//! | [`ChainQuery`] | Pre-validating commitments before create/join |
//!
//! Chain-query failures degrade to warnings in the pre-validation paths;
//! the node performs its own authoritative validation either way.

// ============================================================================
// Imports
// ============================================================================

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::protocol::model::TxEnvelope;

// ============================================================================
// Signer
// ============================================================================

/// Transaction signing capability.
///
/// Invoked by the client facade before a `NewTx` when the payload is not
/// yet witnessed. Implementations own the key material.
#[async_trait]
pub trait Signer: Send + Sync {
    /// Witnesses a transaction envelope.
    ///
    /// # Errors
    ///
    /// [`Error::Signing`] when the envelope cannot be witnessed; surfaced
    /// verbatim to the submitting caller.
    async fn sign(&self, transaction: TxEnvelope) -> Result<TxEnvelope>;
}

// ============================================================================
// ChainQuery
// ============================================================================

/// Layer-1 lookup capability.
///
/// Optional; used only to pre-validate participant funds before a head is
/// created or joined.
#[async_trait]
pub trait ChainQuery: Send + Sync {
    /// Looks up balance information for an address.
    ///
    /// # Errors
    ///
    /// [`Error::ChainQuery`] when the backing service cannot answer.
    async fn lookup_address_info(&self, address: &str) -> Result<AddressInfo>;
}

// ============================================================================
// AddressInfo
// ============================================================================

/// Balance summary for one address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressInfo {
    /// The queried address.
    pub address: String,
    /// Total ada held by the address.
    pub lovelace: u64,
    /// Number of unspent outputs at the address.
    pub utxo_count: usize,
}

impl AddressInfo {
    /// Creates an address summary.
    #[inline]
    #[must_use]
    pub fn new(address: impl Into<String>, lovelace: u64, utxo_count: usize) -> Self {
        Self {
            address: address.into(),
            lovelace,
            utxo_count,
        }
    }
}

// ============================================================================
// PreSignedSigner
// ============================================================================

/// Passthrough signer for callers whose envelopes arrive already witnessed.
///
/// Rejects unwitnessed envelopes instead of forwarding them to the node,
/// which would refuse them with less context.
#[derive(Debug, Clone, Copy, Default)]
pub struct PreSignedSigner;

impl PreSignedSigner {
    /// Creates the passthrough signer.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Signer for PreSignedSigner {
    async fn sign(&self, transaction: TxEnvelope) -> Result<TxEnvelope> {
        if transaction.is_witnessed() {
            Ok(transaction)
        } else {
            Err(Error::signing(
                "envelope is unwitnessed and no signing backend is configured",
            ))
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    struct FixedChainQuery;

    #[async_trait]
    impl ChainQuery for FixedChainQuery {
        async fn lookup_address_info(&self, address: &str) -> Result<AddressInfo> {
            Ok(AddressInfo::new(address, 5_000_000, 2))
        }
    }

    #[tokio::test]
    async fn test_pre_signed_passthrough() {
        let signer = PreSignedSigner::new();
        let tx = TxEnvelope::witnessed("84a3");

        let signed = signer.sign(tx.clone()).await.expect("passthrough");
        assert_eq!(signed, tx);
    }

    #[tokio::test]
    async fn test_pre_signed_rejects_unwitnessed() {
        let signer = PreSignedSigner::new();
        let tx = TxEnvelope::unwitnessed("84a3");

        let err = signer.sign(tx).await.unwrap_err();
        assert!(matches!(err, Error::Signing { .. }));
    }

    #[tokio::test]
    async fn test_chain_query_object_safe() {
        let query: Arc<dyn ChainQuery> = Arc::new(FixedChainQuery);
        let info = query
            .lookup_address_info("addr_test1vq0")
            .await
            .expect("lookup");

        assert_eq!(info.address, "addr_test1vq0");
        assert_eq!(info.lovelace, 5_000_000);
        assert_eq!(info.utxo_count, 2);
    }
}
