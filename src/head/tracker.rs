//! Submitted-transaction tracking.
//!
//! Every submission gets a [`LocalRef`] and a tracker entry that follows
//! the transaction from submission to a terminal status. Node echoes carry
//! either a `txId` or the original CBOR payload; matching tries the id
//! first and falls back to the payload fingerprint, so entries are only
//! ever resolved by identity and never by position.
//!
//! # Status Lifecycle
//!
//! | Status | Meaning | Terminal |
//! |--------|---------|----------|
//! | [`TxStatus::Submitted`] | `NewTx` sent, no node reaction yet | no |
//! | [`TxStatus::Acknowledged`] | Node validated it (`TxValid`) | no |
//! | [`TxStatus::Confirmed`] | Included in a confirmed snapshot | yes |
//! | [`TxStatus::Rejected`] | Node refused it (`TxInvalid`, `CommandFailed`) | yes |
//! | [`TxStatus::Expired`] | A progress timeout elapsed | yes |
//!
//! Terminal statuses are never overwritten; late echoes for a settled
//! entry are logged and dropped. Terminal entries linger for a retention
//! window so a second `await` observes the cached outcome, then the sweep
//! prunes them.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::time::{Duration, Instant};

use rustc_hash::FxHashMap;
use serde_json::Value;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::identifiers::{LocalRef, TxId};
use crate::protocol::model::TxEnvelope;

// ============================================================================
// TxStatus
// ============================================================================

/// Lifecycle status of one tracked transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxStatus {
    /// Sent to the node, no reaction observed yet.
    Submitted,
    /// The node validated the transaction against its local ledger.
    Acknowledged,
    /// The transaction is part of a multi-signed confirmed snapshot.
    Confirmed,
    /// The node refused the transaction.
    Rejected {
        /// Node-side rejection reason.
        reason: String,
    },
    /// No progress within the configured window.
    Expired,
}

impl TxStatus {
    /// Returns `true` once the status can no longer change.
    #[inline]
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Confirmed | Self::Rejected { .. } | Self::Expired)
    }
}

impl fmt::Display for TxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Submitted => f.write_str("submitted"),
            Self::Acknowledged => f.write_str("acknowledged"),
            Self::Confirmed => f.write_str("confirmed"),
            Self::Rejected { reason } => write!(f, "rejected: {reason}"),
            Self::Expired => f.write_str("expired"),
        }
    }
}

// ============================================================================
// PendingTransaction
// ============================================================================

/// One tracked submission.
#[derive(Debug, Clone)]
pub struct PendingTransaction {
    /// Client-side correlation identifier.
    pub local_ref: LocalRef,
    /// The envelope as sent to the node.
    pub envelope: TxEnvelope,
    /// Current lifecycle status.
    pub status: TxStatus,
    /// When the submission was sent.
    pub submitted_at: Instant,
    /// When the node acknowledged it.
    pub acknowledged_at: Option<Instant>,
    /// When the entry reached a terminal status.
    pub settled_at: Option<Instant>,
}

impl PendingTransaction {
    /// Node-assigned transaction id, once known.
    #[inline]
    #[must_use]
    pub fn tx_id(&self) -> Option<&TxId> {
        self.envelope.tx_id.as_ref()
    }
}

// ============================================================================
// AwaitRegistration
// ============================================================================

/// Outcome of registering interest in a tracked transaction.
#[derive(Debug)]
pub enum AwaitRegistration {
    /// The entry already settled; the status is final.
    Ready(TxStatus),
    /// The entry is still in flight; resolves when it settles.
    Wait(oneshot::Receiver<TxStatus>),
}

// ============================================================================
// SweepStats
// ============================================================================

/// What one maintenance sweep did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SweepStats {
    /// Entries moved to [`TxStatus::Expired`].
    pub expired: usize,
    /// Settled entries removed after the retention window.
    pub pruned: usize,
}

// ============================================================================
// TransactionTracker
// ============================================================================

/// Tracks all in-flight and recently settled submissions of one head.
///
/// Single-writer like the state machine: the event pump resolves echoes,
/// the facade submits and awaits through the owning head cell.
#[derive(Debug, Default)]
pub struct TransactionTracker {
    entries: FxHashMap<LocalRef, PendingTransaction>,
    /// Submission order, oldest first. Matching scans in this order so
    /// duplicate payloads resolve deterministically.
    order: Vec<LocalRef>,
    waiters: FxHashMap<LocalRef, Vec<oneshot::Sender<TxStatus>>>,
}

impl TransactionTracker {
    /// Creates an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tracked entries, settled ones included.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when nothing is tracked.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Looks up one entry.
    #[inline]
    #[must_use]
    pub fn get(&self, local_ref: LocalRef) -> Option<&PendingTransaction> {
        self.entries.get(&local_ref)
    }

    /// Entries that have not reached a terminal status.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.entries
            .values()
            .filter(|e| !e.status.is_terminal())
            .count()
    }

    // ------------------------------------------------------------------------
    // Submission
    // ------------------------------------------------------------------------

    /// Registers a sent envelope and returns its correlation identifier.
    pub fn submit(&mut self, envelope: TxEnvelope) -> LocalRef {
        let local_ref = LocalRef::generate();
        self.entries.insert(
            local_ref,
            PendingTransaction {
                local_ref,
                envelope,
                status: TxStatus::Submitted,
                submitted_at: Instant::now(),
                acknowledged_at: None,
                settled_at: None,
            },
        );
        self.order.push(local_ref);
        local_ref
    }

    // ------------------------------------------------------------------------
    // Node Echo Resolution
    // ------------------------------------------------------------------------

    /// Applies a `TxValid` echo.
    ///
    /// Moves the matched entry to [`TxStatus::Acknowledged`] and backfills
    /// the node-assigned id. Echoes for unknown or settled entries are
    /// dropped.
    pub fn on_tx_valid(&mut self, echo: &TxEnvelope) -> Option<LocalRef> {
        let local_ref = match self.match_entry(echo) {
            Some(local_ref) => local_ref,
            None => {
                warn!(tx = %echo, "TxValid without a matching submission");
                return None;
            }
        };

        let entry = self.entries.get_mut(&local_ref)?;
        if entry.status != TxStatus::Submitted {
            debug!(%local_ref, status = %entry.status, "duplicate TxValid dropped");
            return None;
        }

        entry.status = TxStatus::Acknowledged;
        entry.acknowledged_at = Some(Instant::now());
        if entry.envelope.tx_id.is_none() {
            entry.envelope.tx_id = echo.tx_id.clone();
        }
        Some(local_ref)
    }

    /// Applies a `TxInvalid` echo: the matched entry settles as rejected.
    pub fn on_tx_invalid(&mut self, echo: &TxEnvelope, reason: &str) -> Option<LocalRef> {
        let local_ref = match self.match_entry(echo) {
            Some(local_ref) => local_ref,
            None => {
                warn!(tx = %echo, reason, "TxInvalid without a matching submission");
                return None;
            }
        };

        self.settle(
            local_ref,
            TxStatus::Rejected {
                reason: reason.to_string(),
            },
        );
        Some(local_ref)
    }

    /// Applies the confirmed-transaction list of a fresh snapshot.
    ///
    /// `confirmed` is `None` when the node omits the list entirely; older
    /// node versions do, and then every acknowledged entry is treated as
    /// confirmed. An explicit empty list confirms nothing.
    pub fn on_snapshot_confirmed(&mut self, confirmed: Option<&[String]>) -> Vec<LocalRef> {
        let mut settled = Vec::new();

        match confirmed {
            None => {
                for local_ref in self.order.iter().copied() {
                    let Some(entry) = self.entries.get(&local_ref) else {
                        continue;
                    };
                    if entry.status == TxStatus::Acknowledged {
                        settled.push(local_ref);
                    }
                }
            }
            Some(ids) => {
                for id in ids {
                    for local_ref in self.order.iter().copied() {
                        let Some(entry) = self.entries.get(&local_ref) else {
                            continue;
                        };
                        if entry.status.is_terminal() || settled.contains(&local_ref) {
                            continue;
                        }
                        let by_id =
                            entry.envelope.tx_id.as_ref().map(TxId::as_str) == Some(id.as_str());
                        let by_payload = entry.envelope.cbor_hex == *id;
                        if by_id || by_payload {
                            if entry.status == TxStatus::Submitted {
                                debug!(%local_ref, "confirmed without an observed TxValid");
                            }
                            settled.push(local_ref);
                            break;
                        }
                    }
                }
            }
        }

        for local_ref in &settled {
            self.settle(*local_ref, TxStatus::Confirmed);
        }
        settled
    }

    /// Rejects an entry that never reached the node.
    ///
    /// Used when the send itself fails; no echo will ever arrive for the
    /// entry, so it settles here with the transport reason.
    pub fn reject(&mut self, local_ref: LocalRef, reason: impl Into<String>) {
        self.settle(
            local_ref,
            TxStatus::Rejected {
                reason: reason.into(),
            },
        );
    }

    /// Applies a `CommandFailed` reply.
    ///
    /// Only `NewTx` refusals concern the tracker; the refused envelope is
    /// settled as rejected.
    pub fn on_command_failed(&mut self, client_input: &Value) -> Option<LocalRef> {
        if client_input.get("tag").and_then(Value::as_str) != Some("NewTx") {
            return None;
        }
        let echo: TxEnvelope =
            serde_json::from_value(client_input.get("transaction")?.clone()).ok()?;

        let local_ref = self.match_entry(&echo)?;
        self.settle(
            local_ref,
            TxStatus::Rejected {
                reason: "command refused by node".to_string(),
            },
        );
        Some(local_ref)
    }

    /// Finds the oldest unsettled entry matching an echoed envelope.
    ///
    /// Prefers the node-assigned id when both sides know it, then falls
    /// back to the CBOR payload fingerprint.
    fn match_entry(&self, echo: &TxEnvelope) -> Option<LocalRef> {
        if let Some(id) = &echo.tx_id {
            for local_ref in &self.order {
                let Some(entry) = self.entries.get(local_ref) else {
                    continue;
                };
                if !entry.status.is_terminal() && entry.envelope.tx_id.as_ref() == Some(id) {
                    return Some(*local_ref);
                }
            }
        }

        for local_ref in &self.order {
            let Some(entry) = self.entries.get(local_ref) else {
                continue;
            };
            if !entry.status.is_terminal() && entry.envelope.cbor_hex == echo.cbor_hex {
                return Some(*local_ref);
            }
        }
        None
    }

    // ------------------------------------------------------------------------
    // Awaiting
    // ------------------------------------------------------------------------

    /// Registers interest in an entry's terminal status.
    ///
    /// Returns `None` for unknown references, an immediate status for
    /// settled entries, and a receiver otherwise.
    pub fn register_waiter(&mut self, local_ref: LocalRef) -> Option<AwaitRegistration> {
        let entry = self.entries.get(&local_ref)?;
        if entry.status.is_terminal() {
            return Some(AwaitRegistration::Ready(entry.status.clone()));
        }

        let (tx, rx) = oneshot::channel();
        self.waiters.entry(local_ref).or_default().push(tx);
        Some(AwaitRegistration::Wait(rx))
    }

    /// Settles an entry and wakes its waiters. Terminal entries stay put.
    fn settle(&mut self, local_ref: LocalRef, status: TxStatus) {
        let Some(entry) = self.entries.get_mut(&local_ref) else {
            return;
        };
        if entry.status.is_terminal() {
            debug!(%local_ref, status = %entry.status, "late echo for a settled entry");
            return;
        }

        entry.status = status.clone();
        entry.settled_at = Some(Instant::now());

        if let Some(waiters) = self.waiters.remove(&local_ref) {
            for waiter in waiters {
                let _ = waiter.send(status.clone());
            }
        }
    }

    // ------------------------------------------------------------------------
    // Maintenance Sweep
    // ------------------------------------------------------------------------

    /// Expires stalled entries and prunes settled ones.
    ///
    /// `now` is injected so deadlines are decided at one instant for the
    /// whole sweep. Submitted entries expire after `ack_timeout`,
    /// acknowledged ones after `confirm_timeout`, and settled entries are
    /// removed once they have been terminal for `retention`.
    pub fn sweep(
        &mut self,
        now: Instant,
        ack_timeout: Duration,
        confirm_timeout: Duration,
        retention: Duration,
    ) -> SweepStats {
        let mut stats = SweepStats::default();
        let mut expired = Vec::new();
        let mut pruned = Vec::new();

        for local_ref in &self.order {
            let Some(entry) = self.entries.get(local_ref) else {
                continue;
            };
            match &entry.status {
                TxStatus::Submitted => {
                    if now.saturating_duration_since(entry.submitted_at) >= ack_timeout {
                        expired.push(*local_ref);
                    }
                }
                TxStatus::Acknowledged => {
                    let since = entry.acknowledged_at.unwrap_or(entry.submitted_at);
                    if now.saturating_duration_since(since) >= confirm_timeout {
                        expired.push(*local_ref);
                    }
                }
                _ => {
                    let Some(settled_at) = entry.settled_at else {
                        continue;
                    };
                    if now.saturating_duration_since(settled_at) >= retention {
                        pruned.push(*local_ref);
                    }
                }
            }
        }

        for local_ref in expired {
            warn!(%local_ref, "transaction expired without progress");
            self.settle(local_ref, TxStatus::Expired);
            stats.expired += 1;
        }

        for local_ref in pruned {
            self.entries.remove(&local_ref);
            self.waiters.remove(&local_ref);
            stats.pruned += 1;
        }
        if stats.pruned > 0 {
            self.order.retain(|r| self.entries.contains_key(r));
            debug!(pruned = stats.pruned, "settled entries pruned");
        }

        stats
    }
}

// ============================================================================
// Tests
// ============================================================================
