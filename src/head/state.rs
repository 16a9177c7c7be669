//! Head lifecycle state machine.
//!
//! The authoritative in-process model of one head's lifecycle. Decoded
//! events are applied strictly in arrival order; valid transitions mutate
//! the cached state, invalid ones are reported as protocol violations and
//! change nothing.
//!
//! # Lifecycle
//!
//! ```text
//!                    HeadIsInitializing
//!            ┌────────────────────────────┐
//!            │                            ▼
//!          Idle ◄──────────────────  Initializing ── Committed (×N)
//!            ▲    HeadIsAborted /        │
//!            │    commit timeout         │ HeadIsOpen
//!            │                            ▼
//!            │                          Open ◄── SnapshotConfirmed (loop)
//!            │                            │
//!            │                            │ HeadIsClosed
//!            │                            ▼
//!            │                         Closing ◄────────┐
//!            │                            │              │ HeadIsClosed
//!            │                            │ HeadIsContested   (higher snapshot)
//!            │                            ▼              │
//!            │                         Contested ────────┘
//!            │                            │
//!            │          HeadIsFinalized   │
//!            └────────── Final ◄──────────┘
//! ```
//!
//! `ConnectionLost` leaves every state unchanged; only the connectivity
//! flag on the owning head cell is cleared. The node remains the source of
//! truth: [`StateMachine::sync`] adopts its reported status wholesale, the
//! local machine is a cache with a validation layer.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::identifiers::HeadId;
use crate::protocol::event::NodeEvent;
use crate::protocol::model::{NodeHeadStatus, Party, Snapshot, UtxoSet};

// ============================================================================
// HeadState
// ============================================================================

/// Local lifecycle state of one head.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HeadState {
    /// No head is in progress.
    Idle,
    /// Init observed; waiting for all commits.
    Initializing,
    /// Head is open for transactions.
    Open,
    /// Close posted; contestation window running.
    Closing,
    /// A participant contested the close with a newer snapshot.
    Contested,
    /// Head settled back to layer one. Terminal.
    Final,
}

impl HeadState {
    /// Returns the state name.
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Initializing => "Initializing",
            Self::Open => "Open",
            Self::Closing => "Closing",
            Self::Contested => "Contested",
            Self::Final => "Final",
        }
    }

    /// Returns `true` for the terminal state.
    #[inline]
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Final)
    }

    /// Returns `true` while the head accepts `NewTx` submissions.
    #[inline]
    #[must_use]
    pub const fn accepts_transactions(self) -> bool {
        matches!(self, Self::Open)
    }
}

impl fmt::Display for HeadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// ProtocolViolation
// ============================================================================

/// A semantically invalid event for the current state.
///
/// Non-fatal: recorded and surfaced to the caller, the event is dropped and
/// the machine stays put. This protects against out-of-order or duplicate
/// delivery from the transport layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolViolation {
    /// Lifecycle state when the event arrived.
    pub state: HeadState,
    /// Tag of the offending event.
    pub event_tag: String,
    /// What was wrong with it.
    pub detail: String,
}

impl ProtocolViolation {
    /// Creates a violation record.
    #[inline]
    #[must_use]
    pub fn new(state: HeadState, event_tag: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            state,
            event_tag: event_tag.into(),
            detail: detail.into(),
        }
    }
}

impl fmt::Display for ProtocolViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "protocol violation in {}: {}: {}",
            self.state, self.event_tag, self.detail
        )
    }
}

// ============================================================================
// Applied
// ============================================================================

/// Outcome of applying one event to the machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Applied {
    /// The lifecycle state changed.
    Transition {
        /// State before the event.
        from: HeadState,
        /// State after the event.
        to: HeadState,
    },

    /// A fresh snapshot was applied; state stays `Open`.
    Snapshot {
        /// The applied snapshot number.
        number: u64,
    },

    /// A stale or duplicate snapshot was discarded without effect.
    StaleSnapshot {
        /// Number carried by the discarded event.
        number: u64,
        /// Number of the snapshot kept.
        current: u64,
    },

    /// One party's commit was registered during initialization.
    Committed {
        /// The committing party.
        party: Party,
        /// Commits observed so far, out of the full party set.
        observed: usize,
    },

    /// The fanout deadline passed; the head may be fanned out.
    FanoutReady,

    /// The link dropped; no state change.
    ConnectionLost,

    /// The event was valid but changed nothing.
    NoOp,

    /// The event carries no lifecycle semantics for this machine.
    Ignored,
}

/// Result of one apply step.
pub type ApplyResult = std::result::Result<Applied, ProtocolViolation>;

// ============================================================================
// SyncReport
// ============================================================================

/// What a [`StateMachine::sync`] call changed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SyncReport {
    /// Lifecycle adopted from the node, when it differed.
    pub state_adopted: Option<(HeadState, HeadState)>,
    /// Whether the cached UTxO was replaced wholesale.
    pub utxo_replaced: bool,
}

impl SyncReport {
    /// Returns `true` when the sync changed nothing.
    #[inline]
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.state_adopted.is_none() && !self.utxo_replaced
    }
}

// ============================================================================
// StateMachine
// ============================================================================

/// Lifecycle state machine for one head.
///
/// Single-writer: exactly one event pump applies events; concurrent reads
/// go through the owning head cell.
#[derive(Debug)]
pub struct StateMachine {
    /// Head identity, learned from the first head-scoped event.
    head_id: Option<HeadId>,
    /// Current lifecycle state.
    state: HeadState,
    /// Member set, fixed at initialization.
    parties: Vec<Party>,
    /// Parties whose commits have been observed this initialization.
    committed: Vec<Party>,
    /// Latest confirmed snapshot.
    snapshot: Snapshot,
    /// Snapshot number the current close/contest was posted with.
    closed_snapshot_number: Option<u64>,
    /// When the current initialization started, for the commit timeout.
    initializing_since: Option<Instant>,
    /// Whether the node signalled that fanout may be posted.
    fanout_ready: bool,
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl StateMachine {
    /// Creates a machine in `Idle` with an empty snapshot.
    #[must_use]
    pub fn new() -> Self {
        Self {
            head_id: None,
            state: HeadState::Idle,
            parties: Vec::new(),
            committed: Vec::new(),
            snapshot: Snapshot::default(),
            closed_snapshot_number: None,
            initializing_since: None,
            fanout_ready: false,
        }
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    /// Current lifecycle state.
    #[inline]
    #[must_use]
    pub const fn state(&self) -> HeadState {
        self.state
    }

    /// Head identity, once learned.
    #[inline]
    #[must_use]
    pub fn head_id(&self) -> Option<&HeadId> {
        self.head_id.as_ref()
    }

    /// Member set, empty until initialization is observed.
    #[inline]
    #[must_use]
    pub fn parties(&self) -> &[Party] {
        &self.parties
    }

    /// Parties whose commits have been observed.
    #[inline]
    #[must_use]
    pub fn committed(&self) -> &[Party] {
        &self.committed
    }

    /// Latest confirmed snapshot.
    #[inline]
    #[must_use]
    pub const fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// Whether fanout may be posted.
    #[inline]
    #[must_use]
    pub const fn is_fanout_ready(&self) -> bool {
        self.fanout_ready
    }

    /// Records the identity this machine tracks.
    ///
    /// Used when attaching to a head that is already past initialization,
    /// where no `HeadIsInitializing` will ever name it.
    pub fn adopt_head_id(&mut self, head_id: HeadId) {
        if let Some(known) = &self.head_id
            && *known != head_id
        {
            warn!(%known, adopted = %head_id, "replacing tracked head identity");
        }
        self.head_id = Some(head_id);
    }

    // ------------------------------------------------------------------------
    // Event Application
    // ------------------------------------------------------------------------

    /// Applies one decoded event.
    ///
    /// Lifecycle events either transition the machine or produce a
    /// [`ProtocolViolation`]; events without lifecycle semantics return
    /// [`Applied::Ignored`]. The machine never changes state on error.
    pub fn apply(&mut self, event: &NodeEvent) -> ApplyResult {
        match event {
            NodeEvent::HeadIsInitializing { head_id, parties } => {
                self.apply_initializing(head_id, parties)
            }
            NodeEvent::Committed { party, .. } => self.apply_committed(event, party),
            NodeEvent::HeadIsOpen { head_id, utxo } => self.apply_open(head_id, utxo),
            NodeEvent::SnapshotConfirmed { snapshot, .. } => {
                if self.state != HeadState::Open {
                    return Err(self.violation(event, "snapshot outside an open head"));
                }
                if snapshot.snapshot_number <= self.snapshot.number {
                    // Stale or duplicate delivery is a no-op, not a violation.
                    debug!(
                        number = snapshot.snapshot_number,
                        current = self.snapshot.number,
                        "discarding stale snapshot"
                    );
                    return Ok(Applied::StaleSnapshot {
                        number: snapshot.snapshot_number,
                        current: self.snapshot.number,
                    });
                }
                self.snapshot = Snapshot::new(snapshot.snapshot_number, snapshot.utxo.clone());
                Ok(Applied::Snapshot {
                    number: self.snapshot.number,
                })
            }
            NodeEvent::HeadIsClosed {
                head_id,
                snapshot_number,
                ..
            } => self.apply_closed(head_id, *snapshot_number),
            NodeEvent::HeadIsContested {
                snapshot_number, ..
            } => {
                if self.state != HeadState::Closing {
                    return Err(self.violation(event, "contest outside the contestation window"));
                }
                let from = self.state;
                self.state = HeadState::Contested;
                self.closed_snapshot_number = Some(*snapshot_number);
                Ok(Applied::Transition {
                    from,
                    to: self.state,
                })
            }
            NodeEvent::ReadyToFanout { .. } => {
                if !matches!(self.state, HeadState::Closing | HeadState::Contested) {
                    return Err(self.violation(event, "fanout signalled outside closure"));
                }
                self.fanout_ready = true;
                Ok(Applied::FanoutReady)
            }
            NodeEvent::HeadIsAborted { .. } => {
                if self.state != HeadState::Initializing {
                    return Err(self.violation(event, "abort outside initialization"));
                }
                let from = self.state;
                self.state = HeadState::Idle;
                self.committed.clear();
                self.initializing_since = None;
                Ok(Applied::Transition {
                    from,
                    to: self.state,
                })
            }
            NodeEvent::HeadIsFinalized { utxo, .. } => {
                if !matches!(self.state, HeadState::Closing | HeadState::Contested) {
                    return Err(self.violation(event, "finalize outside closure"));
                }
                let from = self.state;
                self.state = HeadState::Final;
                self.snapshot.utxo = utxo.clone();
                Ok(Applied::Transition {
                    from,
                    to: self.state,
                })
            }
            NodeEvent::ConnectionLost => Ok(Applied::ConnectionLost),
            _ => Ok(Applied::Ignored),
        }
    }

    fn apply_initializing(&mut self, head_id: &HeadId, parties: &[Party]) -> ApplyResult {
        if self.state != HeadState::Idle {
            return Err(ProtocolViolation::new(
                self.state,
                "HeadIsInitializing",
                "initialization while a head is already in progress",
            ));
        }
        if parties.is_empty() {
            return Err(ProtocolViolation::new(
                self.state,
                "HeadIsInitializing",
                "initialization with an empty participant set",
            ));
        }

        // In Idle a fresh initialization always adopts the event's head id;
        // a node starts a new head under a new identity after abort.
        self.head_id = Some(head_id.clone());
        self.parties = parties.to_vec();
        self.committed.clear();
        self.snapshot = Snapshot::default();
        self.closed_snapshot_number = None;
        self.fanout_ready = false;
        self.initializing_since = Some(Instant::now());

        let from = HeadState::Idle;
        self.state = HeadState::Initializing;
        Ok(Applied::Transition {
            from,
            to: self.state,
        })
    }

    fn apply_committed(&mut self, event: &NodeEvent, party: &Party) -> ApplyResult {
        if self.state != HeadState::Initializing {
            return Err(self.violation(event, "commit outside initialization"));
        }

        if self.committed.iter().any(|p| p.vkey == party.vkey) {
            debug!(vkey = %party.vkey, "duplicate commit observed");
            return Ok(Applied::NoOp);
        }

        self.committed.push(party.clone());
        Ok(Applied::Committed {
            party: party.clone(),
            observed: self.committed.len(),
        })
    }

    fn apply_open(&mut self, head_id: &HeadId, utxo: &UtxoSet) -> ApplyResult {
        if self.state != HeadState::Initializing {
            return Err(ProtocolViolation::new(
                self.state,
                "HeadIsOpen",
                "open outside initialization",
            ));
        }
        if !self.parties.is_empty() && self.committed.len() < self.parties.len() {
            return Err(ProtocolViolation::new(
                self.state,
                "HeadIsOpen",
                format!(
                    "open before all commitments observed ({} of {})",
                    self.committed.len(),
                    self.parties.len()
                ),
            ));
        }

        if self.head_id.is_none() {
            self.head_id = Some(head_id.clone());
        }
        self.snapshot = Snapshot::genesis(utxo.clone());
        self.initializing_since = None;

        let from = self.state;
        self.state = HeadState::Open;
        Ok(Applied::Transition {
            from,
            to: self.state,
        })
    }

    fn apply_closed(&mut self, head_id: &HeadId, snapshot_number: u64) -> ApplyResult {
        match self.state {
            HeadState::Open => {
                if self.head_id.is_none() {
                    self.head_id = Some(head_id.clone());
                }
                self.closed_snapshot_number = Some(snapshot_number);
                let from = self.state;
                self.state = HeadState::Closing;
                Ok(Applied::Transition {
                    from,
                    to: self.state,
                })
            }
            // Re-close out of a contest only with a strictly better snapshot.
            HeadState::Contested => {
                let contested = self.closed_snapshot_number.unwrap_or_default();
                if snapshot_number <= contested {
                    return Err(ProtocolViolation::new(
                        self.state,
                        "HeadIsClosed",
                        format!(
                            "re-close with snapshot {snapshot_number} not above contested {contested}"
                        ),
                    ));
                }
                self.closed_snapshot_number = Some(snapshot_number);
                let from = self.state;
                self.state = HeadState::Closing;
                Ok(Applied::Transition {
                    from,
                    to: self.state,
                })
            }
            _ => Err(ProtocolViolation::new(
                self.state,
                "HeadIsClosed",
                "close outside an open head",
            )),
        }
    }

    fn violation(&self, event: &NodeEvent, detail: impl Into<String>) -> ProtocolViolation {
        ProtocolViolation::new(self.state, event.tag(), detail)
    }

    // ------------------------------------------------------------------------
    // Commit Timeout
    // ------------------------------------------------------------------------

    /// Checks the commit timeout.
    ///
    /// Returns `true` when the head was still `Initializing` past the
    /// window and has been moved back to `Idle`. The caller surfaces the
    /// failure signal.
    pub fn tick_commit_timeout(&mut self, window: Duration) -> bool {
        let Some(since) = self.initializing_since else {
            return false;
        };
        if self.state != HeadState::Initializing || since.elapsed() < window {
            return false;
        }

        self.state = HeadState::Idle;
        self.committed.clear();
        self.initializing_since = None;
        true
    }

    // ------------------------------------------------------------------------
    // Node Synchronization
    // ------------------------------------------------------------------------

    /// Adopts the node-reported status and snapshot UTxO.
    ///
    /// Called on the `Greetings` received at attach and after every
    /// reconnect. The node's vocabulary folds the contestation states into
    /// `Closed`, so a local `Contested` refinement is kept rather than
    /// downgraded; everything else is adopted verbatim. The UTxO is
    /// replaced wholesale; snapshot numbers only advance through numbered
    /// `SnapshotConfirmed` events.
    pub fn sync(&mut self, status: NodeHeadStatus, snapshot_utxo: Option<&UtxoSet>) -> SyncReport {
        let target = match status {
            NodeHeadStatus::Idle => HeadState::Idle,
            NodeHeadStatus::Initializing => HeadState::Initializing,
            NodeHeadStatus::Open => HeadState::Open,
            NodeHeadStatus::Closed | NodeHeadStatus::FanoutPossible => {
                if status == NodeHeadStatus::FanoutPossible {
                    self.fanout_ready = true;
                }
                if matches!(self.state, HeadState::Closing | HeadState::Contested) {
                    self.state
                } else {
                    HeadState::Closing
                }
            }
            NodeHeadStatus::Final => HeadState::Final,
        };

        let mut report = SyncReport::default();

        if target != self.state {
            report.state_adopted = Some((self.state, target));
            if target == HeadState::Initializing && self.initializing_since.is_none() {
                self.initializing_since = Some(Instant::now());
            }
            if target != HeadState::Initializing {
                self.initializing_since = None;
            }
            self.state = target;
        }

        if let Some(utxo) = snapshot_utxo
            && self.snapshot.utxo != *utxo
        {
            self.snapshot.utxo = utxo.clone();
            report.utxo_replaced = true;
        }

        report
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    use crate::protocol::model::SnapshotPayload;

    fn init_event(parties: &[&str]) -> NodeEvent {
        NodeEvent::HeadIsInitializing {
            head_id: HeadId::new("84e6af02"),
            parties: parties.iter().map(|v| Party::new(*v)).collect(),
        }
    }

    fn committed_event(vkey: &str) -> NodeEvent {
        NodeEvent::Committed {
            head_id: Some(HeadId::new("84e6af02")),
            party: Party::new(vkey),
            utxo: UtxoSet::new(),
        }
    }

    fn open_event() -> NodeEvent {
        NodeEvent::HeadIsOpen {
            head_id: HeadId::new("84e6af02"),
            utxo: UtxoSet::new(),
        }
    }

    fn snapshot_event(number: u64) -> NodeEvent {
        NodeEvent::SnapshotConfirmed {
            head_id: Some(HeadId::new("84e6af02")),
            snapshot: SnapshotPayload {
                head_id: Some(HeadId::new("84e6af02")),
                snapshot_number: number,
                utxo: UtxoSet::new(),
                confirmed_transactions: None,
                utxo_to_decommit: None,
                version: None,
            },
        }
    }

    fn closed_event(snapshot_number: u64) -> NodeEvent {
        NodeEvent::HeadIsClosed {
            head_id: HeadId::new("84e6af02"),
            snapshot_number,
            contestation_deadline: None,
        }
    }

    fn contested_event(snapshot_number: u64) -> NodeEvent {
        NodeEvent::HeadIsContested {
            head_id: HeadId::new("84e6af02"),
            snapshot_number,
            contestation_deadline: None,
        }
    }

    fn finalized_event() -> NodeEvent {
        NodeEvent::HeadIsFinalized {
            head_id: HeadId::new("84e6af02"),
            utxo: UtxoSet::new(),
        }
    }

    /// Machine driven to `Open` with two parties.
    fn open_machine() -> StateMachine {
        let mut machine = StateMachine::new();
        machine.apply(&init_event(&["p1", "p2"])).expect("init");
        machine.apply(&committed_event("p1")).expect("commit p1");
        machine.apply(&committed_event("p2")).expect("commit p2");
        machine.apply(&open_event()).expect("open");
        machine
    }

    #[test]
    fn test_two_party_open_flow() {
        let mut machine = StateMachine::new();
        assert_eq!(machine.state(), HeadState::Idle);

        let applied = machine.apply(&init_event(&["p1", "p2"])).expect("init");
        assert_eq!(
            applied,
            Applied::Transition {
                from: HeadState::Idle,
                to: HeadState::Initializing
            }
        );
        assert_eq!(machine.head_id().map(HeadId::as_str), Some("84e6af02"));

        machine.apply(&committed_event("p1")).expect("commit p1");
        machine.apply(&committed_event("p2")).expect("commit p2");

        machine.apply(&open_event()).expect("open");
        assert_eq!(machine.state(), HeadState::Open);
        assert_eq!(machine.snapshot().number, 0);
    }

    #[test]
    fn test_init_requires_non_empty_parties() {
        let mut machine = StateMachine::new();
        let violation = machine.apply(&init_event(&[])).unwrap_err();
        assert_eq!(violation.state, HeadState::Idle);
        assert!(violation.detail.contains("empty participant set"));
        assert_eq!(machine.state(), HeadState::Idle);
    }

    #[test]
    fn test_open_before_all_commits_is_a_violation() {
        let mut machine = StateMachine::new();
        machine.apply(&init_event(&["p1", "p2"])).expect("init");
        machine.apply(&committed_event("p1")).expect("commit p1");

        let violation = machine.apply(&open_event()).unwrap_err();
        assert!(violation.detail.contains("1 of 2"));
        assert_eq!(machine.state(), HeadState::Initializing);
    }

    #[test]
    fn test_duplicate_commit_is_noop() {
        let mut machine = StateMachine::new();
        machine.apply(&init_event(&["p1", "p2"])).expect("init");
        machine.apply(&committed_event("p1")).expect("commit");

        let applied = machine.apply(&committed_event("p1")).expect("duplicate");
        assert_eq!(applied, Applied::NoOp);
        assert_eq!(machine.committed().len(), 1);
    }

    #[test]
    fn test_snapshot_applies_when_strictly_greater() {
        let mut machine = open_machine();

        let applied = machine.apply(&snapshot_event(1)).expect("snapshot 1");
        assert_eq!(applied, Applied::Snapshot { number: 1 });
        assert_eq!(machine.snapshot().number, 1);

        machine.apply(&snapshot_event(5)).expect("snapshot 5");
        assert_eq!(machine.snapshot().number, 5);
    }

    #[test]
    fn test_duplicate_snapshot_discarded() {
        let mut machine = open_machine();
        machine.apply(&snapshot_event(1)).expect("snapshot 1");

        let applied = machine.apply(&snapshot_event(1)).expect("duplicate");
        assert_eq!(
            applied,
            Applied::StaleSnapshot {
                number: 1,
                current: 1
            }
        );
        assert_eq!(machine.snapshot().number, 1);
    }

    #[test]
    fn test_lower_snapshot_discarded() {
        let mut machine = open_machine();
        machine.apply(&snapshot_event(5)).expect("snapshot 5");

        let applied = machine.apply(&snapshot_event(3)).expect("stale");
        assert!(matches!(applied, Applied::StaleSnapshot { .. }));
        assert_eq!(machine.snapshot().number, 5);
    }

    #[test]
    fn test_snapshot_outside_open_is_violation() {
        let mut machine = StateMachine::new();
        let violation = machine.apply(&snapshot_event(1)).unwrap_err();
        assert_eq!(violation.state, HeadState::Idle);
        assert_eq!(violation.event_tag, "SnapshotConfirmed");
        assert_eq!(machine.state(), HeadState::Idle);
    }

    #[test]
    fn test_close_contest_reclose_finalize() {
        let mut machine = open_machine();
        machine.apply(&snapshot_event(4)).expect("snapshot");

        machine.apply(&closed_event(3)).expect("close");
        assert_eq!(machine.state(), HeadState::Closing);

        machine.apply(&contested_event(4)).expect("contest");
        assert_eq!(machine.state(), HeadState::Contested);

        // The winning re-close must carry a higher snapshot.
        let violation = machine.apply(&closed_event(4)).unwrap_err();
        assert!(violation.detail.contains("not above contested"));
        assert_eq!(machine.state(), HeadState::Contested);

        machine.apply(&closed_event(5)).expect("re-close");
        assert_eq!(machine.state(), HeadState::Closing);

        machine.apply(&finalized_event()).expect("finalize");
        assert_eq!(machine.state(), HeadState::Final);
        assert!(machine.state().is_terminal());
    }

    #[test]
    fn test_duplicate_close_is_violation() {
        let mut machine = open_machine();
        machine.apply(&closed_event(0)).expect("close");

        let violation = machine.apply(&closed_event(0)).unwrap_err();
        assert_eq!(violation.state, HeadState::Closing);
        assert_eq!(machine.state(), HeadState::Closing);
    }

    #[test]
    fn test_ready_to_fanout_sets_flag() {
        let mut machine = open_machine();
        machine.apply(&closed_event(0)).expect("close");

        let applied = machine
            .apply(&NodeEvent::ReadyToFanout {
                head_id: HeadId::new("84e6af02"),
            })
            .expect("ready");
        assert_eq!(applied, Applied::FanoutReady);
        assert!(machine.is_fanout_ready());
        assert_eq!(machine.state(), HeadState::Closing);
    }

    #[test]
    fn test_abort_returns_to_idle() {
        let mut machine = StateMachine::new();
        machine.apply(&init_event(&["p1"])).expect("init");
        machine.apply(&committed_event("p1")).expect("commit");

        machine
            .apply(&NodeEvent::HeadIsAborted {
                head_id: HeadId::new("84e6af02"),
                utxo: UtxoSet::new(),
            })
            .expect("abort");
        assert_eq!(machine.state(), HeadState::Idle);
        assert!(machine.committed().is_empty());
    }

    #[test]
    fn test_connection_lost_changes_nothing() {
        let mut machine = open_machine();
        machine.apply(&snapshot_event(2)).expect("snapshot");

        let applied = machine.apply(&NodeEvent::ConnectionLost).expect("lost");
        assert_eq!(applied, Applied::ConnectionLost);
        assert_eq!(machine.state(), HeadState::Open);
        assert_eq!(machine.snapshot().number, 2);
    }

    #[test]
    fn test_tracker_events_are_ignored() {
        let mut machine = open_machine();
        let applied = machine
            .apply(&NodeEvent::PeerConnected { peer: "2".into() })
            .expect("peer");
        assert_eq!(applied, Applied::Ignored);
    }

    #[test]
    fn test_invalid_events_leave_state_unchanged() {
        // One representative invalid event per state.
        let cases: Vec<(StateMachine, NodeEvent)> = vec![
            (StateMachine::new(), open_event()),
            (StateMachine::new(), closed_event(0)),
            (StateMachine::new(), committed_event("p1")),
            (open_machine(), open_event()),
            (open_machine(), init_event(&["p1"])),
            (open_machine(), contested_event(1)),
            (open_machine(), finalized_event()),
        ];

        for (mut machine, event) in cases {
            let before = machine.state();
            let result = machine.apply(&event);
            assert!(result.is_err(), "expected violation for {}", event.tag());
            assert_eq!(machine.state(), before);
        }
    }

    #[test]
    fn test_commit_timeout_fires_only_while_initializing() {
        let mut machine = StateMachine::new();
        machine.apply(&init_event(&["p1", "p2"])).expect("init");

        assert!(!machine.tick_commit_timeout(Duration::from_secs(60)));
        assert!(machine.tick_commit_timeout(Duration::ZERO));
        assert_eq!(machine.state(), HeadState::Idle);

        // Fires once; afterwards the machine is Idle and stays put.
        assert!(!machine.tick_commit_timeout(Duration::ZERO));

        let mut open = open_machine();
        assert!(!open.tick_commit_timeout(Duration::ZERO));
        assert_eq!(open.state(), HeadState::Open);
    }

    #[test]
    fn test_sync_adopts_node_status() {
        let mut machine = StateMachine::new();
        let report = machine.sync(NodeHeadStatus::Open, None);

        assert_eq!(
            report.state_adopted,
            Some((HeadState::Idle, HeadState::Open))
        );
        assert_eq!(machine.state(), HeadState::Open);
    }

    #[test]
    fn test_sync_maps_closed_and_preserves_contested() {
        let mut machine = StateMachine::new();
        machine.sync(NodeHeadStatus::Closed, None);
        assert_eq!(machine.state(), HeadState::Closing);

        let mut contested = open_machine();
        contested.apply(&closed_event(0)).expect("close");
        contested.apply(&contested_event(1)).expect("contest");

        let report = contested.sync(NodeHeadStatus::Closed, None);
        assert!(report.state_adopted.is_none());
        assert_eq!(contested.state(), HeadState::Contested);
    }

    #[test]
    fn test_sync_fanout_possible_sets_flag() {
        let mut machine = StateMachine::new();
        machine.sync(NodeHeadStatus::FanoutPossible, None);

        assert_eq!(machine.state(), HeadState::Closing);
        assert!(machine.is_fanout_ready());
    }

    #[test]
    fn test_sync_is_idempotent() {
        let mut machine = open_machine();
        machine.apply(&snapshot_event(2)).expect("snapshot");
        let utxo = machine.snapshot().utxo.clone();

        let first = machine.sync(NodeHeadStatus::Open, Some(&utxo));
        assert!(first.is_noop());

        let second = machine.sync(NodeHeadStatus::Open, Some(&utxo));
        assert!(second.is_noop());
        assert_eq!(machine.state(), HeadState::Open);
        assert_eq!(machine.snapshot().number, 2);
    }

    #[test]
    fn test_adopt_head_id_names_a_joined_head() {
        let mut machine = StateMachine::new();
        machine.sync(NodeHeadStatus::Open, None);
        assert_eq!(machine.head_id(), None);

        machine.adopt_head_id(HeadId::new("84e6af02"));
        assert_eq!(machine.head_id(), Some(&HeadId::new("84e6af02")));

        // A later adoption replaces the tracked identity.
        machine.adopt_head_id(HeadId::new("ffff0000"));
        assert_eq!(machine.head_id(), Some(&HeadId::new("ffff0000")));
    }

    proptest! {
        #[test]
        fn prop_snapshot_number_is_non_decreasing(
            numbers in proptest::collection::vec(0u64..64, 0..48)
        ) {
            let mut machine = open_machine();
            let mut highest = 0u64;

            for number in numbers {
                let _ = machine.apply(&snapshot_event(number));
                prop_assert!(machine.snapshot().number >= highest);
                highest = machine.snapshot().number;
            }
        }

        #[test]
        fn prop_violations_never_move_the_machine(
            number in 0u64..16,
            pick in 0usize..4
        ) {
            // Events that are invalid while Idle.
            let event = match pick {
                0 => open_event(),
                1 => closed_event(number),
                2 => contested_event(number),
                _ => snapshot_event(number),
            };

            let mut machine = StateMachine::new();
            prop_assert!(machine.apply(&event).is_err());
            prop_assert_eq!(machine.state(), HeadState::Idle);
        }
    }
}
