//! Shared per-head cell.
//!
//! One [`HeadShared`] sits between the event pump and the facade: the pump
//! feeds decoded events into [`HeadShared::apply_event`], callers read
//! views and register waiters. All locks are short and leaf-level and are
//! never held across an await point; [`HeadShared::view`] is the only
//! method that takes two, machine then peers.
//!
//! Waiter resolution uses oneshot channels in both directions: state
//! waiters fire on the transition into their target state, UTxO waiters
//! resolve `GetUTxO` round-trips in request order since the node does not
//! correlate replies.

// ============================================================================
// Imports
// ============================================================================

use std::collections::{BTreeSet, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use parking_lot::{Mutex, MutexGuard};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::head::state::{Applied, HeadState, ProtocolViolation, StateMachine};
use crate::head::tracker::{SweepStats, TransactionTracker};
use crate::identifiers::HeadId;
use crate::protocol::event::NodeEvent;
use crate::protocol::model::{Snapshot, UtxoSet};

// ============================================================================
// Constants
// ============================================================================

/// Upper bound on retained violation records; oldest are dropped first.
const VIOLATION_LOG_CAP: usize = 256;

// ============================================================================
// HeadView
// ============================================================================

/// Point-in-time read of one head.
///
/// A plain value assembled under the cell's locks; holding it does not
/// block the event path.
#[derive(Debug, Clone, PartialEq)]
pub struct HeadView {
    /// Head identity, once learned from the node.
    pub head_id: Option<HeadId>,
    /// Lifecycle state.
    pub state: HeadState,
    /// Latest confirmed snapshot.
    pub snapshot: Snapshot,
    /// Peer nodes currently connected to ours.
    pub peers: Vec<String>,
    /// Whether the transport link is up.
    pub connected: bool,
    /// Whether writes are refused until a resync.
    pub needs_resync: bool,
    /// Whether the node signalled that fanout may be posted.
    pub fanout_ready: bool,
    /// Submissions not yet in a terminal status.
    pub in_flight: usize,
}

// ============================================================================
// UtxoReply
// ============================================================================

/// One resolved `GetUTxO` round-trip.
///
/// Carries the head id when the node reports one, which lets attach-time
/// callers confirm which head answered.
#[derive(Debug, Clone, PartialEq)]
pub struct UtxoReply {
    /// Head the set belongs to, when reported.
    pub head_id: Option<HeadId>,
    /// Confirmed UTxO set.
    pub utxo: UtxoSet,
}

// ============================================================================
// HeadShared
// ============================================================================

struct StateWaiter {
    target: HeadState,
    notify: oneshot::Sender<HeadState>,
}

/// Shared state of one attached head.
pub struct HeadShared {
    machine: Mutex<StateMachine>,
    tracker: Mutex<TransactionTracker>,
    state_waiters: Mutex<Vec<StateWaiter>>,
    greeting_waiters: Mutex<Vec<oneshot::Sender<()>>>,
    utxo_waiters: Mutex<VecDeque<oneshot::Sender<UtxoReply>>>,
    violations: Mutex<VecDeque<ProtocolViolation>>,
    peers: Mutex<BTreeSet<String>>,
    connected: AtomicBool,
    needs_resync: AtomicBool,
    greeted: AtomicBool,
}

impl Default for HeadShared {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadShared {
    /// Creates a detached cell in `Idle`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            machine: Mutex::new(StateMachine::new()),
            tracker: Mutex::new(TransactionTracker::new()),
            state_waiters: Mutex::new(Vec::new()),
            greeting_waiters: Mutex::new(Vec::new()),
            utxo_waiters: Mutex::new(VecDeque::new()),
            violations: Mutex::new(VecDeque::new()),
            peers: Mutex::new(BTreeSet::new()),
            connected: AtomicBool::new(false),
            needs_resync: AtomicBool::new(false),
            greeted: AtomicBool::new(false),
        }
    }

    // ------------------------------------------------------------------------
    // Direct Access
    // ------------------------------------------------------------------------

    /// Locks the state machine.
    pub fn machine(&self) -> MutexGuard<'_, StateMachine> {
        self.machine.lock()
    }

    /// Locks the transaction tracker.
    pub fn tracker(&self) -> MutexGuard<'_, TransactionTracker> {
        self.tracker.lock()
    }

    // ------------------------------------------------------------------------
    // Flags
    // ------------------------------------------------------------------------

    /// Marks the transport link up or down.
    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    /// Returns `true` while the transport link is up.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Returns `true` while writes are refused pending a resync.
    #[must_use]
    pub fn needs_resync(&self) -> bool {
        self.needs_resync.load(Ordering::SeqCst)
    }

    /// Returns `true` once the node greeting has been applied.
    #[must_use]
    pub fn is_greeted(&self) -> bool {
        self.greeted.load(Ordering::SeqCst)
    }

    // ------------------------------------------------------------------------
    // Waiters
    // ------------------------------------------------------------------------

    /// Registers a waiter for the transition into `target`.
    ///
    /// Callers register first and only then check the current state, so a
    /// transition between the two steps is never missed.
    pub fn register_state_waiter(&self, target: HeadState) -> oneshot::Receiver<HeadState> {
        let (tx, rx) = oneshot::channel();
        self.state_waiters.lock().push(StateWaiter {
            target,
            notify: tx,
        });
        rx
    }

    /// Registers a waiter for the next node greeting.
    pub fn register_greeting_waiter(&self) -> oneshot::Receiver<()> {
        let (tx, rx) = oneshot::channel();
        self.greeting_waiters.lock().push(tx);
        rx
    }

    /// Registers a waiter for the next `GetUTxOResponse`.
    ///
    /// The node answers `GetUTxO` in order without correlation ids, so
    /// waiters queue and resolve first-in first-out.
    pub fn register_utxo_waiter(&self) -> oneshot::Receiver<UtxoReply> {
        let (tx, rx) = oneshot::channel();
        self.utxo_waiters.lock().push_back(tx);
        rx
    }

    /// Wakes every waiter registered for `state`.
    fn notify_state(&self, state: HeadState) {
        let mut waiters = self.state_waiters.lock();
        let drained = std::mem::take(&mut *waiters);
        for waiter in drained {
            if waiter.target == state {
                let _ = waiter.notify.send(state);
            } else if !waiter.notify.is_closed() {
                waiters.push(waiter);
            }
        }
    }

    fn notify_greeting(&self) {
        self.greeted.store(true, Ordering::SeqCst);
        for waiter in self.greeting_waiters.lock().drain(..) {
            let _ = waiter.send(());
        }
    }

    fn fulfill_utxo(&self, reply: UtxoReply) -> bool {
        // A waiter whose caller gave up is skipped, not fed; otherwise the
        // reply meant for the next caller in line would be lost.
        let mut waiters = self.utxo_waiters.lock();
        while let Some(waiter) = waiters.pop_front() {
            if waiter.send(reply.clone()).is_ok() {
                return true;
            }
        }
        false
    }

    // ------------------------------------------------------------------------
    // Violations
    // ------------------------------------------------------------------------

    /// Appends to the bounded violation log.
    pub fn record_violation(&self, violation: ProtocolViolation) {
        warn!(%violation, "protocol violation recorded");
        let mut log = self.violations.lock();
        if log.len() >= VIOLATION_LOG_CAP {
            log.pop_front();
        }
        log.push_back(violation);
    }

    /// Drains the violation log.
    #[must_use]
    pub fn take_violations(&self) -> Vec<ProtocolViolation> {
        self.violations.lock().drain(..).collect()
    }

    // ------------------------------------------------------------------------
    // Peers
    // ------------------------------------------------------------------------

    fn peer_connected(&self, peer: String) {
        debug!(%peer, "peer connected");
        self.peers.lock().insert(peer);
    }

    fn peer_disconnected(&self, peer: &str) {
        debug!(%peer, "peer disconnected");
        self.peers.lock().remove(peer);
    }

    // ------------------------------------------------------------------------
    // Event Application
    // ------------------------------------------------------------------------

    /// Applies one decoded event to the cell.
    ///
    /// This is the single consumer path: the pump calls it in arrival
    /// order, and every event is routed to the machine, the tracker, the
    /// peer set or a waiter exactly once.
    pub fn apply_event(&self, event: NodeEvent) {
        match event {
            NodeEvent::Greetings {
                head_status,
                snapshot_utxo,
                hydra_node_version,
                me,
            } => {
                info!(
                    status = %head_status,
                    version = hydra_node_version.as_deref().unwrap_or("unknown"),
                    "node greeting"
                );
                if let Some(me) = &me {
                    debug!(vkey = %me.vkey, "greeting party");
                }

                let report = self
                    .machine
                    .lock()
                    .sync(head_status, snapshot_utxo.as_ref());
                if let Some((from, to)) = report.state_adopted {
                    info!(%from, %to, "adopted node-reported state");
                    self.notify_state(to);
                }
                if report.utxo_replaced {
                    debug!("snapshot utxo fast-forwarded from greeting");
                }

                self.needs_resync.store(false, Ordering::SeqCst);
                self.notify_greeting();
            }

            NodeEvent::ConnectionLost => {
                // Idempotent: a send failure and the closing stream may
                // both report the same loss.
                if !self.connected.swap(false, Ordering::SeqCst) {
                    return;
                }
                self.needs_resync.store(true, Ordering::SeqCst);
                let _ = self.machine.lock().apply(&NodeEvent::ConnectionLost);
                // UTxO correlation is per connection; dropping the queued
                // senders wakes their callers with a closed channel.
                self.utxo_waiters.lock().clear();
                warn!("connection lost; writes refused until resync");
            }

            NodeEvent::TxValid { transaction, .. } => {
                if let Some(local_ref) = self.tracker.lock().on_tx_valid(&transaction) {
                    debug!(%local_ref, tx = %transaction, "transaction acknowledged");
                }
            }

            NodeEvent::TxInvalid {
                transaction,
                validation_error,
                ..
            } => {
                if let Some(local_ref) = self
                    .tracker
                    .lock()
                    .on_tx_invalid(&transaction, &validation_error.reason)
                {
                    info!(%local_ref, reason = %validation_error.reason, "transaction rejected");
                }
            }

            NodeEvent::GetUtxoResponse { head_id, utxo } => {
                if !self.fulfill_utxo(UtxoReply { head_id, utxo }) {
                    debug!("unsolicited GetUTxOResponse dropped");
                }
            }

            // Decommit progress is observational: the node drives the
            // withdrawal, the client only learns how far it got.
            NodeEvent::DecommitRequested {
                decommit_tx,
                utxo_to_decommit,
                ..
            } => {
                info!(
                    tx = %decommit_tx,
                    outputs = utxo_to_decommit.len(),
                    "decommit requested"
                );
            }

            NodeEvent::DecommitApproved {
                decommit_tx_id,
                utxo_to_decommit,
                ..
            } => {
                debug!(
                    tx_id = %decommit_tx_id,
                    outputs = utxo_to_decommit.len(),
                    "decommit approved"
                );
            }

            NodeEvent::DecommitFinalized { decommit_tx_id, .. } => {
                info!(tx_id = %decommit_tx_id, "decommit settled on layer 1");
            }

            NodeEvent::DecommitInvalid {
                decommit_tx,
                decommit_invalid_reason,
                ..
            } => {
                let state = self.machine.lock().state();
                self.record_violation(ProtocolViolation::new(
                    state,
                    "DecommitInvalid",
                    format!("node refused decommit of {decommit_tx}: {decommit_invalid_reason}"),
                ));
            }

            NodeEvent::PeerConnected { peer } => self.peer_connected(peer),
            NodeEvent::PeerDisconnected { peer } => self.peer_disconnected(&peer),

            NodeEvent::CommandFailed { client_input } => {
                let refused = client_input
                    .get("tag")
                    .and_then(serde_json::Value::as_str)
                    .unwrap_or("<unknown>")
                    .to_string();
                if let Some(local_ref) = self.tracker.lock().on_command_failed(&client_input) {
                    info!(%local_ref, "NewTx refused by node");
                } else {
                    let state = self.machine.lock().state();
                    self.record_violation(ProtocolViolation::new(
                        state,
                        "CommandFailed",
                        format!("node refused a {refused} command"),
                    ));
                }
            }

            NodeEvent::InvalidInput { reason, input } => {
                debug!(%input, "rejected input payload");
                let state = self.machine.lock().state();
                self.record_violation(ProtocolViolation::new(
                    state,
                    "InvalidInput",
                    format!("node could not parse an input: {reason}"),
                ));
            }

            NodeEvent::PostTxOnChainFailed { post_tx_error, .. } => {
                let state = self.machine.lock().state();
                self.record_violation(ProtocolViolation::new(
                    state,
                    "PostTxOnChainFailed",
                    format!("chain transaction failed: {post_tx_error}"),
                ));
            }

            NodeEvent::Unknown => {}

            // Lifecycle events.
            ref lifecycle => {
                let applied = {
                    let mut machine = self.machine.lock();
                    if let (Some(event_head), Some(known)) =
                        (lifecycle.head_id(), machine.head_id())
                        && event_head != known
                        && machine.state() != HeadState::Idle
                    {
                        warn!(
                            tag = lifecycle.tag(),
                            head_id = %event_head,
                            "event for another head dropped"
                        );
                        return;
                    }
                    machine.apply(lifecycle)
                };

                match applied {
                    Ok(Applied::Transition { from, to }) => {
                        info!(%from, %to, tag = lifecycle.tag(), "head transition");
                        self.notify_state(to);
                    }
                    Ok(Applied::Snapshot { number }) => {
                        debug!(number, "snapshot confirmed");
                        if let NodeEvent::SnapshotConfirmed { snapshot, .. } = lifecycle {
                            let ids = snapshot.confirmed_tx_ids();
                            let settled =
                                self.tracker.lock().on_snapshot_confirmed(ids.as_deref());
                            for local_ref in settled {
                                info!(%local_ref, number, "transaction confirmed");
                            }
                        }
                    }
                    Ok(Applied::Committed { party, observed }) => {
                        debug!(vkey = %party.vkey, observed, "commit registered");
                    }
                    Ok(Applied::FanoutReady) => {
                        info!("head ready to fan out");
                    }
                    Ok(
                        Applied::StaleSnapshot { .. }
                        | Applied::NoOp
                        | Applied::ConnectionLost
                        | Applied::Ignored,
                    ) => {}
                    Err(violation) => self.record_violation(violation),
                }
            }
        }
    }

    // ------------------------------------------------------------------------
    // Maintenance
    // ------------------------------------------------------------------------

    /// Enforces the commit timeout; returns `true` when it fired.
    pub fn tick_commit_timeout(&self, window: Duration) -> bool {
        let fired = self.machine.lock().tick_commit_timeout(window);
        if fired {
            warn!(
                window_ms = window.as_millis() as u64,
                "initialization timed out; head back to Idle"
            );
            self.record_violation(ProtocolViolation::new(
                HeadState::Initializing,
                "InitTimedOut",
                format!("no head opening within {}ms", window.as_millis()),
            ));
            self.notify_state(HeadState::Idle);
        }
        fired
    }

    /// Runs one tracker maintenance sweep.
    pub fn sweep_tracker(
        &self,
        ack_timeout: Duration,
        confirm_timeout: Duration,
        retention: Duration,
    ) -> SweepStats {
        self.tracker
            .lock()
            .sweep(Instant::now(), ack_timeout, confirm_timeout, retention)
    }

    // ------------------------------------------------------------------------
    // Views
    // ------------------------------------------------------------------------

    /// Assembles a point-in-time view of the head.
    #[must_use]
    pub fn view(&self) -> HeadView {
        let machine = self.machine.lock();
        let in_flight = self.tracker.lock().in_flight();
        HeadView {
            head_id: machine.head_id().cloned(),
            state: machine.state(),
            snapshot: machine.snapshot().clone(),
            peers: self.peers.lock().iter().cloned().collect(),
            connected: self.is_connected(),
            needs_resync: self.needs_resync(),
            fanout_ready: machine.is_fanout_ready(),
            in_flight,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
