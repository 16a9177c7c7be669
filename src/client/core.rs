//! Client facade and per-head runtime coordination.
//!
//! The [`Client`] is the entry point for everything the crate does: it
//! dials nodes, keeps one runtime per attached head, and exposes the
//! protocol operations as async methods. Heads are independent of each
//! other; each carries its own session, state machine, transaction
//! tracker and sweeper task.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use hydra_head_client::{Client, HeadState, Participant, TxEnvelope};
//!
//! # async fn example() -> hydra_head_client::Result<()> {
//! let client = Client::builder()
//!     .node_url("http://127.0.0.1:4001")
//!     .build()?;
//!
//! let head = client
//!     .create_head(&[Participant::new("addr_test1vq0")])
//!     .await?;
//! client
//!     .wait_for_state(&head, HeadState::Open, Duration::from_secs(600))
//!     .await?;
//!
//! let local_ref = client
//!     .submit_transaction(&head, TxEnvelope::witnessed("84a300..."))
//!     .await?;
//! let status = client
//!     .await_result(&head, local_ref, Duration::from_secs(60))
//!     .await?;
//! println!("settled: {status}");
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::collections::hash_map::Entry;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{Error, Result};
use crate::external::{ChainQuery, Signer};
use crate::head::shared::HeadShared;
use crate::head::tracker::AwaitRegistration;
use crate::head::{HeadState, HeadView, ProtocolViolation, TxStatus};
use crate::identifiers::{HeadId, LocalRef, Participant};
use crate::protocol::command::ClientCommand;
use crate::protocol::model::{Snapshot, TxEnvelope, UtxoSet};
use crate::transport::{Session, derive_ws_url};

use super::builder::ClientBuilder;
use super::config::ClientConfig;
use super::pump::{event_sink, spawn_sweeper};

// ============================================================================
// HeadRuntime
// ============================================================================

/// Everything one attached head owns: its shared cell, the live session,
/// and the sweeper enforcing its time-based rules.
pub(crate) struct HeadRuntime {
    /// Shared state fed by the session's event sink.
    shared: Arc<HeadShared>,
    /// Current session; replaced wholesale on reconnect.
    session: Mutex<Session>,
    /// Maintenance task handle.
    sweeper: JoinHandle<()>,
}

impl HeadRuntime {
    /// Wraps an established attachment and starts its sweeper.
    fn launch(shared: Arc<HeadShared>, session: Session, config: &ClientConfig) -> Arc<Self> {
        let sweeper = spawn_sweeper(&shared, config);
        Arc::new(Self {
            shared,
            session: Mutex::new(session),
            sweeper,
        })
    }

    /// Clones the current session handle out of the slot.
    fn session(&self) -> Session {
        self.session.lock().clone()
    }

    /// Installs a freshly established session.
    fn replace_session(&self, session: Session) {
        *self.session.lock() = session;
    }

    /// Ends the session and stops the sweeper.
    fn shutdown(&self) {
        self.session.lock().shutdown();
        self.sweeper.abort();
    }
}

// ============================================================================
// ClientInner
// ============================================================================

/// Shared inner state for the client.
pub(crate) struct ClientInner {
    /// Node API endpoint every head attaches through.
    node_url: Url,
    /// Protocol timing and subscription configuration.
    config: ClientConfig,
    /// Signing backend for unwitnessed envelopes.
    signer: Arc<dyn Signer>,
    /// Optional layer-1 lookup backend.
    chain_query: Option<Arc<dyn ChainQuery>>,
    /// Attached heads by identity.
    heads: Mutex<FxHashMap<HeadId, Arc<HeadRuntime>>>,
}

// ============================================================================
// Client
// ============================================================================

/// Hydra head protocol client.
///
/// The client is responsible for:
/// - Attaching to heads (creating new ones or joining existing ones)
/// - Posting lifecycle and transaction commands with state gating
/// - Tracking submissions through to a terminal status
/// - Recovering from connection loss through explicit resync
///
/// Cheap to clone; all clones share the same attached heads.
#[derive(Clone)]
pub struct Client {
    /// Shared inner state.
    pub(crate) inner: Arc<ClientInner>,
}

// ============================================================================
// Client - Display
// ============================================================================

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("node_url", &self.inner.node_url.as_str())
            .field("head_count", &self.head_count())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Client - Accessors
// ============================================================================

impl Client {
    /// Creates a configuration builder for the client.
    #[inline]
    #[must_use]
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Returns the node endpoint this client attaches through.
    #[inline]
    #[must_use]
    pub fn node_url(&self) -> &Url {
        &self.inner.node_url
    }

    /// Returns the active configuration.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Returns the number of attached heads.
    #[inline]
    #[must_use]
    pub fn head_count(&self) -> usize {
        self.inner.heads.lock().len()
    }

    /// Returns the identities of all attached heads.
    #[must_use]
    pub fn attached_heads(&self) -> Vec<HeadId> {
        self.inner.heads.lock().keys().cloned().collect()
    }
}

// ============================================================================
// Client - Head Lifecycle
// ============================================================================

impl Client {
    /// Creates a new head and waits for the node to confirm initialization.
    ///
    /// Dials the node, requires it to be head-less, posts `Init`, and
    /// returns the node-assigned head id once `HeadIsInitializing` is
    /// observed. The wait is bounded by the commit timeout.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] when `participants` is empty
    /// - [`Error::InvalidState`] when the node already serves a head
    /// - [`Error::Timeout`] when initialization is not observed in time
    pub async fn create_head(&self, participants: &[Participant]) -> Result<HeadId> {
        if participants.is_empty() {
            return Err(Error::invalid_argument(
                "at least one participant is required",
            ));
        }
        self.prevalidate_funds(participants).await;

        let (shared, session) = self.attach().await?;

        // Register first; an initialization landing between the waiter
        // and the state check would otherwise be missed.
        let init_rx = shared.register_state_waiter(HeadState::Initializing);

        // Creating is only meaningful against a head-less node; anything
        // else can at best be joined.
        let state = shared.machine().state();
        if state != HeadState::Idle {
            session.shutdown();
            return Err(Error::invalid_state("Init", state.as_str()));
        }

        if let Err(e) = session.send(&ClientCommand::Init).await {
            session.shutdown();
            return Err(e);
        }

        let wait = self.inner.config.commit_timeout;
        let initialized = match timeout(wait, init_rx).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(Error::from(e)),
            Err(_) => Err(Error::timeout("Init", wait.as_millis() as u64)),
        };
        if let Err(e) = initialized {
            session.shutdown();
            return Err(e);
        }

        let Some(head_id) = shared.machine().head_id().cloned() else {
            session.shutdown();
            return Err(Error::transport("head initializing without an id"));
        };

        let runtime = HeadRuntime::launch(shared, session, &self.inner.config);
        self.register(head_id.clone(), runtime)?;

        info!(%head_id, "head created and initializing");
        Ok(head_id)
    }

    /// Attaches to an existing head on the node.
    ///
    /// The greeting names a status but never an id, so identity is
    /// confirmed through a `GetUTxO` round-trip when the head is open;
    /// heads in other phases do not serve queries and are bound as
    /// requested, with the per-event id filter taking over from there.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] when the head is already attached
    /// - [`Error::HeadNotFound`] when the node is idle or serves a
    ///   different head
    pub async fn join_head(&self, head_id: &HeadId) -> Result<()> {
        if self.inner.heads.lock().contains_key(head_id) {
            return Err(Error::invalid_argument(format!(
                "head {head_id} is already attached"
            )));
        }
        if let Some(address) = self.inner.config.address.clone() {
            self.prevalidate_funds(&[Participant::new(address)]).await;
        }

        let (shared, session) = self.attach().await?;

        let state = shared.machine().state();
        let bound = match state {
            HeadState::Idle => Err(Error::head_not_found(head_id.clone())),
            HeadState::Open => self.confirm_identity(&shared, &session, head_id).await,
            _ => {
                debug!(%head_id, %state, "joining without an id round-trip");
                Ok(())
            }
        };
        if let Err(e) = bound {
            session.shutdown();
            return Err(e);
        }
        shared.machine().adopt_head_id(head_id.clone());

        let runtime = HeadRuntime::launch(shared, session, &self.inner.config);
        self.register(head_id.clone(), runtime)?;

        info!(%head_id, %state, "joined head");
        Ok(())
    }

    /// Abandons a head that is still initializing.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidState`] unless the head is `Initializing`.
    pub async fn abort_head(&self, head_id: &HeadId) -> Result<()> {
        self.post(head_id, ClientCommand::Abort, &[HeadState::Initializing])
            .await
    }

    /// Closes the head with the latest known snapshot.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidState`] unless the head is `Open`.
    pub async fn close_head(&self, head_id: &HeadId) -> Result<()> {
        self.post(head_id, ClientCommand::Close, &[HeadState::Open])
            .await
    }

    /// Contests a close by posting a newer snapshot.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidState`] outside the contestation window.
    pub async fn contest_head(&self, head_id: &HeadId) -> Result<()> {
        self.post(
            head_id,
            ClientCommand::Contest,
            &[HeadState::Closing, HeadState::Contested],
        )
        .await
    }

    /// Distributes the final outputs after the contestation deadline.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidState`] until the node has signalled
    /// `ReadyToFanout`.
    pub async fn fanout_head(&self, head_id: &HeadId) -> Result<()> {
        let runtime = self.runtime(head_id)?;
        if !runtime.shared.machine().is_fanout_ready() {
            return Err(Error::invalid_state(
                "Fanout",
                "awaiting the contestation deadline",
            ));
        }
        self.post(
            head_id,
            ClientCommand::Fanout,
            &[HeadState::Closing, HeadState::Contested],
        )
        .await
    }
}

// ============================================================================
// Client - Transactions
// ============================================================================

impl Client {
    /// Submits a transaction into an open head.
    ///
    /// Unwitnessed envelopes are handed to the signer first. The returned
    /// reference correlates the submission with its eventual status; see
    /// [`Client::await_result`].
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] when the envelope fails validation
    /// - [`Error::ResyncRequired`] after a connection loss
    /// - [`Error::InvalidState`] unless the head is `Open`
    /// - [`Error::Signing`] when the signer fails or returns an
    ///   unwitnessed envelope
    pub async fn submit_transaction(
        &self,
        head_id: &HeadId,
        transaction: TxEnvelope,
    ) -> Result<LocalRef> {
        transaction.validate()?;
        let (runtime, session) = self.writable(head_id, "NewTx", &[HeadState::Open])?;
        let transaction = self.ensure_witnessed(transaction).await?;

        // The entry goes in before the send: the node's echo can arrive
        // before the send call returns.
        let local_ref = runtime.shared.tracker().submit(transaction.clone());

        if let Err(e) = session.send(&ClientCommand::new_tx(transaction)).await {
            runtime
                .shared
                .tracker()
                .reject(local_ref, format!("send failed: {e}"));
            return Err(e);
        }

        debug!(%head_id, %local_ref, "transaction submitted");
        Ok(local_ref)
    }

    /// Requests withdrawal of the outputs spent by `transaction` from an
    /// open head back to layer 1.
    ///
    /// Unwitnessed envelopes are handed to the signer first. The node
    /// drives the withdrawal from here: progress arrives as decommit
    /// events, and a refusal is recorded as a protocol violation; see
    /// [`Client::take_violations`].
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] when the envelope fails validation
    /// - [`Error::ResyncRequired`] after a connection loss
    /// - [`Error::InvalidState`] unless the head is `Open`
    /// - [`Error::Signing`] when the signer fails or returns an
    ///   unwitnessed envelope
    pub async fn decommit(&self, head_id: &HeadId, transaction: TxEnvelope) -> Result<()> {
        transaction.validate()?;
        let (_runtime, session) = self.writable(head_id, "Decommit", &[HeadState::Open])?;
        let transaction = self.ensure_witnessed(transaction).await?;

        session.send(&ClientCommand::decommit(transaction)).await?;
        info!(%head_id, "decommit posted");
        Ok(())
    }

    /// Waits for a submission to reach a terminal status.
    ///
    /// Already settled submissions resolve immediately, including
    /// [`TxStatus::Expired`] ones. The record itself is kept until the
    /// retention window prunes it.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] for unknown references
    /// - [`Error::Timeout`] when no terminal status arrives in time
    pub async fn await_result(
        &self,
        head_id: &HeadId,
        local_ref: LocalRef,
        wait: Duration,
    ) -> Result<TxStatus> {
        let runtime = self.runtime(head_id)?;
        let registration = runtime
            .shared
            .tracker()
            .register_waiter(local_ref)
            .ok_or_else(|| Error::invalid_argument(format!("unknown submission {local_ref}")))?;

        match registration {
            AwaitRegistration::Ready(status) => Ok(status),
            AwaitRegistration::Wait(rx) => match timeout(wait, rx).await {
                Ok(Ok(status)) => Ok(status),
                Ok(Err(e)) => Err(e.into()),
                Err(_) => Err(Error::timeout(
                    "transaction result",
                    wait.as_millis() as u64,
                )),
            },
        }
    }
}

// ============================================================================
// Client - Observation
// ============================================================================

impl Client {
    /// Returns the latest confirmed snapshot from the local cache.
    ///
    /// Never touches the network; see [`Client::fetch_snapshot_utxo`] for
    /// the node's authoritative answer.
    ///
    /// # Errors
    ///
    /// [`Error::HeadNotFound`] for unattached ids.
    pub fn get_snapshot(&self, head_id: &HeadId) -> Result<Snapshot> {
        Ok(self.runtime(head_id)?.shared.machine().snapshot().clone())
    }

    /// Assembles a point-in-time view of one head.
    ///
    /// # Errors
    ///
    /// [`Error::HeadNotFound`] for unattached ids.
    pub fn head_view(&self, head_id: &HeadId) -> Result<HeadView> {
        Ok(self.runtime(head_id)?.shared.view())
    }

    /// Drains the recorded protocol violations for one head.
    ///
    /// # Errors
    ///
    /// [`Error::HeadNotFound`] for unattached ids.
    pub fn take_violations(&self, head_id: &HeadId) -> Result<Vec<ProtocolViolation>> {
        Ok(self.runtime(head_id)?.shared.take_violations())
    }

    /// Waits for the head to enter `target`.
    ///
    /// Resolves immediately when the head is already there.
    ///
    /// # Errors
    ///
    /// - [`Error::HeadNotFound`] for unattached ids
    /// - [`Error::Timeout`] when the transition does not happen in time
    pub async fn wait_for_state(
        &self,
        head_id: &HeadId,
        target: HeadState,
        wait: Duration,
    ) -> Result<()> {
        let runtime = self.runtime(head_id)?;

        // Register first; checking before registering could miss a
        // transition landing between the two steps.
        let rx = runtime.shared.register_state_waiter(target);
        if runtime.shared.machine().state() == target {
            return Ok(());
        }

        match timeout(wait, rx).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(e.into()),
            Err(_) => Err(Error::timeout(
                format!("transition to {target}"),
                wait.as_millis() as u64,
            )),
        }
    }

    /// Fetches the node's confirmed UTxO set.
    ///
    /// Round-trips a `GetUTxO` query; replies resolve in request order
    /// since the node does not correlate them.
    ///
    /// # Errors
    ///
    /// - [`Error::ResyncRequired`] after a connection loss
    /// - [`Error::Timeout`] when the node does not answer in time
    pub async fn fetch_snapshot_utxo(&self, head_id: &HeadId, wait: Duration) -> Result<UtxoSet> {
        let runtime = self.runtime(head_id)?;
        if runtime.shared.needs_resync() {
            return Err(Error::resync_required(head_id.clone()));
        }

        let rx = runtime.shared.register_utxo_waiter();
        runtime.session().send(&ClientCommand::GetUtxo).await?;

        match timeout(wait, rx).await {
            Ok(Ok(reply)) => Ok(reply.utxo),
            Ok(Err(e)) => Err(e.into()),
            Err(_) => Err(Error::timeout("GetUTxO", wait.as_millis() as u64)),
        }
    }
}

// ============================================================================
// Client - Link Management
// ============================================================================

impl Client {
    /// Re-establishes the link for one head if it needs it.
    ///
    /// A healthy link makes this a no-op; otherwise it behaves like
    /// [`Client::reconnect`].
    ///
    /// # Errors
    ///
    /// [`Error::HeadNotFound`] for unattached ids, plus anything
    /// reconnecting can raise.
    pub async fn resync(&self, head_id: &HeadId) -> Result<()> {
        let runtime = self.runtime(head_id)?;
        if runtime.shared.is_connected() && !runtime.shared.needs_resync() {
            debug!(%head_id, "link healthy; resync is a no-op");
            return Ok(());
        }
        self.reconnect(head_id).await
    }

    /// Unconditionally redials the node for one head.
    ///
    /// The old session is torn down, a fresh one dialed, and the node's
    /// greeting re-synchronizes local state before writes are allowed
    /// again.
    ///
    /// # Errors
    ///
    /// - [`Error::HeadNotFound`] for unattached ids
    /// - [`Error::Connection`] / [`Error::ConnectionTimeout`] on dial
    ///   failure
    /// - [`Error::Timeout`] when the greeting does not arrive in time
    pub async fn reconnect(&self, head_id: &HeadId) -> Result<()> {
        let runtime = self.runtime(head_id)?;

        // Tearing the old link down first keeps the loss path idempotent.
        runtime.session().shutdown();

        let session = self.establish(&runtime.shared).await?;
        runtime.replace_session(session);

        info!(%head_id, "reconnected and resynchronized");
        Ok(())
    }

    /// Detaches every head and ends their sessions.
    ///
    /// Does not close any head on chain; it only releases this client's
    /// attachments.
    pub fn shutdown(&self) {
        let heads: Vec<(HeadId, Arc<HeadRuntime>)> =
            { self.inner.heads.lock().drain().collect() };

        info!(count = heads.len(), "client shutting down");
        for (head_id, runtime) in heads {
            runtime.shutdown();
            debug!(%head_id, "head detached during shutdown");
        }
    }
}

// ============================================================================
// Client - Internal API
// ============================================================================

impl Client {
    /// Creates a new client instance. No connection is opened here.
    pub(crate) fn new(
        node_url: Url,
        config: ClientConfig,
        signer: Arc<dyn Signer>,
        chain_query: Option<Arc<dyn ChainQuery>>,
    ) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                node_url,
                config,
                signer,
                chain_query,
                heads: Mutex::new(FxHashMap::default()),
            }),
        }
    }

    /// Looks up the runtime of an attached head.
    fn runtime(&self, head_id: &HeadId) -> Result<Arc<HeadRuntime>> {
        self.inner
            .heads
            .lock()
            .get(head_id)
            .cloned()
            .ok_or_else(|| Error::head_not_found(head_id.clone()))
    }

    /// Inserts a freshly attached head, refusing duplicates.
    fn register(&self, head_id: HeadId, runtime: Arc<HeadRuntime>) -> Result<()> {
        match self.inner.heads.lock().entry(head_id.clone()) {
            Entry::Occupied(_) => {
                runtime.shutdown();
                Err(Error::invalid_argument(format!(
                    "head {head_id} is already attached"
                )))
            }
            Entry::Vacant(slot) => {
                slot.insert(runtime);
                Ok(())
            }
        }
    }

    /// Dials the node into a fresh cell and waits for its greeting.
    async fn attach(&self) -> Result<(Arc<HeadShared>, Session)> {
        let shared = Arc::new(HeadShared::new());
        let session = self.establish(&shared).await?;
        Ok((shared, session))
    }

    /// Connects a session feeding `shared` and awaits the node greeting.
    ///
    /// The greeting waiter is registered before dialing, so a greeting
    /// racing the connect cannot be missed.
    async fn establish(&self, shared: &Arc<HeadShared>) -> Result<Session> {
        let config = &self.inner.config;
        let ws_url = derive_ws_url(
            &self.inner.node_url,
            config.history,
            config.address.as_deref(),
        )?;

        let greeting_rx = shared.register_greeting_waiter();
        let session = Session::connect(
            &ws_url,
            config.connect_timeout,
            event_sink(Arc::clone(shared)),
        )
        .await?;
        shared.set_connected(true);

        let wait = config.connect_timeout;
        let greeted = match timeout(wait, greeting_rx).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(Error::from(e)),
            Err(_) => Err(Error::timeout("greeting", wait.as_millis() as u64)),
        };
        if let Err(e) = greeted {
            session.shutdown();
            shared.set_connected(false);
            return Err(e);
        }

        Ok(session)
    }

    /// Confirms which head the node serves through a `GetUTxO` round-trip.
    async fn confirm_identity(
        &self,
        shared: &Arc<HeadShared>,
        session: &Session,
        expected: &HeadId,
    ) -> Result<()> {
        let rx = shared.register_utxo_waiter();
        session.send(&ClientCommand::GetUtxo).await?;

        let wait = self.inner.config.connect_timeout;
        let reply = match timeout(wait, rx).await {
            Ok(Ok(reply)) => reply,
            Ok(Err(e)) => return Err(e.into()),
            Err(_) => return Err(Error::timeout("GetUTxO", wait.as_millis() as u64)),
        };

        match reply.head_id {
            Some(actual) if actual != *expected => {
                warn!(%actual, %expected, "node serves a different head");
                Err(Error::head_not_found(expected.clone()))
            }
            Some(_) => Ok(()),
            None => {
                debug!(%expected, "node reported no head id; binding as requested");
                Ok(())
            }
        }
    }

    /// Hands unwitnessed envelopes to the signer and checks the result.
    async fn ensure_witnessed(&self, transaction: TxEnvelope) -> Result<TxEnvelope> {
        if transaction.is_witnessed() {
            return Ok(transaction);
        }
        let signed = self.inner.signer.sign(transaction).await?;
        if !signed.is_witnessed() {
            return Err(Error::signing("signer returned an unwitnessed envelope"));
        }
        Ok(signed)
    }

    /// Gates a write on resync status and lifecycle state.
    ///
    /// The node re-validates every command anyway; this gate turns the
    /// common refusals into precise local errors before anything is sent.
    fn writable(
        &self,
        head_id: &HeadId,
        operation: &str,
        accepted: &[HeadState],
    ) -> Result<(Arc<HeadRuntime>, Session)> {
        let runtime = self.runtime(head_id)?;
        if runtime.shared.needs_resync() {
            return Err(Error::resync_required(head_id.clone()));
        }
        let state = runtime.shared.machine().state();
        if !accepted.contains(&state) {
            return Err(Error::invalid_state(operation, state.as_str()));
        }
        let session = runtime.session();
        Ok((runtime, session))
    }

    /// Posts one gated lifecycle command.
    async fn post(
        &self,
        head_id: &HeadId,
        command: ClientCommand,
        accepted: &[HeadState],
    ) -> Result<()> {
        let (_runtime, session) = self.writable(head_id, command.tag(), accepted)?;
        session.send(&command).await?;
        info!(%head_id, command = command.tag(), "lifecycle command posted");
        Ok(())
    }

    /// Warn-only funds pre-validation through the chain-query seam.
    ///
    /// Failures never block the operation; the node performs its own
    /// authoritative checks when the commitment is posted.
    async fn prevalidate_funds(&self, participants: &[Participant]) {
        let Some(chain_query) = &self.inner.chain_query else {
            return;
        };

        for participant in participants {
            match chain_query.lookup_address_info(participant.as_str()).await {
                Ok(info) if info.lovelace == 0 => {
                    warn!(address = %participant, "participant has no funds to commit");
                }
                Ok(info) => {
                    debug!(
                        address = %participant,
                        lovelace = info.lovelace,
                        utxo_count = info.utxo_count,
                        "participant funds verified"
                    );
                }
                Err(e) => {
                    warn!(
                        address = %participant,
                        error = %e,
                        "chain query failed; continuing without pre-validation"
                    );
                }
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
