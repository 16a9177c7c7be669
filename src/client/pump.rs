//! Background plumbing between a transport session and head bookkeeping.
//!
//! Two pieces live here: the event sink handed to [`Session::connect`],
//! which feeds every decoded frame into the shared head state, and the
//! per-head sweeper task that enforces the time-based rules no node event
//! triggers (commit timeout, acknowledgement expiry, retention pruning).
//!
//! The sweeper holds only a [`Weak`] reference. Dropping the last strong
//! handle to a head stops its sweeper on the next tick.
//!
//! [`Session::connect`]: crate::transport::Session::connect

// ============================================================================
// Imports
// ============================================================================

use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::debug;

use crate::head::shared::HeadShared;
use crate::transport::EventSink;

use super::config::ClientConfig;

// ============================================================================
// Constants
// ============================================================================

/// Cadence of the maintenance sweep.
const SWEEP_INTERVAL: Duration = Duration::from_secs(1);

// ============================================================================
// Event Sink
// ============================================================================

/// Builds the sink that routes decoded node events into shared head state.
///
/// The sink runs on the session's read loop and only takes short-lived
/// locks, so frame order is preserved end to end.
pub(crate) fn event_sink(shared: Arc<HeadShared>) -> EventSink {
    Box::new(move |event| shared.apply_event(event))
}

// ============================================================================
// Sweeper
// ============================================================================

/// Spawns the maintenance sweeper for one head.
///
/// Every tick enforces the commit timeout and runs a tracker sweep with
/// the configured windows. The task exits once the head itself is gone.
pub(crate) fn spawn_sweeper(shared: &Arc<HeadShared>, config: &ClientConfig) -> JoinHandle<()> {
    let weak: Weak<HeadShared> = Arc::downgrade(shared);
    let commit_timeout = config.commit_timeout;
    let ack_timeout = config.ack_timeout;
    let confirm_timeout = config.confirm_timeout;
    let retention = config.retention_window;

    tokio::spawn(async move {
        let mut ticker = interval(SWEEP_INTERVAL);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            let Some(shared) = weak.upgrade() else {
                break;
            };
            shared.tick_commit_timeout(commit_timeout);
            shared.sweep_tracker(ack_timeout, confirm_timeout, retention);
        }

        debug!("sweeper stopped; head released");
    })
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use crate::head::HeadState;
    use crate::protocol::event::decode_frame;

    #[test]
    fn test_event_sink_feeds_shared_state() {
        let shared = Arc::new(HeadShared::new());
        let sink = event_sink(Arc::clone(&shared));

        let greeting = decode_frame(
            r#"{"tag":"Greetings","me":{"vkey":"me"},"headStatus":"Open"}"#,
        )
        .expect("decode");
        sink(greeting);

        assert!(shared.is_greeted());
        assert_eq!(shared.view().state, HeadState::Open);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_exits_once_head_is_dropped() {
        let shared = Arc::new(HeadShared::new());
        let handle = spawn_sweeper(&shared, &ClientConfig::default());

        drop(shared);

        // Paused time auto-advances, so the next tick runs immediately and
        // the failed upgrade ends the task.
        handle.await.expect("sweeper task");
    }
}
