//! Head domain: lifecycle machine, transaction tracking, shared cell.
//!
//! One attached head owns one [`StateMachine`] and one
//! [`TransactionTracker`], glued together by the crate-internal
//! [`shared::HeadShared`] cell that the event pump and the facade both
//! hold.
//!
//! # Types
//!
//! | Type | Role |
//! |------|------|
//! | [`HeadState`] | Lifecycle state, `Idle` through `Final` |
//! | [`StateMachine`] | Applies events, reports violations |
//! | [`ProtocolViolation`] | Recorded invalid-event report |
//! | [`TransactionTracker`] | Correlates submissions with node echoes |
//! | [`TxStatus`] | Submission lifecycle status |
//! | [`HeadView`] | Point-in-time read of one head |

pub mod state;
pub mod tracker;

pub(crate) mod shared;

pub use shared::HeadView;
pub use state::{Applied, HeadState, ProtocolViolation, StateMachine, SyncReport};
pub use tracker::{PendingTransaction, SweepStats, TransactionTracker, TxStatus};
