//! WebSocket transport layer.
//!
//! This module owns the long-lived duplex connection between the client
//! and one Hydra node's event API.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐                              ┌─────────────────┐
//! │  Client (Rust)  │                              │  hydra-node     │
//! │                 │         WebSocket            │                 │
//! │  Session        │◄────────────────────────────►│  Event API      │
//! │  (event loop)   │   ws://node:4001/?history=   │  (JSON frames)  │
//! │                 │                              │                 │
//! └─────────────────┘                              └─────────────────┘
//! ```
//!
//! # Session Lifecycle
//!
//! 1. [`derive_ws_url`] - Map the node's API address to its event endpoint
//! 2. [`Session::connect`] - Dial and start the event loop
//! 3. [`Session::send`] - Serialize and write commands
//! 4. Link drop - One synthetic `ConnectionLost` into the event sink
//! 5. [`Session::shutdown`] - Close the socket cleanly, or dial a fresh
//!    session to reconnect
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `session` | WebSocket session, event loop, URL derivation |

// ============================================================================
// Submodules
// ============================================================================

/// WebSocket session and event loop.
pub mod session;

// ============================================================================
// Re-exports
// ============================================================================

pub use session::{EventSink, Session, derive_ws_url};
