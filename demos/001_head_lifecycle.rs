//! Full head lifecycle against a running hydra-node.
//!
//! Demonstrates:
//! - Building a client against a node endpoint
//! - Creating a head and waiting for every participant to commit
//! - Closing the head and waiting out the contestation window
//! - Fanning the final outputs back out to layer one
//!
//! Usage:
//!   cargo run --example 001_head_lifecycle
//!   cargo run --example 001_head_lifecycle -- http://127.0.0.1:4001
//!   cargo run --example 001_head_lifecycle -- --debug

mod common;

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use common::Args;
use hydra_head_client::{Client, HeadId, HeadState, Participant, Result};

// ============================================================================
// Constants
// ============================================================================

/// Commits come from people running their own nodes; give them time.
const OPEN_TIMEOUT: Duration = Duration::from_secs(600);

/// Contestation periods on devnets are short; mainnet heads take longer.
const FANOUT_TIMEOUT: Duration = Duration::from_secs(600);

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() {
    let args = Args::parse();
    common::init_logging(args.debug);

    if let Err(e) = run(args).await {
        eprintln!("\n[ERROR] {e}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    println!("=== 001: Head Lifecycle ===\n");

    // ========================================================================
    // Create Client
    // ========================================================================

    println!("[1] Creating client...");
    println!("    Node: {}", args.node_url);

    let client = Client::builder().node_url(&args.node_url).build()?;

    println!("    ✓ Client ready\n");

    // ========================================================================
    // Create Head
    // ========================================================================

    println!("[2] Creating head...");

    let head = client
        .create_head(&[Participant::new("addr_test1vq0")])
        .await?;

    println!("    ✓ Head created");
    println!("    Head id: {head}\n");

    // ========================================================================
    // Wait for Open
    // ========================================================================

    println!("[3] Waiting for the head to open...");
    println!("    (every participant must commit; use hydra-tui or the");
    println!("    node's commit endpoint from each peer)");

    client
        .wait_for_state(&head, HeadState::Open, OPEN_TIMEOUT)
        .await?;

    let view = client.head_view(&head)?;
    println!("    ✓ Head is open");
    println!("    Snapshot: {}", view.snapshot.number);
    println!("    Ledger:   {} lovelace\n", view.snapshot.utxo.total_lovelace());

    // ========================================================================
    // Close Head
    // ========================================================================

    println!("[4] Closing head...");

    client.close_head(&head).await?;
    client
        .wait_for_state(&head, HeadState::Closing, Duration::from_secs(60))
        .await?;

    println!("    ✓ Close posted; contestation window running\n");

    // ========================================================================
    // Fanout
    // ========================================================================

    println!("[5] Waiting for the contestation deadline...");

    wait_for_fanout_ready(&client, &head).await?;
    client.fanout_head(&head).await?;
    client
        .wait_for_state(&head, HeadState::Final, Duration::from_secs(120))
        .await?;

    println!("    ✓ Head finalized\n");

    let view = client.head_view(&head)?;
    println!("=== Lifecycle complete ===");
    println!("    Final ledger: {} lovelace", view.snapshot.utxo.total_lovelace());

    common::print_violations(&client, &head);
    client.shutdown();

    Ok(())
}

// ============================================================================
// Helpers
// ============================================================================

/// Polls the head view until the node signals that fanout may be posted.
async fn wait_for_fanout_ready(client: &Client, head: &HeadId) -> Result<()> {
    let deadline = tokio::time::Instant::now() + FANOUT_TIMEOUT;

    loop {
        if client.head_view(head)?.fanout_ready {
            return Ok(());
        }
        if tokio::time::Instant::now() >= deadline {
            return Err(hydra_head_client::Error::timeout(
                "fanout readiness",
                FANOUT_TIMEOUT.as_millis() as u64,
            ));
        }
        tokio::time::sleep(Duration::from_secs(1)).await;
    }
}
