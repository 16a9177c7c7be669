//! Transaction submission into an open head.
//!
//! Demonstrates:
//! - Joining a head that is already open
//! - Submitting a pre-signed transaction and awaiting its status
//! - Fetching the node's confirmed UTxO set
//!
//! Usage:
//!   HEAD_ID=84e6af02... TX_CBOR=84a300... cargo run --example 002_transactions
//!   HEAD_ID=... TX_CBOR=... cargo run --example 002_transactions -- http://127.0.0.1:4001

mod common;

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use common::Args;
use hydra_head_client::{Client, HeadId, Result, TxEnvelope, TxStatus};

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
    println!("=== 002: Transactions ===\n");

    let head = HeadId::new(require_env("HEAD_ID")?);
    let cbor_hex = require_env("TX_CBOR")?;

    // ========================================================================
    // Join Head
    // ========================================================================

    println!("[1] Joining head {head}...");
    println!("    Node: {}", args.node_url);

    let client = Client::builder().node_url(&args.node_url).build()?;
    client.join_head(&head).await?;

    let view = client.head_view(&head)?;
    println!("    ✓ Joined");
    println!("    State:    {}", view.state);
    println!("    Snapshot: {}\n", view.snapshot.number);

    // ========================================================================
    // Submit Transaction
    // ========================================================================

    println!("[2] Submitting transaction...");

    let local_ref = client
        .submit_transaction(&head, TxEnvelope::witnessed(cbor_hex))
        .await?;

    println!("    ✓ Submitted");
    println!("    Local ref: {local_ref}\n");

    // ========================================================================
    // Await Result
    // ========================================================================

    println!("[3] Waiting for a terminal status...");

    let status = client
        .await_result(&head, local_ref, Duration::from_secs(60))
        .await?;

    match &status {
        TxStatus::Confirmed => println!("    ✓ Confirmed in a snapshot\n"),
        TxStatus::Rejected { reason } => println!("    ✗ Rejected: {reason}\n"),
        other => println!("    ? Settled as {other}\n"),
    }

    // ========================================================================
    // Fetch UTxO
    // ========================================================================

    println!("[4] Fetching the confirmed UTxO set...");

    let utxo = client
        .fetch_snapshot_utxo(&head, Duration::from_secs(10))
        .await?;

    println!("    ✓ {} outputs, {} lovelace total", utxo.len(), utxo.total_lovelace());
    for (reference, output) in utxo.iter().take(5) {
        println!("      {reference}: {} lovelace @ {}", output.value.lovelace(), output.address);
    }

    common::print_violations(&client, &head);
    client.shutdown();

    println!("\n=== Done ===");
    Ok(())
}

// ============================================================================
// Helpers
// ============================================================================

fn require_env(name: &str) -> Result<String> {
    std::env::var(name).map_err(|_| {
        hydra_head_client::Error::config(format!("{name} environment variable is required"))
    })
}
