//! Shared utilities for demos.
//!
//! Provides common functionality used across all demos:
//! - Command-line argument parsing
//! - Logging initialization
//! - Node endpoint resolution

#![allow(dead_code)]

// ============================================================================
// Imports
// ============================================================================

use tracing_subscriber::EnvFilter;

// ============================================================================
// Constants
// ============================================================================

/// Default node API endpoint when none is given.
pub const DEFAULT_NODE_URL: &str = "http://127.0.0.1:4001";

// ============================================================================
// Types
// ============================================================================

/// Command-line arguments for demos.
#[derive(Debug, Clone)]
pub struct Args {
    pub debug: bool,
    pub node_url: String,
}

impl Args {
    /// Parse command-line arguments.
    ///
    /// The first positional argument is the node URL; `HYDRA_NODE_URL`
    /// is used when no argument is given.
    pub fn parse() -> Self {
        let args: Vec<String> = std::env::args().collect();
        let node_url = args
            .iter()
            .skip(1)
            .find(|a| !a.starts_with("--"))
            .cloned()
            .or_else(|| std::env::var("HYDRA_NODE_URL").ok())
            .unwrap_or_else(|| DEFAULT_NODE_URL.to_string());

        Self {
            debug: args.iter().any(|a| a == "--debug"),
            node_url,
        }
    }
}

// ============================================================================
// Functions
// ============================================================================

/// Initialize tracing/logging.
pub fn init_logging(debug: bool) {
    let filter = if debug {
        "hydra_head_client=debug"
    } else {
        "hydra_head_client=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();
}

/// Print the recorded protocol violations for one head, if any.
pub fn print_violations(client: &hydra_head_client::Client, head: &hydra_head_client::HeadId) {
    let Ok(violations) = client.take_violations(head) else {
        return;
    };
    if violations.is_empty() {
        return;
    }

    println!("[Violations] {} recorded:", violations.len());
    for violation in violations {
        println!("             {violation}");
    }
}
