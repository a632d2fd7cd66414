//! Talking to a real remote end.
//!
//! Demonstrates:
//! - Connecting over WebSocket
//! - Checking readiness and listing browsing contexts
//! - Streaming log entries for a few seconds
//!
//! Usage:
//!   cargo run --example 002_remote_session
//!   cargo run --example 002_remote_session -- ws://127.0.0.1:9222/session
//!   cargo run --example 002_remote_session -- --debug

mod common;

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use bidi_engine::protocol::{browsing_context, session};
use bidi_engine::{Connection, ConnectionOptions, EventData, Result};
use common::Args;
use tokio::time::timeout;

// ============================================================================
// Constants
// ============================================================================

const LISTEN_FOR: Duration = Duration::from_secs(5);

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
    println!("=== 002: Remote Session ===\n");

    // ========================================================================
    // Connect
    // ========================================================================

    println!("[1] Connecting to {}...", args.endpoint);

    let options = ConnectionOptions::new().with_command_timeout(Duration::from_secs(10));
    let connection = Connection::connect(&args.endpoint, options).await?;

    let status = connection.send(session::Status::default()).await?;
    println!("    ready={} message={}", status.ready, status.message);
    println!("    ✓ Connected\n");

    // ========================================================================
    // Context Tree
    // ========================================================================

    println!("[2] Listing browsing contexts...");

    let tree = connection
        .send(browsing_context::GetTreeParameters::default())
        .await?;
    for context in &tree.contexts {
        println!("    {} {}", context.context, context.url);
    }

    println!("    ✓ {} top-level contexts\n", tree.contexts.len());

    // ========================================================================
    // Log Entries
    // ========================================================================

    println!("[3] Listening for log entries ({}s)...", LISTEN_FOR.as_secs());

    connection
        .send(session::Subscribe(session::SubscriptionRequest::new(["log.entryAdded"])))
        .await?;
    let mut entries = connection.subscribe("log.entryAdded", None).await?;

    let listen = async {
        while let Some(event) = entries.recv().await {
            if let EventData::EntryAdded(entry) = &event.data {
                let base = entry.base();
                println!(
                    "    [{:?}] {}: {}",
                    base.level,
                    entry.kind(),
                    base.text.as_deref().unwrap_or("")
                );
            }
        }
    };
    let _ = timeout(LISTEN_FOR, listen).await;

    println!("    ✓ Done listening\n");

    connection.shutdown();

    println!("=== Done ===");
    Ok(())
}
