//! Local and remote ends in one process.
//!
//! Demonstrates:
//! - Wiring two connections over an in-memory transport
//! - Answering inbound commands with a command handler
//! - Typed commands and validated results
//! - Event subscriptions with a context filter
//!
//! Usage:
//!   cargo run --example 001_loopback
//!   cargo run --example 001_loopback -- --debug

mod common;

// ============================================================================
// Imports
// ============================================================================

use bidi_engine::protocol::{EventContext, browsing_context, session};
use bidi_engine::transport::pair;
use bidi_engine::{
    BrowsingContext, CommandData, Connection, ConnectionOptions, ErrorCode, Event, EventData,
    ProtocolError, Result,
};
use common::Args;
use serde_json::json;

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() {
    let args = Args::parse();
    common::init_logging(args.debug);

    if let Err(e) = run().await {
        eprintln!("\n[ERROR] {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    println!("=== 001: Loopback ===\n");

    // ========================================================================
    // Wire Both Ends
    // ========================================================================

    println!("[1] Connecting local and remote ends...");

    let (transport, peer) = pair();
    let local = Connection::new(transport, ConnectionOptions::new())?;
    let remote = Connection::new(peer.into_transport(), ConnectionOptions::new())?;

    remote
        .set_command_handler(|command| match &command.data {
            CommandData::SessionStatus(_) => Ok(json!({"ready": true, "message": "loopback"})),
            CommandData::GetTree(_) => Ok(json!({
                "contexts": [{
                    "context": "top",
                    "url": "about:blank",
                    "children": [],
                    "parent": null
                }]
            })),
            _ => Err(ProtocolError::new(
                ErrorCode::UnsupportedOperation,
                "loopback remote only answers status and getTree",
            )),
        })
        .await?;

    println!("    ✓ Connected\n");

    // ========================================================================
    // Commands
    // ========================================================================

    println!("[2] Sending commands...");

    let status = local.send(session::Status::default()).await?;
    println!("    session.status: ready={} message={}", status.ready, status.message);

    let tree = local
        .send(browsing_context::GetTreeParameters::default())
        .await?;
    for context in &tree.contexts {
        println!("    context {} at {}", context.context, context.url);
    }

    match local.send(session::End::default()).await {
        Ok(_) => println!("    session.end unexpectedly succeeded"),
        Err(e) => println!("    session.end rejected: {e}"),
    }

    println!("    ✓ Commands done\n");

    // ========================================================================
    // Events
    // ========================================================================

    println!("[3] Subscribing to browsingContext events for \"top\"...");

    let mut events = local
        .subscribe("browsingContext", Some(vec![BrowsingContext::new("top")]))
        .await?;

    for context in ["other", "top"] {
        let data: EventData = serde_json::from_value(json!({
            "method": "browsingContext.load",
            "params": {"context": context, "navigation": null, "timestamp": 1, "url": "about:blank"}
        }))?;
        remote.emit(Event::new(data)).await?;
    }

    if let Some(event) = events.recv().await {
        println!(
            "    received {} for {:?}",
            event.method(),
            event.data.browsing_context()
        );
    }

    println!("    ✓ Events done\n");

    // ========================================================================
    // Shutdown
    // ========================================================================

    let stats = local.stats();
    println!(
        "[4] Local stats: frames in={} out={} pending={}",
        stats.frames_in, stats.frames_out, stats.pending
    );

    local.shutdown();
    remote.shutdown();

    println!("\n=== Done ===");
    Ok(())
}
