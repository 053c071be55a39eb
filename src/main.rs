//! CLI entry point for the reorg notification dispatcher.
//!
//! # Architecture Flow
//!
//! This binary delegates to the CLI module, which orchestrates all layers:
//!
//! ```text
//! main.rs (Runtime Initialization)
//!     ↓
//! CLI Layer (src/cli.rs)
//!     ↓
//! 1. Config Layer (src/config.rs)       → Load environment variables
//! 2. Chain Layer (src/chain/)           → Block index + reorg walker
//! 3. Dispatch Layer (src/dispatch.rs)   → Schedule updates, manage workers
//! 4. Worker Layer (src/worker.rs)       → Drain the notification queue
//! 5. API Layer (src/api/)               → HTTP + WebSocket surface
//! ```
//!
//! # Layer Separation
//!
//! - **main.rs**: Async runtime + tracing initialization only
//! - **CLI module**: User interface + layer orchestration
//! - **Core modules**: Independent, reusable, no upward dependencies
//!
//! All errors bubble up with context via `DispatchResult<T>`.

use reorg_dispatch::{cli, observability};
use tracing::error;

/// Entry point for the reorg notification dispatcher.
///
/// Initializes:
/// - Tokio async runtime (via `#[tokio::main]`)
/// - Structured logging with tracing
/// - Environment-based filtering (RUST_LOG, LOG_JSON, LOG_FILE)
///
/// Then delegates to the CLI module for all business logic.
#[tokio::main]
async fn main() {
    // Initialize structured logging FIRST (before any other operations)
    // Configuration can be controlled via environment variables:
    // - RUST_LOG: Set log level (e.g., "debug", "info", "trace")
    // - LOG_JSON: Enable JSON output for production ("true" or "false")
    // - LOG_FILE: Write logs to file with daily rotation
    //
    // Examples:
    //   RUST_LOG=debug cargo run -- serve
    //   RUST_LOG=reorg_dispatch=trace cargo run -- serve
    //   LOG_JSON=true LOG_FILE=./logs/dispatcher.log cargo run -- serve
    let log_level = std::env::var("RUST_LOG").ok();
    let log_file = std::env::var("LOG_FILE").ok().map(std::path::PathBuf::from);
    let json_output = std::env::var("LOG_JSON")
        .unwrap_or_else(|_| "false".to_string())
        .parse::<bool>()
        .unwrap_or(false);

    if let Err(e) = observability::init_tracing(log_level, log_file, json_output) {
        eprintln!("Failed to initialize tracing: {e}");
        std::process::exit(1);
    }

    if let Err(e) = cli::run().await {
        error!(error = %e, "Application error");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
