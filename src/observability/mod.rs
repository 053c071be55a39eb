//! Observability and structured logging infrastructure.
//!
//! This module provides production-grade logging using the tracing
//! framework. The dispatcher's worker loop, chain walker, and API surface
//! all log with structured fields, filterable per component.
//!
//! # Usage
//!
//! Initialize tracing at application startup:
//!
//! ```no_run
//! use reorg_dispatch::observability;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Initialize with defaults (pretty console output, info level)
//!     observability::init_tracing(None, None, false)?;
//!
//!     // Run application...
//!     Ok(())
//! }
//! ```
//!
//! # Environment Configuration
//!
//! ```bash
//! # Set log level for all modules
//! RUST_LOG=debug cargo run
//!
//! # Component-specific levels (e.g. verbose worker, quiet HTTP layer)
//! RUST_LOG=reorg_dispatch::worker=debug,tower_http=warn cargo run
//!
//! # Enable JSON output for production
//! LOG_JSON=true cargo run
//!
//! # Write logs to file with daily rotation
//! LOG_FILE=./logs/dispatcher.log cargo run
//! ```

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{
    fmt,
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
    Layer,
};

/// Initialize the tracing subscriber with configurable output formats.
///
/// # Arguments
///
/// * `log_level` - Optional log level override (e.g., "debug", "info").
///   Falls back to the `RUST_LOG` environment variable.
/// * `log_file` - Optional file path for log output. Enables daily rotation.
/// * `json_output` - If true, outputs JSON suitable for log aggregation;
///   otherwise a pretty-printed human-readable format.
///
/// # Defaults
///
/// When no configuration is provided: `info` level for `reorg_dispatch`,
/// `warn` for dependencies, pretty console output, no file.
///
/// # Errors
///
/// Returns an error if the log file path cannot be created or the
/// subscriber fails to initialize.
pub fn init_tracing(
    log_level: Option<String>,
    log_file: Option<PathBuf>,
    json_output: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    // Build environment filter from RUST_LOG or provided level
    let env_filter = if let Ok(filter) = std::env::var("RUST_LOG") {
        EnvFilter::new(filter)
    } else if let Some(level) = log_level {
        EnvFilter::new(level)
    } else {
        // Default: info for our app, warn for dependencies
        EnvFilter::new("reorg_dispatch=info,warn")
    };

    // Console layer (stdout)
    let console_layer = if json_output {
        fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .boxed()
    } else {
        fmt::layer()
            .pretty()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_thread_ids(true)
            .with_thread_names(true)
            .boxed()
    };

    // File layer (optional)
    let file_layer = if let Some(ref path) = log_file {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        // Rolling file appender, rotates daily
        let file_appender = tracing_appender::rolling::daily(
            path.parent().unwrap_or_else(|| Path::new(".")),
            path.file_name().unwrap_or_else(|| OsStr::new("app.log")),
        );

        let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

        // File output always uses JSON for structured log analysis
        Some(
            fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_current_span(true)
                .with_span_list(true)
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .boxed(),
        )
    } else {
        None
    };

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer);

    if let Some(file) = file_layer {
        subscriber.with(file).init();
    } else {
        subscriber.init();
    }

    info!(
        json_output,
        file_logging = log_file.is_some(),
        "Tracing initialized successfully"
    );

    Ok(())
}

/// Initialize tracing with test-specific configuration.
///
/// Directs output to the test harness; visible with
/// `cargo test -- --nocapture`.
#[cfg(test)]
pub fn init_test_tracing() {
    use tracing_subscriber::fmt::format::FmtSpan;

    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .with_span_events(FmtSpan::CLOSE)
        .pretty()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_tracing_default() {
        // Can only initialize once per process, so don't assert success.
        let result = init_tracing(None, None, false);
        assert!(result.is_ok() || result.is_err());
    }

    #[test]
    fn test_init_tracing_json() {
        let result = init_tracing(Some("info".to_string()), None, true);
        assert!(result.is_ok() || result.is_err());
    }
}
