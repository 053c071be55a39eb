//! Command-line interface for the reorg notification dispatcher.
//!
//! # Commands
//!
//! - `serve`: Run the HTTP API server with the queue worker
//! - `walk`: Compute a detach/attach sequence between two blocks (one-time)
//!
//! # Example
//!
//! ```bash
//! # Run the service
//! reorg-dispatch serve --port 8080 --chain-file ./chain.json
//!
//! # Inspect a reorg between two tips
//! reorg-dispatch walk --chain-file ./chain.json \
//!     --from 0x0303...0303 --to 0x0505...0505
//! ```

use crate::api::server::run_server;
use crate::app_state::AppState;
use crate::chain::{walker, BlockStore, ChainView, InMemoryChain};
use crate::config::Config;
use crate::dispatch::Dispatcher;
use crate::error::{DispatchError, DispatchResult};
use crate::notify::BroadcastTransport;
use crate::registry::SubscriberRegistry;
use alloy::primitives::B256;
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info};

/// Blockchain reorg notification dispatcher
#[derive(Parser, Debug)]
#[command(name = "reorg-dispatch")]
#[command(about = "On-demand reorg notification dispatcher for chain subscribers", long_about = None)]
#[command(version)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP API server
    Serve {
        /// Port to bind (overrides BIND_PORT)
        #[arg(short, long)]
        port: Option<u16>,

        /// Chain index file to load (overrides CHAIN_FILE)
        #[arg(short, long)]
        chain_file: Option<PathBuf>,
    },

    /// Compute the detach/attach walk between two blocks (one-time)
    Walk {
        /// Chain index file to load
        #[arg(short, long)]
        chain_file: PathBuf,

        /// Hash of the block the subscriber currently sits on
        #[arg(short, long)]
        from: String,

        /// Target block hash (default: chain tip)
        #[arg(short, long)]
        to: Option<String>,
    },
}

/// Parse CLI arguments and execute the appropriate command.
///
/// # Errors
///
/// Returns an error if:
/// - Configuration loading fails
/// - The chain index file cannot be read
/// - Command execution fails
pub async fn run() -> DispatchResult<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { port, chain_file } => run_serve_command(port, chain_file).await,
        Commands::Walk {
            chain_file,
            from,
            to,
        } => run_walk_command(&chain_file, &from, to.as_deref()),
    }
}

/// Execute the serve command: build the dispatcher stack and run the server.
async fn run_serve_command(port: Option<u16>, chain_file: Option<PathBuf>) -> DispatchResult<()> {
    let config = Config::from_env()?;

    let port = port.unwrap_or_else(|| config.bind_port());
    let chain_file = chain_file.or_else(|| config.chain_file().cloned());

    let chain = load_chain(chain_file.as_deref())?;
    info!(blocks = chain.len(), "Chain index loaded");

    let registry = SubscriberRegistry::with_subscribers(config.tracked_subscribers().to_vec());
    let transport = BroadcastTransport::new(config.broadcast_capacity());
    let notifications = transport.sender();

    let dispatcher = Arc::new(Dispatcher::new(
        Arc::clone(&chain) as Arc<dyn ChainView>,
        Arc::clone(&chain) as Arc<dyn BlockStore>,
        registry,
        Some(Arc::new(transport)),
    ));

    let state = AppState::new(
        Arc::clone(&dispatcher),
        Arc::clone(&chain) as Arc<dyn ChainView>,
        notifications,
    );

    println!(
        "{} {}",
        "🚀 Reorg dispatcher listening on port".cyan().bold(),
        port.to_string().yellow().bold()
    );

    let server = run_server(
        state,
        port,
        config.rate_limit_rpm(),
        config.cors_origins().to_vec(),
    );
    tokio::pin!(server);

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    tokio::select! {
        result = &mut server => {
            if let Err(e) = result {
                error!(error = %e, "API server failed");
                dispatcher.shutdown().await;
                return Err(DispatchError::config(
                    format!("API server failed: {e}"),
                    None,
                ));
            }
        }

        _ = &mut shutdown => {
            info!("Shutdown signal received, draining work queue");
            println!();
            println!("{}", "🛑 Shutting down gracefully...".yellow().bold());
        }
    }

    dispatcher.shutdown().await;
    println!("{}", "👋 Shutdown complete".green().bold());
    info!("Shutdown complete");

    Ok(())
}

/// Execute the walk command: print detach/attach sequences for a reorg.
fn run_walk_command(chain_file: &Path, from: &str, to: Option<&str>) -> DispatchResult<()> {
    let chain = InMemoryChain::from_file(chain_file)?;

    let from_hash = parse_hash(from)?;
    let to_hash = match to {
        Some(raw) => parse_hash(raw)?,
        None => {
            chain
                .tip()
                .ok_or_else(|| DispatchError::invariant("chain index has no tip"))?
                .hash
        }
    };

    let ancestor = walker::common_ancestor(&chain, &from_hash, &to_hash)?;
    let detach = walker::walk_to_ancestor(&chain, &from_hash, &ancestor.hash)?;
    let attach = walker::attach_sequence(&chain, &to_hash, &ancestor.hash)?;

    println!(
        "{} {} (height {})",
        "Common ancestor:".cyan().bold(),
        ancestor.hash.to_string().yellow(),
        ancestor.height
    );

    println!("{}", format!("Detach ({}):", detach.len()).red().bold());
    for hash in &detach {
        println!("  {} {}", "⬇".red(), hash);
    }

    println!("{}", format!("Attach ({}):", attach.len()).green().bold());
    for hash in &attach {
        println!("  {} {}", "⬆".green(), hash);
    }

    Ok(())
}

/// Load the chain index from a file, or start from a bare genesis.
fn load_chain(path: Option<&Path>) -> DispatchResult<Arc<InMemoryChain>> {
    let chain = match path {
        Some(path) => {
            info!(path = %path.display(), "Loading chain index from file");
            InMemoryChain::from_file(path)?
        }
        None => {
            info!("No chain file configured, starting with genesis only");
            InMemoryChain::with_genesis()
        }
    };

    Ok(Arc::new(chain))
}

/// Parse a 32-byte hex hash from the command line.
fn parse_hash(raw: &str) -> DispatchResult<B256> {
    raw.parse::<B256>()
        .map_err(|e| DispatchError::invalid_command(format!("invalid block hash {raw:?}: {e}")))
}
