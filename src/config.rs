//! Configuration management for the reorg notification dispatcher.
//!
//! This module handles loading and validating configuration from environment
//! variables using the `dotenvy` crate. All operations return
//! [`DispatchResult`] for comprehensive error handling.
//!
//! ## Environment Variables
//!
//! All variables are optional and carry defaults:
//! - `BIND_PORT`: HTTP port for the API server (default: 8080)
//! - `RATE_LIMIT_RPM`: request quota per minute (default: 120)
//! - `CORS_ORIGINS`: comma-separated allowed origins (default: "*")
//! - `CHAIN_FILE`: path to a JSON chain seed for the in-memory index
//! - `TRACKED_SUBSCRIBERS`: comma-separated subscriber ids preloaded into
//!   the registry (default: empty)
//! - `BROADCAST_CAPACITY`: notification broadcast channel capacity
//!   (default: 256)
//! - `RUST_LOG`: logging level (default: "info")
//!
//! ## Example
//!
//! ```no_run
//! use reorg_dispatch::config::Config;
//! use reorg_dispatch::error::DispatchResult;
//!
//! # fn main() -> DispatchResult<()> {
//! let config = Config::from_env()?;
//! println!("Binding on port {}", config.bind_port());
//! # Ok(())
//! # }
//! ```

use crate::error::{DispatchError, DispatchResult};
use std::env;
use std::path::PathBuf;

/// Main configuration struct for the dispatcher service.
///
/// Contains all runtime configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP port for the API server
    bind_port: u16,

    /// Request quota per minute for the rate limiter
    rate_limit_rpm: u32,

    /// Allowed CORS origins
    cors_origins: Vec<String>,

    /// Optional JSON chain seed file
    chain_file: Option<PathBuf>,

    /// Subscriber ids preloaded into the registry
    tracked_subscribers: Vec<String>,

    /// Capacity of the notification broadcast channel
    broadcast_capacity: usize,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Loads a `.env` file via `dotenvy` if present, reads all variables,
    /// and applies defaults for anything unset.
    ///
    /// # Errors
    ///
    /// Returns an error if a numeric variable fails to parse or a capacity
    /// is set to zero.
    pub fn from_env() -> DispatchResult<Self> {
        // Load .env file if present (ignore error if file doesn't exist)
        dotenvy::dotenv().ok();

        let bind_port = env::var("BIND_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()
            .map_err(|e| {
                DispatchError::config("BIND_PORT must be a valid port number", Some(Box::new(e)))
            })?;

        let rate_limit_rpm = env::var("RATE_LIMIT_RPM")
            .unwrap_or_else(|_| "120".to_string())
            .parse::<u32>()
            .map_err(|e| {
                DispatchError::config("RATE_LIMIT_RPM must be a valid number", Some(Box::new(e)))
            })?;

        if rate_limit_rpm == 0 {
            return Err(DispatchError::config(
                "RATE_LIMIT_RPM must be greater than zero",
                None,
            ));
        }

        let cors_origins = parse_list(&env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string()));

        let chain_file = env::var("CHAIN_FILE").ok().map(PathBuf::from);

        let tracked_subscribers =
            parse_list(&env::var("TRACKED_SUBSCRIBERS").unwrap_or_default());

        let broadcast_capacity = env::var("BROADCAST_CAPACITY")
            .unwrap_or_else(|_| "256".to_string())
            .parse::<usize>()
            .map_err(|e| {
                DispatchError::config(
                    "BROADCAST_CAPACITY must be a valid number",
                    Some(Box::new(e)),
                )
            })?;

        if broadcast_capacity == 0 {
            return Err(DispatchError::config(
                "BROADCAST_CAPACITY must be greater than zero",
                None,
            ));
        }

        Ok(Self {
            bind_port,
            rate_limit_rpm,
            cors_origins,
            chain_file,
            tracked_subscribers,
            broadcast_capacity,
        })
    }

    /// Get the HTTP bind port.
    #[must_use]
    pub const fn bind_port(&self) -> u16 {
        self.bind_port
    }

    /// Get the rate limit in requests per minute.
    #[must_use]
    pub const fn rate_limit_rpm(&self) -> u32 {
        self.rate_limit_rpm
    }

    /// Get the allowed CORS origins.
    #[must_use]
    pub fn cors_origins(&self) -> &[String] {
        &self.cors_origins
    }

    /// Get the optional chain seed file path.
    #[must_use]
    pub const fn chain_file(&self) -> Option<&PathBuf> {
        self.chain_file.as_ref()
    }

    /// Get the preloaded subscriber ids.
    #[must_use]
    pub fn tracked_subscribers(&self) -> &[String] {
        &self.tracked_subscribers
    }

    /// Get the broadcast channel capacity.
    #[must_use]
    pub const fn broadcast_capacity(&self) -> usize {
        self.broadcast_capacity
    }
}

/// Split a comma-separated variable into trimmed, non-empty entries.
fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect()
}
