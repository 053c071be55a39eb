//! Error types for the reorg notification dispatcher.
//!
//! This module provides a unified error type [`DispatchError`] covering both
//! tiers of failure in the dispatcher:
//!
//! - **Request-time** errors reject a call before anything is queued:
//!   [`DispatchError::BlockNotFound`], [`DispatchError::DataUnavailable`],
//!   [`DispatchError::TransportUnavailable`], [`DispatchError::InvalidCommand`].
//! - **Invariant violations** ([`DispatchError::InvariantViolation`]) signal a
//!   broken precondition (e.g. two chain references with no common ancestor).
//!   They are surfaced as recoverable errors rather than panics, so the
//!   dispatcher stays restart-safe.
//!
//! Dispatch-time failures inside the worker (a block pruned between
//! validation and send, a failed transport call) are never represented here;
//! they are logged and the affected notification is skipped.
//!
//! All errors implement [`std::error::Error`] and carry an optional source
//! error chain.

use std::fmt;

/// Result type alias using [`DispatchError`].
pub type DispatchResult<T> = Result<T, DispatchError>;

/// Unified error type for the reorg notification dispatcher.
#[derive(Debug)]
pub enum DispatchError {
    /// Configuration or environment variable errors.
    ConfigError {
        /// Human-readable error message
        message: String,
        /// Optional underlying error
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A block reference could not be resolved in the chain index.
    BlockNotFound {
        /// Human-readable error message
        message: String,
    },

    /// A block on the walk lacks its "data available" flag.
    ///
    /// Detected synchronously in the request path; the whole call is
    /// rejected and nothing reaches the queue.
    DataUnavailable {
        /// Human-readable error message
        message: String,
    },

    /// No notification transport is configured.
    TransportUnavailable {
        /// Human-readable error message
        message: String,
    },

    /// An unknown command was passed to a subscriber-modification call.
    InvalidCommand {
        /// Human-readable error message
        message: String,
    },

    /// A precondition of the chain model was violated.
    ///
    /// The chain is assumed to form a single rooted tree; failing to find a
    /// common ancestor (or running past the root mid-walk) breaks that
    /// assumption. Reported as a distinguishable error instead of an
    /// assertion so a store reset cannot take the process down.
    InvariantViolation {
        /// Human-readable error message
        message: String,
    },
}

impl DispatchError {
    /// Create a new configuration error.
    #[must_use]
    pub fn config(
        message: impl Into<String>,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::ConfigError {
            message: message.into(),
            source,
        }
    }

    /// Create a new block-not-found error.
    #[must_use]
    pub fn block_not_found(message: impl Into<String>) -> Self {
        Self::BlockNotFound {
            message: message.into(),
        }
    }

    /// Create a new data-unavailable error.
    #[must_use]
    pub fn data_unavailable(message: impl Into<String>) -> Self {
        Self::DataUnavailable {
            message: message.into(),
        }
    }

    /// Create a new transport-unavailable error.
    #[must_use]
    pub fn transport_unavailable(message: impl Into<String>) -> Self {
        Self::TransportUnavailable {
            message: message.into(),
        }
    }

    /// Create a new invalid-command error.
    #[must_use]
    pub fn invalid_command(message: impl Into<String>) -> Self {
        Self::InvalidCommand {
            message: message.into(),
        }
    }

    /// Create a new invariant-violation error.
    #[must_use]
    pub fn invariant(message: impl Into<String>) -> Self {
        Self::InvariantViolation {
            message: message.into(),
        }
    }
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigError { message, .. } => write!(f, "Configuration error: {message}"),
            Self::BlockNotFound { message } => write!(f, "Block not found: {message}"),
            Self::DataUnavailable { message } => write!(f, "Block data unavailable: {message}"),
            Self::TransportUnavailable { message } => {
                write!(f, "Notification transport unavailable: {message}")
            }
            Self::InvalidCommand { message } => write!(f, "Invalid command: {message}"),
            Self::InvariantViolation { message } => {
                write!(f, "Chain invariant violated: {message}")
            }
        }
    }
}

impl std::error::Error for DispatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ConfigError { source, .. } => source
                .as_ref()
                .map(|e| e.as_ref() as &dyn std::error::Error),
            Self::BlockNotFound { .. }
            | Self::DataUnavailable { .. }
            | Self::TransportUnavailable { .. }
            | Self::InvalidCommand { .. }
            | Self::InvariantViolation { .. } => None,
        }
    }
}
