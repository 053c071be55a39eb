//! Shared application state for the API server and streaming.

use std::sync::Arc;
use std::time::SystemTime;
use tokio::sync::broadcast;

use crate::chain::ChainView;
use crate::dispatch::Dispatcher;
use crate::notify::BlockNotification;

/// Shared application state for API handlers.
#[derive(Clone)]
pub struct AppState {
    /// The dispatcher core (worker, registry, request surface).
    pub dispatcher: Arc<Dispatcher>,
    /// Read-only chain view for health reporting.
    pub chain: Arc<dyn ChainView>,
    /// Broadcast side of the notification transport, for stream handlers.
    pub notifications: broadcast::Sender<BlockNotification>,
    /// Application start time for uptime tracking.
    pub start_time: SystemTime,
}

impl AppState {
    /// Create a new `AppState` instance.
    #[must_use]
    pub fn new(
        dispatcher: Arc<Dispatcher>,
        chain: Arc<dyn ChainView>,
        notifications: broadcast::Sender<BlockNotification>,
    ) -> Self {
        Self {
            dispatcher,
            chain,
            notifications,
            start_time: SystemTime::now(),
        }
    }
}
