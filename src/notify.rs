//! Notification types and the outbound transport boundary.
//!
//! The transport is an external collaborator: it takes a finished
//! [`BlockNotification`] (subscriber set, direction, correlation token,
//! block payload) and performs the actual send. Delivery is not guaranteed;
//! a failed send is non-fatal to the worker and is logged and skipped.
//!
//! [`BroadcastTransport`] is the concrete transport used by the server: it
//! fans notifications out over a tokio broadcast channel which the API's
//! WebSocket stream handlers subscribe to. Lagged or absent receivers are
//! an accepted delivery loss.

use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use tokio::sync::broadcast;

use crate::chain::BlockPayload;
use crate::error::DispatchResult;

/// Which side of a reorg a notification describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// The block is leaving the active chain.
    Detach,
    /// The block is entering the active chain.
    Attach,
}

impl Direction {
    /// The wire tag for this direction.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Detach => "detach",
            Self::Attach => "attach",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One outbound notification: a (block, direction) pair addressed to a set
/// of subscribers, tagged with the request's correlation token.
#[derive(Debug, Clone, Serialize)]
pub struct BlockNotification {
    /// Subscriber ids this notification is addressed to
    pub subscribers: BTreeSet<String>,
    /// Detach or attach
    pub direction: Direction,
    /// Correlation token of the originating request
    pub reqtoken: String,
    /// Full block content
    pub payload: BlockPayload,
}

/// Outbound transport boundary.
///
/// Implementations must be cheap to call from the worker loop; failure is
/// per-call and non-fatal.
pub trait NotificationTransport: Send + Sync {
    /// Send one notification.
    ///
    /// # Errors
    ///
    /// Returns an error if this particular send fails; the worker logs it
    /// and continues with the next block.
    fn send(&self, notification: BlockNotification) -> DispatchResult<()>;
}

/// Transport backed by a tokio broadcast channel.
///
/// The server hands [`BroadcastTransport::sender`] to the API layer so
/// WebSocket stream handlers can subscribe.
pub struct BroadcastTransport {
    tx: broadcast::Sender<BlockNotification>,
}

impl BroadcastTransport {
    /// Create a transport with the given channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Clone the underlying sender, e.g. for stream handlers to subscribe.
    #[must_use]
    pub fn sender(&self) -> broadcast::Sender<BlockNotification> {
        self.tx.clone()
    }

    /// Subscribe to the notification stream.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<BlockNotification> {
        self.tx.subscribe()
    }
}

impl NotificationTransport for BroadcastTransport {
    fn send(&self, notification: BlockNotification) -> DispatchResult<()> {
        // A send with no live receivers is not a failure: delivery is
        // best-effort and nobody was listening.
        let _ = self.tx.send(notification);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{Bytes, B256};

    fn sample_notification() -> BlockNotification {
        BlockNotification {
            subscribers: BTreeSet::from(["tetris".to_string()]),
            direction: Direction::Attach,
            reqtoken: "deadbeef".to_string(),
            payload: BlockPayload {
                hash: B256::repeat_byte(1),
                parent_hash: Some(B256::ZERO),
                height: 1,
                data: Bytes::from_static(b"block"),
            },
        }
    }

    #[test]
    fn test_direction_wire_tags() {
        assert_eq!(Direction::Detach.as_str(), "detach");
        assert_eq!(Direction::Attach.as_str(), "attach");
    }

    #[tokio::test]
    async fn test_broadcast_delivers_to_subscriber() {
        let transport = BroadcastTransport::new(8);
        let mut rx = transport.subscribe();

        assert!(transport.send(sample_notification()).is_ok());

        let received = rx.recv().await;
        assert!(received.is_ok());
        if let Ok(received) = received {
            assert_eq!(received.direction, Direction::Attach);
            assert_eq!(received.reqtoken, "deadbeef");
        }
    }

    #[test]
    fn test_send_without_receivers_is_ok() {
        let transport = BroadcastTransport::new(8);
        assert!(transport.send(sample_notification()).is_ok());
    }
}
