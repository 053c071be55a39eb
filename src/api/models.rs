//! API request and response models.
//!
//! Block hashes cross the wire as hex strings and are parsed at the
//! handler boundary; everything past the handlers works with `B256`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::chain::BlockPayload;
use crate::notify::Direction;

/// Request body for scheduling reorg update notifications.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ScheduleRequest {
    /// Subscriber id the notifications are addressed to
    pub subscriber: String,
    /// Starting block hash (hex)
    pub from_block: String,
    /// Target block hash (hex); defaults to the current chain tip
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_block: Option<String>,
}

/// Response for a successfully scheduled request.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ScheduleResponse {
    /// Target block hash notifications walk toward
    pub to_block: String,
    /// Common ancestor used for the walk
    pub ancestor: String,
    /// Correlation token set on all notifications of this request
    pub reqtoken: String,
    /// Notification counts per direction
    pub steps: StepsInfo,
}

/// Notification counts per direction.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StepsInfo {
    /// Number of detach notifications queued
    pub detach: u64,
    /// Number of attach notifications queued
    pub attach: u64,
}

/// Currently tracked subscriber ids.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SubscribersResponse {
    /// Tracked subscriber ids, sorted
    pub subscribers: Vec<String>,
}

/// Request body for modifying the tracked-subscriber set.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ModifySubscribersRequest {
    /// One of "add" or "remove"
    pub command: String,
    /// Subscriber id to add or remove
    pub subscriber: String,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Overall health status
    pub status: HealthStatus,
    /// Application version
    pub version: String,
    /// Uptime in seconds
    pub uptime_seconds: u64,
    /// Height of the current chain tip
    pub chain_height: u64,
    /// Worker lifecycle state
    pub worker_status: String,
    /// Work items accepted but not yet fully processed
    pub pending_items: u64,
}

/// Health status states.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Accepting and dispatching work
    Healthy,
    /// Draining only; no new work accepted
    Degraded,
    /// Worker terminated
    Unhealthy,
}

/// Error response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error type
    pub error: String,
    /// Human-readable message
    pub message: String,
    /// Optional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// WebSocket message for the notification stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationStreamMessage {
    /// Event type ("connected" or "notification")
    pub event_type: String,
    /// Subscriber id the stream is scoped to
    pub subscriber: String,
    /// Timestamp the message was emitted
    pub timestamp: DateTime<Utc>,
    /// Detach or attach; absent on the greeting
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<String>,
    /// Correlation token; absent on the greeting
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reqtoken: Option<String>,
    /// Block content; absent on the greeting
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block: Option<BlockInfo>,
}

impl NotificationStreamMessage {
    /// Greeting message sent once a stream is established.
    #[must_use]
    pub fn connected(subscriber: String) -> Self {
        Self {
            event_type: "connected".to_string(),
            subscriber,
            timestamp: Utc::now(),
            direction: None,
            reqtoken: None,
            block: None,
        }
    }

    /// Wrap one outbound notification for a subscriber's stream.
    #[must_use]
    pub fn notification(
        subscriber: String,
        direction: Direction,
        reqtoken: String,
        payload: &BlockPayload,
    ) -> Self {
        Self {
            event_type: "notification".to_string(),
            subscriber,
            timestamp: Utc::now(),
            direction: Some(direction.as_str().to_string()),
            reqtoken: Some(reqtoken),
            block: Some(BlockInfo::from_payload(payload)),
        }
    }
}

/// Block content in stream messages.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BlockInfo {
    /// Block hash (hex)
    pub hash: String,
    /// Parent block hash (hex); absent at genesis
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_hash: Option<String>,
    /// Block height
    pub height: u64,
    /// Raw block data (hex)
    pub data: String,
}

impl BlockInfo {
    /// Convert a resolved payload to its wire form.
    #[must_use]
    pub fn from_payload(payload: &BlockPayload) -> Self {
        Self {
            hash: payload.hash.to_string(),
            parent_hash: payload.parent_hash.map(|h| h.to_string()),
            height: payload.height,
            data: payload.data.to_string(),
        }
    }
}
