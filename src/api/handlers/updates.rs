//! On-demand reorg update scheduling endpoint.

use alloy::primitives::B256;
use axum::{extract::State, Json};
use tracing::instrument;

use crate::api::middleware::error::ApiError;
use crate::api::models::{ScheduleRequest, ScheduleResponse, StepsInfo};
use crate::app_state::AppState;

#[utoipa::path(
    post,
    path = "/api/v1/updates",
    request_body = ScheduleRequest,
    responses(
        (status = 200, description = "Notifications scheduled", body = ScheduleResponse),
        (status = 404, description = "Block reference not found"),
        (status = 409, description = "Block data unavailable"),
        (status = 503, description = "No notification transport configured")
    ),
    tag = "Updates"
)]
/// Schedules detach/attach notifications for a subscriber.
///
/// Returns immediately once the work item is queued; the notifications are
/// delivered asynchronously over the subscriber's stream, all tagged with
/// the returned correlation token.
#[instrument(skip(state, request), fields(subscriber = %request.subscriber))]
pub async fn schedule_updates(
    State(state): State<AppState>,
    Json(request): Json<ScheduleRequest>,
) -> Result<Json<ScheduleResponse>, ApiError> {
    let from_block = parse_hash(&request.from_block, "from_block")?;
    let to_block = request
        .to_block
        .as_deref()
        .map(|raw| parse_hash(raw, "to_block"))
        .transpose()?;

    let summary = state
        .dispatcher
        .schedule_updates(&request.subscriber, from_block, to_block)?;

    Ok(Json(ScheduleResponse {
        to_block: summary.to_block.to_string(),
        ancestor: summary.ancestor.to_string(),
        reqtoken: summary.reqtoken,
        steps: StepsInfo {
            detach: summary.detach_count as u64,
            attach: summary.attach_count as u64,
        },
    }))
}

fn parse_hash(raw: &str, field: &str) -> Result<B256, ApiError> {
    raw.parse::<B256>()
        .map_err(|_| ApiError::BadRequest(format!("{field} must be a 32-byte hex hash")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hash_accepts_prefixed_hex() {
        let raw = "0x1111111111111111111111111111111111111111111111111111111111111111";
        let parsed = parse_hash(raw, "from_block");
        assert_eq!(parsed.ok(), Some(B256::repeat_byte(0x11)));
    }

    #[test]
    fn test_parse_hash_rejects_garbage() {
        let parsed = parse_hash("not-a-hash", "from_block");
        assert!(matches!(parsed, Err(ApiError::BadRequest(_))));
    }
}
