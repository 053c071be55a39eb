//! Health check endpoint.

use axum::{extract::State, Json};
use std::time::SystemTime;
use tracing::instrument;

use crate::api::middleware::error::ApiError;
use crate::api::models::{HealthResponse, HealthStatus};
use crate::app_state::AppState;
use crate::worker::WorkerStatus;

#[utoipa::path(
    get,
    path = "/api/v1/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    ),
    tag = "Health"
)]
/// Returns service health information.
#[instrument(skip(state))]
pub async fn health_check(State(state): State<AppState>) -> Result<Json<HealthResponse>, ApiError> {
    let uptime = SystemTime::now()
        .duration_since(state.start_time)
        .unwrap_or_default()
        .as_secs();

    let chain_height = state.chain.tip().map_or(0, |record| record.height);

    let worker_status = state.dispatcher.worker().status();
    let pending_items = state.dispatcher.worker().pending() as u64;

    let status = match worker_status {
        WorkerStatus::Idle | WorkerStatus::Draining => HealthStatus::Healthy,
        WorkerStatus::Interrupted => HealthStatus::Degraded,
        WorkerStatus::Terminated => HealthStatus::Unhealthy,
    };

    Ok(Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: uptime,
        chain_height,
        worker_status: worker_status.as_str().to_string(),
        pending_items,
    }))
}
