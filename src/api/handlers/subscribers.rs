//! Subscriber registry endpoints.

use axum::{extract::State, Json};
use tracing::instrument;

use crate::api::middleware::error::ApiError;
use crate::api::models::{ModifySubscribersRequest, SubscribersResponse};
use crate::app_state::AppState;

#[utoipa::path(
    get,
    path = "/api/v1/subscribers",
    responses(
        (status = 200, description = "Tracked subscribers", body = SubscribersResponse)
    ),
    tag = "Subscribers"
)]
/// Lists the currently tracked subscriber ids.
#[instrument(skip(state))]
pub async fn list_subscribers(
    State(state): State<AppState>,
) -> Result<Json<SubscribersResponse>, ApiError> {
    let subscribers = state.dispatcher.list_subscribers().into_iter().collect();
    Ok(Json(SubscribersResponse { subscribers }))
}

#[utoipa::path(
    post,
    path = "/api/v1/subscribers",
    request_body = ModifySubscribersRequest,
    responses(
        (status = 200, description = "Updated subscriber list", body = SubscribersResponse),
        (status = 400, description = "Unknown command")
    ),
    tag = "Subscribers"
)]
/// Adds or removes a subscriber from the tracked set.
#[instrument(skip(state, request), fields(command = %request.command, subscriber = %request.subscriber))]
pub async fn modify_subscribers(
    State(state): State<AppState>,
    Json(request): Json<ModifySubscribersRequest>,
) -> Result<Json<SubscribersResponse>, ApiError> {
    state
        .dispatcher
        .modify_subscribers(&request.command, &request.subscriber)?;

    let subscribers = state.dispatcher.list_subscribers().into_iter().collect();
    Ok(Json(SubscribersResponse { subscribers }))
}
