//! OpenAPI documentation for the REST API.

use utoipa::OpenApi;

use crate::api::handlers;

/// OpenAPI documentation for the REST API.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health::health_check,
        handlers::updates::schedule_updates,
        handlers::subscribers::list_subscribers,
        handlers::subscribers::modify_subscribers,
        handlers::stream::websocket_handler,
    ),
    components(schemas(
        crate::api::models::HealthResponse,
        crate::api::models::ScheduleRequest,
        crate::api::models::ScheduleResponse,
        crate::api::models::StepsInfo,
        crate::api::models::SubscribersResponse,
        crate::api::models::ModifySubscribersRequest,
        crate::api::models::ErrorResponse,
    )),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Updates", description = "Reorg update scheduling"),
        (name = "Subscribers", description = "Subscriber registry management"),
        (name = "Streaming", description = "WebSocket notification streaming"),
    ),
    info(
        title = "Reorg Dispatch API",
        version = "0.1.0",
        description = "Blockchain reorg notification dispatcher API",
    )
)]
pub struct ApiDoc;
