//! Axum server setup and routing.

use axum::http::HeaderValue;
use axum::{
    middleware,
    routing::{get, post},
    Json, Router,
};
use std::net::SocketAddr;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use utoipa::OpenApi;

use crate::api::{docs::ApiDoc, handlers, middleware as api_middleware};
use crate::app_state::AppState;

/// Run the Axum API server.
pub async fn run_server(
    state: AppState,
    port: u16,
    rate_limit_rpm: u32,
    cors_origins: Vec<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let limiter = api_middleware::rate_limit::create_rate_limiter(rate_limit_rpm);

    let api_routes = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/updates", post(handlers::updates::schedule_updates))
        .route(
            "/subscribers",
            get(handlers::subscribers::list_subscribers)
                .post(handlers::subscribers::modify_subscribers),
        )
        .route("/stream/:subscriber", get(handlers::stream::websocket_handler));

    let cors = build_cors_layer(cors_origins);

    let middleware_stack = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
        .layer(middleware::from_fn(api_middleware::logging::log_requests))
        .layer(middleware::from_fn(move |req, next| {
            api_middleware::rate_limit::rate_limit(limiter.clone(), req, next)
        }));

    let app = Router::new()
        .route(
            "/api-docs/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        )
        .nest("/api/v1", api_routes)
        .layer(middleware_stack)
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn build_cors_layer(origins: Vec<String>) -> CorsLayer {
    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        CorsLayer::new().allow_origin(Any)
    } else {
        let mut layer = CorsLayer::new();
        for origin in origins {
            if let Ok(header) = origin.parse::<HeaderValue>() {
                layer = layer.clone().allow_origin(header);
            }
        }
        layer
    }
}
