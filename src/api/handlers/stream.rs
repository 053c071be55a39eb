//! WebSocket streaming endpoint.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    response::Response,
};
use tracing::{info, instrument, warn};

use crate::api::models::NotificationStreamMessage;
use crate::app_state::AppState;

#[utoipa::path(
    get,
    path = "/api/v1/stream/{subscriber}",
    params(
        ("subscriber" = String, Path, description = "Subscriber id")
    ),
    responses(
        (status = 101, description = "WebSocket upgrade")
    ),
    tag = "Streaming"
)]
/// WebSocket endpoint for block notifications.
#[instrument(skip(state, ws), fields(subscriber = %subscriber))]
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    Path(subscriber): Path<String>,
    State(state): State<AppState>,
) -> Response {
    info!(subscriber = %subscriber, "WebSocket connection requested");

    ws.on_upgrade(move |socket| handle_socket(socket, subscriber, state))
}

async fn handle_socket(mut socket: WebSocket, subscriber: String, state: AppState) {
    info!(subscriber = %subscriber, "WebSocket connection established");

    let connect_msg = NotificationStreamMessage::connected(subscriber.clone());

    if let Ok(json) = serde_json::to_string(&connect_msg) {
        let _ = socket.send(Message::Text(json)).await;
    }

    let mut rx = state.notifications.subscribe();

    loop {
        tokio::select! {
            Ok(notification) = rx.recv() => {
                if !notification.subscribers.contains(&subscriber) {
                    continue;
                }

                let msg = NotificationStreamMessage::notification(
                    subscriber.clone(),
                    notification.direction,
                    notification.reqtoken.clone(),
                    &notification.payload,
                );

                if let Ok(json) = serde_json::to_string(&msg) {
                    if socket.send(Message::Text(json)).await.is_err() {
                        warn!(subscriber = %subscriber, "Failed to send message, closing connection");
                        break;
                    }
                }
            }

            Some(Ok(msg)) = socket.recv() => {
                match msg {
                    Message::Close(_) => {
                        info!(subscriber = %subscriber, "Client closed connection");
                        break;
                    }
                    Message::Ping(data) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    _ => {}
                }
            }

            else => break,
        }
    }

    info!(subscriber = %subscriber, "WebSocket connection closed");
}
