//! HTTP API module exposing the dispatcher over REST and WebSocket.

pub mod docs;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod server;
