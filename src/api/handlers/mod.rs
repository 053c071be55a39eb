//! HTTP handlers for API endpoints.

pub mod health;
pub mod stream;
pub mod subscribers;
pub mod updates;
