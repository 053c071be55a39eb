//! API middleware: error mapping, request logging, rate limiting.

pub mod error;
pub mod logging;
pub mod rate_limit;
