//! Rate limiting middleware.
//!
//! A single process-wide quota guards the whole API surface; scheduling
//! requests are cheap to validate but each one queues background work, so
//! the limiter sits in front of every route.

use axum::{extract::Request, middleware::Next, response::Response};
use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use std::num::NonZeroU32;
use std::sync::Arc;

use crate::api::middleware::error::ApiError;

/// Fallback quota when the configured RPM is unusable.
const DEFAULT_RPM: u32 = 60;

/// Shared rate limiter type.
pub type SharedRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

/// Create a rate limiter with the specified requests-per-minute quota.
#[must_use]
pub fn create_rate_limiter(requests_per_minute: u32) -> SharedRateLimiter {
    let rpm = NonZeroU32::new(requests_per_minute)
        .or_else(|| NonZeroU32::new(DEFAULT_RPM))
        .unwrap_or(NonZeroU32::MIN);

    Arc::new(RateLimiter::direct(Quota::per_minute(rpm)))
}

/// Rate limiting middleware.
///
/// # Errors
///
/// Returns [`ApiError::RateLimitExceeded`] (429, JSON body) once the
/// quota is exhausted.
pub async fn rate_limit(
    limiter: SharedRateLimiter,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    match limiter.check() {
        Ok(()) => Ok(next.run(request).await),
        Err(_) => Err(ApiError::RateLimitExceeded),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quota_is_enforced() {
        let limiter = create_rate_limiter(2);
        assert!(limiter.check().is_ok());
        assert!(limiter.check().is_ok());
        assert!(limiter.check().is_err());
    }

    #[test]
    fn test_zero_rpm_falls_back_to_default() {
        // A zero quota would reject everything; the limiter must still
        // admit requests.
        let limiter = create_rate_limiter(0);
        assert!(limiter.check().is_ok());
    }
}
