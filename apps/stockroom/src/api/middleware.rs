//! # Rate Limiting
//!
//! One shared token bucket for the whole API. A refused request gets the
//! usual JSON envelope, a 429 and a `Retry-After` hint in seconds.

use super::types::ApiResponse;
use axum::{
    Json,
    body::Body,
    extract::State,
    http::{Request, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{
    Quota, RateLimiter,
    clock::{Clock, DefaultClock},
    state::{InMemoryState, NotKeyed},
};
use std::num::NonZeroU32;
use std::sync::Arc;

/// Used when a zero rate reaches the constructor.
const FALLBACK_RPS: NonZeroU32 = match NonZeroU32::new(100) {
    Some(rps) => rps,
    None => NonZeroU32::MIN,
};

pub type GlobalRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

pub fn create_rate_limiter(requests_per_second: u32) -> GlobalRateLimiter {
    let rps = NonZeroU32::new(requests_per_second).unwrap_or(FALLBACK_RPS);
    Arc::new(RateLimiter::direct(Quota::per_second(rps)))
}

pub async fn rate_limit_middleware(
    State(limiter): State<GlobalRateLimiter>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let denied = match limiter.check() {
        Ok(()) => return next.run(request).await,
        Err(denied) => denied,
    };

    // Round up so clients never retry early.
    let wait = denied.wait_time_from(DefaultClock::default().now());
    let retry_after = wait.as_secs().saturating_add(1);
    tracing::warn!(
        event = "rate_limited",
        path = %request.uri().path(),
        retry_after,
        "Rate limit exceeded"
    );
    (
        StatusCode::TOO_MANY_REQUESTS,
        [(header::RETRY_AFTER, retry_after.to_string())],
        Json(ApiResponse::<()>::error("Too many requests, retry shortly")),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_rate_falls_back() {
        let limiter = create_rate_limiter(0);
        for _ in 0..FALLBACK_RPS.get() {
            assert!(limiter.check().is_ok());
        }
        assert!(limiter.check().is_err());
    }

    #[test]
    fn burst_of_one() {
        let limiter = create_rate_limiter(1);
        assert!(limiter.check().is_ok());
        assert!(limiter.check().is_err());
    }
}
