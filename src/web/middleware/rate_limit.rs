//! # Rate Limiting Middleware
//!
//! Token-bucket rate limiting keyed by API key (or a single global bucket
//! when per-client limits are disabled). Applied before authentication so
//! credential stuffing is throttled along with everything else. Rejected
//! requests get a 429 with a Retry-After hint.

use std::time::Instant;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::warn;

use crate::web::state::AppState;
use crate::web::types::ApiError;

/// A single client's token bucket.
#[derive(Debug)]
struct TokenBucket {
    tokens: f64,
    last_refill: Instant,
}

/// Token-bucket rate limiter shared across requests.
#[derive(Debug)]
pub struct RateLimiter {
    buckets: DashMap<String, Mutex<TokenBucket>>,
    capacity: f64,
    refill_per_second: f64,
}

impl RateLimiter {
    pub fn new(requests_per_minute: u32, burst_size: u32) -> Self {
        Self {
            buckets: DashMap::new(),
            capacity: f64::from(burst_size.max(1)),
            refill_per_second: f64::from(requests_per_minute.max(1)) / 60.0,
        }
    }

    /// Try to take one token for `key`; on rejection returns the suggested
    /// Retry-After in seconds.
    pub fn check(&self, key: &str) -> Result<(), u64> {
        self.check_at(key, Instant::now())
    }

    fn check_at(&self, key: &str, now: Instant) -> Result<(), u64> {
        let entry = self.buckets.entry(key.to_string()).or_insert_with(|| {
            Mutex::new(TokenBucket {
                tokens: self.capacity,
                last_refill: now,
            })
        });

        let mut bucket = entry.lock();

        let elapsed = now.saturating_duration_since(bucket.last_refill);
        bucket.tokens =
            (bucket.tokens + elapsed.as_secs_f64() * self.refill_per_second).min(self.capacity);
        bucket.last_refill = now;

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            Ok(())
        } else {
            let deficit = 1.0 - bucket.tokens;
            let retry_after = (deficit / self.refill_per_second).ceil().max(1.0) as u64;
            Err(retry_after)
        }
    }
}

/// Rate limiting middleware applied to the protected route stack.
pub async fn enforce_rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let limits = &state.config.web.rate_limiting;
    if !limits.enabled {
        return Ok(next.run(request).await);
    }

    let key = if limits.per_client_limit {
        client_key(&state, &request)
    } else {
        "global".to_string()
    };

    match state.rate_limiter.check(&key) {
        Ok(()) => Ok(next.run(request).await),
        Err(retry_after_seconds) => {
            warn!(client = %key, retry_after_seconds, "Request rate limited");
            Err(ApiError::rate_limited(retry_after_seconds))
        }
    }
}

/// Derive the limiter key for a request: the presented credential when
/// there is one, otherwise a shared anonymous bucket.
fn client_key(state: &AppState, request: &Request) -> String {
    let headers = request.headers();

    if let Some(token) = headers
        .get("authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
    {
        return format!("key:{token}");
    }

    if let Some(key) = headers
        .get(state.config.web.auth.api_key_header.as_str())
        .and_then(|h| h.to_str().ok())
    {
        return format!("key:{key}");
    }

    "anonymous".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_burst_is_honored_then_rejected() {
        let limiter = RateLimiter::new(60, 3);
        let now = Instant::now();

        for _ in 0..3 {
            assert!(limiter.check_at("client", now).is_ok());
        }
        let retry_after = limiter.check_at("client", now).unwrap_err();
        assert!(retry_after >= 1);
    }

    #[test]
    fn test_bucket_refills_over_time() {
        let limiter = RateLimiter::new(60, 1);
        let start = Instant::now();

        assert!(limiter.check_at("client", start).is_ok());
        assert!(limiter.check_at("client", start).is_err());

        // One request per second at 60 rpm; two seconds is plenty
        let later = start + Duration::from_secs(2);
        assert!(limiter.check_at("client", later).is_ok());
    }

    #[test]
    fn test_clients_have_independent_buckets() {
        let limiter = RateLimiter::new(60, 1);
        let now = Instant::now();

        assert!(limiter.check_at("a", now).is_ok());
        assert!(limiter.check_at("b", now).is_ok());
        assert!(limiter.check_at("a", now).is_err());
    }

    #[test]
    fn test_tokens_never_exceed_capacity() {
        let limiter = RateLimiter::new(6000, 2);
        let start = Instant::now();

        assert!(limiter.check_at("client", start).is_ok());

        // Long idle must not accumulate more than the burst capacity
        let later = start + Duration::from_secs(3600);
        assert!(limiter.check_at("client", later).is_ok());
        assert!(limiter.check_at("client", later).is_ok());
        assert!(limiter.check_at("client", later).is_err());
    }
}
