//! Fixed-window rate limiter middleware.
//!
//! Counts requests in the current wall-clock second and rejects the excess
//! with 429. Applied to the `/api` routes only.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::extract::{Extension, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::error::ApiError;

const COUNT_MASK: u64 = u32::MAX as u64;

/// Shared state for the rate limiter.
///
/// The window (low 32 bits of the epoch second) and the request count live in
/// one atomic word, `window << 32 | count`, so both change together.
#[derive(Clone)]
pub struct RateLimiter {
    max_per_sec: u64,
    state: Arc<AtomicU64>,
}

impl RateLimiter {
    pub fn new(max_per_sec: u64) -> Self {
        Self {
            max_per_sec: max_per_sec.min(COUNT_MASK),
            state: Arc::new(AtomicU64::new(0)),
        }
    }

    fn try_acquire(&self) -> bool {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        self.try_acquire_at(now)
    }

    fn try_acquire_at(&self, now: u64) -> bool {
        let window = now & COUNT_MASK;
        let mut state = self.state.load(Ordering::Relaxed);
        loop {
            let count = if state >> 32 == window {
                (state & COUNT_MASK) + 1
            } else {
                1
            };
            if count > self.max_per_sec {
                return false;
            }
            match self.state.compare_exchange_weak(
                state,
                (window << 32) | count,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => return true,
                Err(actual) => state = actual,
            }
        }
    }
}

/// Axum middleware that enforces the rate limit.
pub async fn rate_limit_middleware(
    Extension(limiter): Extension<RateLimiter>,
    req: Request,
    next: Next,
) -> Response {
    if limiter.try_acquire() {
        next.run(req).await
    } else {
        tracing::debug!(path = %req.uri().path(), "Rate limit exceeded");
        ApiError::TooManyRequests("rate limit exceeded, please slow down".to_string()).into_response()
    }
}
