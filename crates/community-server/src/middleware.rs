//! HTTP middleware: per-IP rate limiting and request metrics

use crate::error::ApiError;
use crate::observability::{AuditEventType, AuditLogger};
use crate::state::AppState;
use axum::extract::{ConnectInfo, MatchedPath, Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use dashmap::DashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

pub const RATE_LIMIT_MAX_REQUESTS: u32 = 60;
pub const RATE_LIMIT_WINDOW: Duration = Duration::from_secs(60);

/// Fixed-window request counter keyed by client IP
pub struct RateLimiter {
    windows: DashMap<String, (u32, Instant)>,
    max_requests: u32,
    window: Duration,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            windows: DashMap::new(),
            max_requests,
            window,
        }
    }

    /// Returns true if the request is within budget
    pub fn check(&self, key: &str) -> bool {
        let now = Instant::now();
        let mut entry = self
            .windows
            .entry(key.to_string())
            .or_insert((0, now));

        let (count, started) = *entry;
        if now.duration_since(started) >= self.window {
            *entry = (1, now);
            return true;
        }
        if count >= self.max_requests {
            return false;
        }
        *entry = (count + 1, started);
        drop(entry);

        // Opportunistic cleanup of stale windows
        if self.windows.len() > 10_000 {
            let window = self.window;
            self.windows
                .retain(|_, (_, started)| now.duration_since(*started) < window);
        }
        true
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(RATE_LIMIT_MAX_REQUESTS, RATE_LIMIT_WINDOW)
    }
}

/// Best-effort client IP: proxy header first, then the socket address
pub fn client_ip(req: &Request) -> String {
    if let Some(forwarded) = req
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
    {
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return first.to_string();
            }
        }
    }
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Per-IP fixed-window rate limiting for the API surface.
/// Health and metrics probes are exempt.
pub async fn rate_limit(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Response {
    if !req.uri().path().starts_with("/api/") {
        return next.run(req).await;
    }

    let ip = client_ip(&req);
    if !state.rate_limiter.check(&ip) {
        AuditLogger::security(
            &state,
            AuditEventType::RateLimitExceeded,
            &ip,
            req.uri().path(),
        )
        .await;
        return ApiError::RateLimited.into_response();
    }

    next.run(req).await
}

/// Record request count and latency per route template
pub async fn track_metrics(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Response {
    let method = req.method().to_string();
    // Use the route template, not the raw path, to bound label cardinality
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let start = Instant::now();
    let response = next.run(req).await;
    let elapsed = start.elapsed().as_secs_f64();

    let status = response.status().as_u16().to_string();
    state
        .metrics
        .requests_total
        .with_label_values(&[&method, &path, &status])
        .inc();
    state
        .metrics
        .request_duration_seconds
        .with_label_values(&[&method, &path])
        .observe(elapsed);

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limiter_allows_up_to_limit() {
        let limiter = RateLimiter::new(3, Duration::from_secs(60));
        assert!(limiter.check("1.2.3.4"));
        assert!(limiter.check("1.2.3.4"));
        assert!(limiter.check("1.2.3.4"));
        assert!(!limiter.check("1.2.3.4"));
        // Other clients are unaffected
        assert!(limiter.check("5.6.7.8"));
    }

    #[test]
    fn test_rate_limiter_window_reset() {
        let limiter = RateLimiter::new(1, Duration::from_millis(10));
        assert!(limiter.check("1.2.3.4"));
        assert!(!limiter.check("1.2.3.4"));
        std::thread::sleep(Duration::from_millis(20));
        assert!(limiter.check("1.2.3.4"));
    }
}
