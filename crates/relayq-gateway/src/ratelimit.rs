// SPDX-FileCopyrightText: 2026 Relayq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fixed-window per-IP rate limiting for the `/api/` routes.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::{
    Json,
    extract::{ConnectInfo, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;
use serde_json::json;
use tracing::warn;

use relayq_config::model::RateLimitConfig;

struct WindowCounter {
    window_start: Instant,
    count: u32,
}

/// Fixed-window request counter keyed by client IP.
///
/// A window starts on an IP's first request and resets after `window`
/// elapses. At most once per window a sweep drops every counter whose
/// window has lapsed, so idle IPs do not accumulate for the life of the
/// process.
#[derive(Clone)]
pub struct RateLimiter {
    hits: Arc<DashMap<IpAddr, WindowCounter>>,
    last_sweep: Arc<Mutex<Instant>>,
    window: Duration,
    max_requests: u32,
}

impl RateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            hits: Arc::new(DashMap::new()),
            last_sweep: Arc::new(Mutex::new(Instant::now())),
            window: Duration::from_millis(config.window_ms),
            max_requests: config.max_requests,
        }
    }

    /// Records a hit for `ip` and returns whether it is within the limit.
    pub fn allow(&self, ip: IpAddr) -> bool {
        let now = Instant::now();
        let allowed = {
            let mut entry = self.hits.entry(ip).or_insert(WindowCounter {
                window_start: now,
                count: 0,
            });

            if now.duration_since(entry.window_start) >= self.window {
                entry.window_start = now;
                entry.count = 0;
            }

            entry.count += 1;
            entry.count <= self.max_requests
        };

        self.sweep_expired(now);
        allowed
    }

    /// Drops counters whose window has lapsed. Runs at most once per
    /// window; contention on the sweep lock skips the sweep rather than
    /// blocking the request.
    fn sweep_expired(&self, now: Instant) {
        let Ok(mut last_sweep) = self.last_sweep.try_lock() else {
            return;
        };
        if now.duration_since(*last_sweep) < self.window {
            return;
        }
        *last_sweep = now;
        self.hits
            .retain(|_, counter| now.duration_since(counter.window_start) < self.window);
    }
}

/// Middleware applying the rate limit to every request that reaches it.
///
/// The client IP comes from axum's `ConnectInfo`; requests without it
/// (e.g. in-process test calls) fall back to a single shared bucket.
pub async fn rate_limit_middleware(
    State(limiter): State<RateLimiter>,
    request: Request,
    next: Next,
) -> Response {
    let ip = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));

    if limiter.allow(ip) {
        next.run(request).await
    } else {
        warn!(%ip, "rate limit exceeded");
        (
            StatusCode::TOO_MANY_REQUESTS,
            Json(json!({
                "success": false,
                "error": "Too many requests from this IP, please try again later.",
            })),
        )
            .into_response()
    }
}
