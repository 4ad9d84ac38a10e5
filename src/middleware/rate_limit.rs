use std::net::{IpAddr, SocketAddr};
use std::time::{Duration, Instant};

use axum::extract::{ConnectInfo, Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::Response;
use dashmap::DashMap;

use crate::helpers;
use crate::state::AppState;

pub const WINDOW: Duration = Duration::from_secs(15 * 60);
pub const GENERAL_MAX_REQUESTS: u32 = 100;
// register/login get a much tighter allowance
pub const AUTH_MAX_REQUESTS: u32 = 10;

struct Window {
    started: Instant,
    count: u32,
}

/// Fixed-window request counter keyed by client address. Counters live in
/// process memory and reset when their window elapses; multiple instances do
/// not share state.
pub struct RateLimiter {
    windows: DashMap<IpAddr, Window>,
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

    /// Consume one unit of quota for `ip`, reporting whether the request
    /// still fits the current window.
    pub fn check(&self, ip: IpAddr) -> bool {
        self.check_at(ip, Instant::now())
    }

    fn check_at(&self, ip: IpAddr, now: Instant) -> bool {
        let mut entry = self.windows.entry(ip).or_insert(Window {
            started: now,
            count: 0,
        });
        if now.duration_since(entry.started) >= self.window {
            entry.started = now;
            entry.count = 0;
        }
        entry.count += 1;
        entry.count <= self.max_requests
    }
}

pub async fn per_client(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    req: Request,
    next: Next,
) -> Response {
    if !state.api_limiter.check(addr.ip()) {
        return too_many_requests();
    }
    next.run(req).await
}

pub async fn per_client_auth(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    req: Request,
    next: Next,
) -> Response {
    if !state.auth_limiter.check(addr.ip()) {
        return too_many_requests();
    }
    next.run(req).await
}

fn too_many_requests() -> Response {
    helpers::fail(
        StatusCode::TOO_MANY_REQUESTS,
        "Too many requests, please try again later.",
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip(last: u8) -> IpAddr {
        IpAddr::from([127, 0, 0, last])
    }

    #[test]
    fn requests_within_quota_pass() {
        let limiter = RateLimiter::new(3, Duration::from_secs(60));
        let t0 = Instant::now();
        for _ in 0..3 {
            assert!(limiter.check_at(ip(1), t0));
        }
    }

    #[test]
    fn request_over_quota_is_rejected() {
        let limiter = RateLimiter::new(2, Duration::from_secs(60));
        let t0 = Instant::now();
        assert!(limiter.check_at(ip(1), t0));
        assert!(limiter.check_at(ip(1), t0));
        assert!(!limiter.check_at(ip(1), t0));
    }

    #[test]
    fn quota_resets_in_the_next_window() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        let t0 = Instant::now();
        assert!(limiter.check_at(ip(1), t0));
        assert!(!limiter.check_at(ip(1), t0 + Duration::from_secs(30)));
        assert!(limiter.check_at(ip(1), t0 + Duration::from_secs(60)));
    }

    #[test]
    fn clients_are_counted_separately() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        let t0 = Instant::now();
        assert!(limiter.check_at(ip(1), t0));
        assert!(limiter.check_at(ip(2), t0));
        assert!(!limiter.check_at(ip(1), t0));
    }
}
