use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::{HeaderName, HeaderValue, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::warn;

use shared_config::AppConfig;
use shared_models::error::AppError;

use crate::extractor::client_key;

pub const RATE_LIMITED_MESSAGE: &str = "Too many requests, please try again later.";

static RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("ratelimit-limit");
static RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("ratelimit-remaining");
static RATELIMIT_RESET: HeaderName = HeaderName::from_static("ratelimit-reset");

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

#[derive(Debug)]
struct Windows {
    clients: HashMap<String, Window>,
    last_prune: Instant,
}

/// Outcome of one admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    /// Seconds until the caller's window resets, rounded up.
    pub reset_secs: u64,
}

/// Fixed-window request counter keyed by client address.
#[derive(Debug)]
pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    state: Mutex<Windows>,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            state: Mutex::new(Windows {
                clients: HashMap::new(),
                last_prune: Instant::now(),
            }),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            config.rate_limit_max_requests,
            Duration::from_secs(config.rate_limit_window_secs),
        )
    }

    pub fn check(&self, key: &str) -> Decision {
        self.check_at(key, Instant::now())
    }

    pub fn check_at(&self, key: &str, now: Instant) -> Decision {
        let mut state = self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        if now.saturating_duration_since(state.last_prune) >= self.window {
            let window = self.window;
            state
                .clients
                .retain(|_, w| now.saturating_duration_since(w.started) < window);
            state.last_prune = now;
        }

        let entry = state
            .clients
            .entry(key.to_string())
            .or_insert(Window { started: now, count: 0 });

        if now.saturating_duration_since(entry.started) >= self.window {
            *entry = Window { started: now, count: 0 };
        }

        let allowed = entry.count < self.max_requests;
        if allowed {
            entry.count += 1;
        }

        let elapsed = now.saturating_duration_since(entry.started);
        let reset = self.window.saturating_sub(elapsed);
        let reset_secs = reset.as_secs() + u64::from(reset.subsec_nanos() > 0);

        Decision {
            allowed,
            limit: self.max_requests,
            remaining: self.max_requests.saturating_sub(entry.count),
            reset_secs,
        }
    }

    pub fn tracked_clients(&self) -> usize {
        self.state
            .lock()
            .map(|state| state.clients.len())
            .unwrap_or(0)
    }
}

/// Applies the limiter to every request and decorates responses with the
/// `RateLimit-*` headers.
pub async fn rate_limit_middleware(
    State(limiter): State<Arc<RateLimiter>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let key = client_key(&request);
    let decision = limiter.check(&key);

    let mut response = if decision.allowed {
        next.run(request).await
    } else {
        warn!(
            "Rate limit exceeded for {} on {} {}",
            key,
            request.method(),
            request.uri().path()
        );
        let mut response = AppError::RateLimited(RATE_LIMITED_MESSAGE.to_string()).into_response();
        response
            .headers_mut()
            .insert(axum::http::header::RETRY_AFTER, HeaderValue::from(decision.reset_secs));
        response
    };

    let headers = response.headers_mut();
    headers.insert(RATELIMIT_LIMIT.clone(), HeaderValue::from(decision.limit));
    headers.insert(RATELIMIT_REMAINING.clone(), HeaderValue::from(decision.remaining));
    headers.insert(RATELIMIT_RESET.clone(), HeaderValue::from(decision.reset_secs));

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        http::StatusCode,
        middleware,
        routing::get,
        Router,
    };
    use tower::ServiceExt;

    #[test]
    fn test_window_admits_up_to_limit() {
        let limiter = RateLimiter::new(3, Duration::from_secs(60));
        let now = Instant::now();

        let remaining: Vec<u32> = (0..3).map(|_| limiter.check_at("a", now).remaining).collect();
        assert_eq!(remaining, vec![2, 1, 0]);

        let denied = limiter.check_at("a", now);
        assert!(!denied.allowed);
        assert_eq!(denied.reset_secs, 60);

        // other clients have their own window
        assert!(limiter.check_at("b", now).allowed);
    }

    #[test]
    fn test_window_resets_after_expiry() {
        let limiter = RateLimiter::new(1, Duration::from_secs(10));
        let start = Instant::now();

        assert!(limiter.check_at("a", start).allowed);
        assert!(!limiter.check_at("a", start + Duration::from_secs(9)).allowed);

        let later = limiter.check_at("a", start + Duration::from_secs(10));
        assert!(later.allowed);
        assert_eq!(later.remaining, 0);
    }

    #[test]
    fn test_expired_windows_are_pruned() {
        let limiter = RateLimiter::new(5, Duration::from_secs(10));
        let start = Instant::now();

        limiter.check_at("a", start);
        limiter.check_at("b", start);
        assert_eq!(limiter.tracked_clients(), 2);

        limiter.check_at("c", start + Duration::from_secs(30));
        assert_eq!(limiter.tracked_clients(), 1);
    }

    #[tokio::test]
    async fn test_middleware_rejects_with_headers() {
        let limiter = Arc::new(RateLimiter::new(1, Duration::from_secs(60)));
        let app = Router::new()
            .route("/ping", get(|| async { "pong" }))
            .layer(middleware::from_fn_with_state(limiter, rate_limit_middleware));

        let request = || {
            Request::builder()
                .uri("/ping")
                .header("x-forwarded-for", "198.51.100.4")
                .body(Body::empty())
                .unwrap()
        };

        let first = app.clone().oneshot(request()).await.unwrap();
        assert_eq!(first.status(), StatusCode::OK);
        assert_eq!(first.headers()["ratelimit-limit"], "1");
        assert_eq!(first.headers()["ratelimit-remaining"], "0");

        let second = app.oneshot(request()).await.unwrap();
        assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(second.headers().contains_key("retry-after"));

        let bytes = axum::body::to_bytes(second.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["message"], RATE_LIMITED_MESSAGE);
    }
}
