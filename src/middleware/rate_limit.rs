use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, HeaderMap, HeaderValue, Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;

const WINDOW: Duration = Duration::from_secs(1);
/// Past this many tracked callers, expired windows are dropped on insert.
const PRUNE_AT: usize = 4096;

/// Who a request is counted against. Bearer tokens are fingerprinted rather
/// than stored; unauthenticated traffic (registration) falls back to the
/// first forwarded address.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Caller {
    Bearer(u64),
    Forwarded(String),
    Anonymous,
}

impl Caller {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        if let Some(token) = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
        {
            let mut hasher = DefaultHasher::new();
            token.hash(&mut hasher);
            return Caller::Bearer(hasher.finish());
        }
        headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|addr| !addr.is_empty())
            .map(|addr| Caller::Forwarded(addr.to_string()))
            .unwrap_or(Caller::Anonymous)
    }

    fn kind(&self) -> &'static str {
        match self {
            Caller::Bearer(_) => "bearer",
            Caller::Forwarded(_) => "forwarded",
            Caller::Anonymous => "anonymous",
        }
    }
}

#[derive(Debug)]
struct Window {
    opened: Instant,
    served: u32,
}

/// Per-caller one-second windows over the `/api` routes.
#[derive(Clone, Debug)]
pub struct RateLimiter {
    per_second: u32,
    windows: Arc<Mutex<HashMap<Caller, Window>>>,
}

impl RateLimiter {
    pub fn new(per_second: u32) -> Self {
        Self {
            per_second: per_second.max(1),
            windows: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn try_acquire(&self, caller: &Caller) -> bool {
        let mut windows = self
            .windows
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let now = Instant::now();

        if windows.len() >= PRUNE_AT && !windows.contains_key(caller) {
            windows.retain(|_, w| now.duration_since(w.opened) < WINDOW);
        }

        let window = windows.entry(caller.clone()).or_insert(Window {
            opened: now,
            served: 0,
        });
        if now.duration_since(window.opened) >= WINDOW {
            window.opened = now;
            window.served = 0;
        }
        if window.served < self.per_second {
            window.served += 1;
            true
        } else {
            false
        }
    }
}

pub async fn limit_requests(
    State(limiter): State<RateLimiter>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let caller = Caller::from_headers(req.headers());
    if !limiter.try_acquire(&caller) {
        tracing::warn!(
            path = %req.uri().path(),
            caller = caller.kind(),
            "request rate limit exceeded"
        );
        let mut resp = (
            StatusCode::TOO_MANY_REQUESTS,
            Json(json!({ "error": "rate_limit_exceeded" })),
        )
            .into_response();
        resp.headers_mut()
            .insert(header::RETRY_AFTER, HeaderValue::from_static("1"));
        return resp;
    }
    next.run(req).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_static(value));
        }
        map
    }

    #[test]
    fn each_caller_gets_its_own_window() {
        let limiter = RateLimiter::new(2);
        let alice = Caller::from_headers(&headers(&[("authorization", "Bearer alice")]));
        let bob = Caller::from_headers(&headers(&[("authorization", "Bearer bob")]));

        assert!(limiter.try_acquire(&alice));
        assert!(limiter.try_acquire(&alice));
        assert!(!limiter.try_acquire(&alice));
        assert!(limiter.try_acquire(&bob));
    }

    #[test]
    fn zero_is_treated_as_one() {
        let limiter = RateLimiter::new(0);
        assert!(limiter.try_acquire(&Caller::Anonymous));
        assert!(!limiter.try_acquire(&Caller::Anonymous));
    }

    #[test]
    fn callers_are_keyed_by_token_then_forwarded_address() {
        let same = Caller::from_headers(&headers(&[("authorization", "Bearer t1")]));
        assert_eq!(
            same,
            Caller::from_headers(&headers(&[
                ("authorization", "Bearer t1"),
                ("x-forwarded-for", "10.0.0.1"),
            ]))
        );
        assert_eq!(
            Caller::from_headers(&headers(&[("x-forwarded-for", "203.0.113.7, 10.0.0.1")])),
            Caller::Forwarded("203.0.113.7".into())
        );
        assert_eq!(
            Caller::from_headers(&headers(&[("authorization", "Basic abc")])),
            Caller::Anonymous
        );
    }
}
