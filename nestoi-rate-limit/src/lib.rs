use std::hash::Hash;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::{ConnectInfo, Request};
use axum::http::{header, HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Router;
use dashmap::DashMap;
use nestoi_core::{Middleware, RateLimit};

/// Body of the `429` response.
pub const TOO_MANY_REQUESTS_MESSAGE: &str = "Too many requests, please try again later.";

/// Acquisitions between two sweeps of idle buckets.
pub const DEFAULT_SWEEP_EVERY: u64 = 1024;

struct TokenBucket {
    tokens: f64,
    last_refill: Instant,
}

/// Refill tokens based on elapsed time and try to consume one.
/// Returns `true` if a token was consumed, `false` if rate-limited.
#[inline]
fn refill_and_try_consume(
    tokens: &mut f64,
    last_refill: &mut Instant,
    max_tokens: f64,
    window: Duration,
) -> bool {
    let now = Instant::now();
    let elapsed = now.duration_since(*last_refill);
    let refill = (elapsed.as_secs_f64() / window.as_secs_f64()) * max_tokens;
    *tokens = (*tokens + refill).min(max_tokens);
    *last_refill = now;

    if *tokens >= 1.0 {
        *tokens -= 1.0;
        true
    } else {
        false
    }
}

/// A token-bucket rate limiter keyed by an arbitrary type.
///
/// Each key gets its own independent bucket holding up to `max` tokens, which
/// refill at a constant rate of `max` per `window`.
///
/// Every `sweep_every` acquisitions, buckets untouched for a whole `window`
/// are dropped. Such a bucket is full again, so a fresh one is equivalent.
#[derive(Clone)]
pub struct RateLimiter<K> {
    buckets: Arc<DashMap<K, TokenBucket>>,
    max_tokens: f64,
    window: Duration,
    acquisitions: Arc<AtomicU64>,
    sweep_every: u64,
}

impl<K: Eq + Hash + Clone> RateLimiter<K> {
    /// Create a rate limiter that allows `max` requests per `window`.
    pub fn new(max: u64, window: Duration) -> Self {
        Self {
            buckets: Arc::new(DashMap::new()),
            max_tokens: max as f64,
            window,
            acquisitions: Arc::new(AtomicU64::new(0)),
            sweep_every: DEFAULT_SWEEP_EVERY,
        }
    }

    /// Sweep idle buckets every `n` acquisitions (at least 1).
    pub fn with_sweep_every(mut self, n: u64) -> Self {
        self.sweep_every = n.max(1);
        self
    }

    /// Try to consume one token for the given key.
    ///
    /// Returns `true` if the request is allowed, `false` if rate-limited.
    pub fn try_acquire(&self, key: &K) -> bool {
        // Sweep before taking the entry: `retain` locks every shard.
        let count = self.acquisitions.fetch_add(1, Ordering::Relaxed) + 1;
        if count % self.sweep_every == 0 {
            self.evict_idle(self.window);
        }

        let mut entry = self.buckets.entry(key.clone()).or_insert_with(|| TokenBucket {
            tokens: self.max_tokens,
            last_refill: Instant::now(),
        });

        let bucket = entry.value_mut();
        refill_and_try_consume(&mut bucket.tokens, &mut bucket.last_refill, self.max_tokens, self.window)
    }

    /// Drop buckets untouched for at least `idle`.
    pub fn evict_idle(&self, idle: Duration) {
        let now = Instant::now();
        self.buckets
            .retain(|_, bucket| now.duration_since(bucket.last_refill) < idle);
    }

    pub fn tracked_keys(&self) -> usize {
        self.buckets.len()
    }

    /// Time needed to regain one token.
    pub fn refill_interval(&self) -> Duration {
        if self.max_tokens <= 0.0 {
            return self.window;
        }
        self.window.div_f64(self.max_tokens)
    }
}

/// Per-client request limit applied to every request of an application.
///
/// Clients are identified by their socket address (`ConnectInfo`), falling
/// back to the first `x-forwarded-for` entry.
#[derive(Clone)]
pub struct ClientRateLimit {
    limiter: RateLimiter<String>,
}

impl ClientRateLimit {
    pub fn new(max: u32, window: Duration) -> Self {
        Self {
            limiter: RateLimiter::new(u64::from(max), window),
        }
    }

    pub fn from_settings(settings: &RateLimit) -> Self {
        Self::new(settings.limit, settings.window)
    }

    pub fn with_sweep_every(mut self, n: u64) -> Self {
        self.limiter = self.limiter.with_sweep_every(n);
        self
    }

    pub fn limiter(&self) -> &RateLimiter<String> {
        &self.limiter
    }

    pub fn into_middleware(self) -> Middleware {
        let limiter = self.limiter;
        Middleware::from_fn(move |req: Request, next: Next| {
            let limiter = limiter.clone();
            async move {
                let key = client_key(&req);
                if limiter.try_acquire(&key) {
                    next.run(req).await
                } else {
                    tracing::debug!(client = %key, "rate limit exceeded");
                    too_many_requests(limiter.refill_interval())
                }
            }
        })
    }

    /// Wrap `router` so every request is counted against its client's bucket.
    pub fn apply(self, router: Router) -> Router {
        self.into_middleware().layer(router)
    }
}

fn client_key(req: &Request) -> String {
    if let Some(ConnectInfo(addr)) = req.extensions().get::<ConnectInfo<SocketAddr>>() {
        return addr.ip().to_string();
    }
    req.headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}

fn too_many_requests(retry_after: Duration) -> Response {
    let mut response = (StatusCode::TOO_MANY_REQUESTS, TOO_MANY_REQUESTS_MESSAGE).into_response();
    let seconds = retry_after.as_secs_f64().ceil().max(1.0) as u64;
    response
        .headers_mut()
        .insert(header::RETRY_AFTER, HeaderValue::from(seconds));
    response
}
