use std::thread::sleep;
use std::time::Duration;

use axum::body::Body;
use axum::extract::Request;
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use http_body_util::BodyExt;
use nestoi_rate_limit::{ClientRateLimit, RateLimiter, TOO_MANY_REQUESTS_MESSAGE};
use tower::ServiceExt;

#[test]
fn test_rate_limiter_allows_within_limit() {
    let limiter = RateLimiter::new(3, Duration::from_secs(1));
    assert!(limiter.try_acquire(&"key"));
    assert!(limiter.try_acquire(&"key"));
    assert!(limiter.try_acquire(&"key"));
}

#[test]
fn test_rate_limiter_blocks_over_limit() {
    let limiter = RateLimiter::new(2, Duration::from_secs(1));
    assert!(limiter.try_acquire(&"key"));
    assert!(limiter.try_acquire(&"key"));
    assert!(!limiter.try_acquire(&"key"));
}

#[test]
fn test_rate_limiter_refills() {
    let limiter = RateLimiter::new(2, Duration::from_millis(100));
    assert!(limiter.try_acquire(&"key"));
    assert!(limiter.try_acquire(&"key"));
    assert!(!limiter.try_acquire(&"key"));
    sleep(Duration::from_millis(110));
    assert!(limiter.try_acquire(&"key"));
}

#[test]
fn test_rate_limiter_independent_keys() {
    let limiter = RateLimiter::new(1, Duration::from_secs(1));
    assert!(limiter.try_acquire(&"a"));
    assert!(!limiter.try_acquire(&"a"));
    assert!(limiter.try_acquire(&"b"));
}

#[test]
fn test_evict_idle_drops_old_buckets() {
    let limiter = RateLimiter::new(1, Duration::from_secs(1));
    limiter.try_acquire(&"a");
    limiter.try_acquire(&"b");
    assert_eq!(limiter.tracked_keys(), 2);
    sleep(Duration::from_millis(20));
    limiter.evict_idle(Duration::from_millis(10));
    assert_eq!(limiter.tracked_keys(), 0);
}

#[test]
fn test_refill_interval() {
    let limiter: RateLimiter<&str> = RateLimiter::new(100, Duration::from_secs(15 * 60));
    assert_eq!(limiter.refill_interval(), Duration::from_secs(9));
}

fn request(forwarded_for: &str) -> Request {
    Request::builder()
        .uri("/")
        .header("x-forwarded-for", forwarded_for)
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn test_middleware_answers_429_after_limit() {
    let router = Router::new().route("/", get(|| async { "ok" }));
    let router = ClientRateLimit::new(2, Duration::from_secs(60)).apply(router);

    for _ in 0..2 {
        let resp = router.clone().oneshot(request("10.0.0.1")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    let resp = router.clone().oneshot(request("10.0.0.1")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(resp.headers()["retry-after"], "30");
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&body[..], TOO_MANY_REQUESTS_MESSAGE.as_bytes());

    let resp = router.oneshot(request("10.0.0.2, 172.16.0.1")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[test]
fn test_idle_buckets_are_swept_while_acquiring() {
    let limiter = RateLimiter::new(1, Duration::from_millis(20)).with_sweep_every(10);
    for key in 0..5 {
        assert!(limiter.try_acquire(&key));
    }
    sleep(Duration::from_millis(30));
    for key in 5..10 {
        assert!(limiter.try_acquire(&key));
    }
    assert_eq!(limiter.tracked_keys(), 5);
}

#[tokio::test]
async fn test_forwarded_for_churn_does_not_grow_unbounded() {
    let rate = ClientRateLimit::new(5, Duration::from_millis(20)).with_sweep_every(100);
    let router = rate.clone().apply(Router::new().route("/", get(|| async { "ok" })));

    for round in 0..10 {
        for i in 0..100 {
            let ip = format!("10.{round}.{}.{}", i / 256, i % 256);
            let resp = router.clone().oneshot(request(&ip)).await.unwrap();
            assert_eq!(resp.status(), StatusCode::OK);
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }

    assert!(rate.limiter().tracked_keys() <= 100);
}
