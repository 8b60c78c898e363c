use axum::body::Body;
use axum::extract::Request;
use axum::routing::get;
use axum::Router;
use nestoi_core::secure_headers::SecureHeaders;
use tower::ServiceExt;

fn header_names(sh: &SecureHeaders) -> Vec<String> {
    sh.headers().iter().map(|(n, _)| n.to_string()).collect()
}

fn get_header_value(sh: &SecureHeaders, name: &str) -> Option<String> {
    sh.headers()
        .iter()
        .find(|(n, _)| n.as_str() == name)
        .map(|(_, v)| v.to_str().unwrap().to_string())
}

#[test]
fn default_headers() {
    let sh = SecureHeaders::default();
    let names = header_names(&sh);
    for expected in [
        "x-content-type-options",
        "x-frame-options",
        "strict-transport-security",
        "x-xss-protection",
        "referrer-policy",
        "x-dns-prefetch-control",
        "x-download-options",
        "x-permitted-cross-domain-policies",
        "cross-origin-opener-policy",
        "origin-agent-cluster",
    ] {
        assert!(names.contains(&expected.to_string()), "missing {expected}");
    }
    assert!(!names.contains(&"content-security-policy".to_string()));
    assert_eq!(get_header_value(&sh, "x-frame-options").as_deref(), Some("SAMEORIGIN"));
    assert_eq!(
        get_header_value(&sh, "strict-transport-security").as_deref(),
        Some("max-age=15552000; includeSubDomains")
    );
}

#[test]
fn builder_custom_csp() {
    let sh = SecureHeaders::builder()
        .content_security_policy("default-src 'self'")
        .build();
    assert_eq!(
        get_header_value(&sh, "content-security-policy"),
        Some("default-src 'self'".to_string())
    );
}

#[test]
fn builder_disable_frame_options() {
    let sh = SecureHeaders::builder().no_frame_options().build();
    assert!(get_header_value(&sh, "x-frame-options").is_none());
}

#[test]
fn builder_hsts_without_subdomains() {
    let sh = SecureHeaders::builder()
        .hsts_max_age(60)
        .hsts_include_subdomains(false)
        .build();
    assert_eq!(
        get_header_value(&sh, "strict-transport-security").as_deref(),
        Some("max-age=60")
    );
}

#[test]
fn builder_disable_all_toggles() {
    let sh = SecureHeaders::builder()
        .content_type_options(false)
        .hsts(false)
        .xss_protection(false)
        .dns_prefetch_control(false)
        .download_options(false)
        .origin_agent_cluster(false)
        .no_frame_options()
        .build();
    let names = header_names(&sh);
    assert_eq!(
        names,
        vec![
            "referrer-policy".to_string(),
            "x-permitted-cross-domain-policies".to_string(),
            "cross-origin-opener-policy".to_string(),
        ]
    );
}

#[tokio::test]
async fn headers_are_added_to_responses() {
    let router = Router::new().route("/", get(|| async { "hi" }));
    let router = SecureHeaders::default().apply(router);

    let resp = router
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.headers()["x-content-type-options"], "nosniff");
    assert_eq!(resp.headers()["referrer-policy"], "no-referrer");
}
