use axum::body::Body;
use axum::Router;
use http::Request;
use http_body_util::BodyExt;
use nestoi_core::schema::DescriptorMap;
use nestoi_openapi::{build_spec, openapi_routes, OpenApiConfig};
use serde_json::Value;
use tower::ServiceExt;

// ── Helpers ─────────────────────────────────────────────────────────────────

fn router_for(config: OpenApiConfig) -> Router {
    let spec = build_spec(&config, &[], &[], &DescriptorMap::new());
    openapi_routes(&config, &spec)
}

async fn get_response(router: Router, path: &str) -> (http::StatusCode, String, http::HeaderMap) {
    let req = Request::builder().uri(path).body(Body::empty()).unwrap();

    let response = router.oneshot(req).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let body_str = String::from_utf8(body.to_vec()).unwrap();
    (status, body_str, headers)
}

// ── Routes ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn openapi_json_endpoint() {
    let router = router_for(OpenApiConfig::new("Test API", "1.0.0"));

    let (status, body, headers) = get_response(router, "/api-docs/openapi.json").await;
    assert_eq!(status, http::StatusCode::OK);
    assert_eq!(headers["content-type"], "application/json");
    let spec: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(spec["info"]["title"], "Test API");
}

#[tokio::test]
async fn docs_ui_page() {
    let router = router_for(OpenApiConfig::new("Test API", "1.0.0"));

    let (status, body, headers) = get_response(router, "/api-docs").await;
    assert_eq!(status, http::StatusCode::OK);
    assert!(headers["content-type"].to_str().unwrap().starts_with("text/html"));
    assert!(body.contains("swagger-ui"));
    assert!(body.contains("/api-docs/openapi.json"));
    assert!(body.contains("persistAuthorization: true"));
    assert!(body.contains(r##"dom_id: "#swagger-ui""##));
    assert!(body.trim_end().ends_with("</html>"));
}

#[tokio::test]
async fn docs_ui_page_with_trailing_slash() {
    let router = router_for(OpenApiConfig::new("Test API", "1.0.0"));
    let (status, _, _) = get_response(router, "/api-docs/").await;
    assert_eq!(status, http::StatusCode::OK);
}

#[tokio::test]
async fn docs_ui_title_is_escaped() {
    let router = router_for(OpenApiConfig::new("<Pets & Co>", "1.0.0"));
    let (_, body, _) = get_response(router, "/api-docs").await;
    assert!(body.contains("&lt;Pets &amp; Co&gt;"));
    assert!(!body.contains("<Pets & Co>"));
}

#[tokio::test]
async fn docs_ui_disabled_keeps_json() {
    let router = router_for(OpenApiConfig::new("Test API", "1.0.0").with_docs_ui(false));

    let (status, _, _) = get_response(router.clone(), "/api-docs").await;
    assert_eq!(status, http::StatusCode::NOT_FOUND);

    let (status, _, _) = get_response(router, "/api-docs/openapi.json").await;
    assert_eq!(status, http::StatusCode::OK);
}
