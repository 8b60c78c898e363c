use std::net::SocketAddr;

use bytes::Bytes;
use http::header::{HeaderMap, HeaderName, IntoHeaderName, AUTHORIZATION, CONTENT_TYPE};
use http::{Method, Request, StatusCode};
use http_body_util::BodyExt;
use nestoi_core::http::{Body, ConnectInfo, Router};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tower::util::ServiceExt;

use crate::json_path::resolve_path;

/// In-process HTTP client over an assembled `Router`.
///
/// Requests are dispatched with `oneshot`, no socket is bound.
pub struct TestApp {
    router: Router,
}

impl TestApp {
    pub fn new(router: Router) -> Self {
        Self { router }
    }

    /// Build from the result of an application build, panicking on failure.
    pub fn try_from_build<E: std::fmt::Display>(built: Result<Router, E>) -> Self {
        match built {
            Ok(router) => Self::new(router),
            Err(e) => panic!("application failed to build: {e}"),
        }
    }

    pub fn get(&self, path: &str) -> TestRequest<'_> {
        TestRequest::new(self, Method::GET, path)
    }

    pub fn post(&self, path: &str) -> TestRequest<'_> {
        TestRequest::new(self, Method::POST, path)
    }

    pub fn put(&self, path: &str) -> TestRequest<'_> {
        TestRequest::new(self, Method::PUT, path)
    }

    pub fn patch(&self, path: &str) -> TestRequest<'_> {
        TestRequest::new(self, Method::PATCH, path)
    }

    pub fn delete(&self, path: &str) -> TestRequest<'_> {
        TestRequest::new(self, Method::DELETE, path)
    }

    pub fn request(&self, method: Method, path: &str) -> TestRequest<'_> {
        TestRequest::new(self, method, path)
    }
}

/// Builder for one request sent through a [`TestApp`].
pub struct TestRequest<'a> {
    app: &'a TestApp,
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    headers: HeaderMap,
    body: Option<Vec<u8>>,
    remote_addr: Option<SocketAddr>,
}

impl<'a> TestRequest<'a> {
    fn new(app: &'a TestApp, method: Method, path: &str) -> Self {
        Self {
            app,
            method,
            path: path.to_string(),
            query: Vec::new(),
            headers: HeaderMap::new(),
            body: None,
            remote_addr: None,
        }
    }

    pub fn bearer(mut self, token: &str) -> Self {
        self.headers
            .insert(AUTHORIZATION, format!("Bearer {token}").parse().unwrap());
        self
    }

    pub fn header(mut self, name: impl IntoHeaderName, value: impl AsRef<str>) -> Self {
        self.headers.insert(name, value.as_ref().parse().unwrap());
        self
    }

    /// Append a query pair. Repeating a key sends it several times.
    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    /// Set a JSON body and `Content-Type: application/json`.
    pub fn json(mut self, body: &impl Serialize) -> Self {
        self.body = Some(serde_json::to_vec(body).unwrap());
        self.headers
            .insert(CONTENT_TYPE, "application/json".parse().unwrap());
        self
    }

    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Pretend the request came from `addr`, as a served app would see it.
    pub fn remote_addr(mut self, addr: SocketAddr) -> Self {
        self.remote_addr = Some(addr);
        self
    }

    fn uri(&self) -> String {
        if self.query.is_empty() {
            return self.path.clone();
        }
        let query = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.query.iter())
            .finish();
        let sep = if self.path.contains('?') { '&' } else { '?' };
        format!("{}{sep}{query}", self.path)
    }

    pub async fn send(self) -> TestResponse {
        let mut builder = Request::builder().method(self.method.clone()).uri(self.uri());
        for (name, value) in &self.headers {
            builder = builder.header(name, value);
        }
        let body = self.body.map(Body::from).unwrap_or_else(Body::empty);
        let mut request = builder.body(body).unwrap();
        if let Some(addr) = self.remote_addr {
            request.extensions_mut().insert(ConnectInfo(addr));
        }

        let response = self
            .app
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .into_body()
            .collect()
            .await
            .expect("failed to read response body")
            .to_bytes();

        TestResponse {
            status,
            headers,
            body,
        }
    }
}

/// Buffered response with chainable assertions.
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TestResponse {
    pub fn assert_ok(self) -> Self {
        self.assert_status(StatusCode::OK)
    }

    pub fn assert_created(self) -> Self {
        self.assert_status(StatusCode::CREATED)
    }

    pub fn assert_bad_request(self) -> Self {
        self.assert_status(StatusCode::BAD_REQUEST)
    }

    pub fn assert_not_found(self) -> Self {
        self.assert_status(StatusCode::NOT_FOUND)
    }

    pub fn assert_payload_too_large(self) -> Self {
        self.assert_status(StatusCode::PAYLOAD_TOO_LARGE)
    }

    pub fn assert_too_many_requests(self) -> Self {
        self.assert_status(StatusCode::TOO_MANY_REQUESTS)
    }

    pub fn assert_status(self, expected: StatusCode) -> Self {
        assert_eq!(
            self.status,
            expected,
            "Expected {expected}, got {}\nBody: {}",
            self.status,
            self.text()
        );
        self
    }

    /// Assert a `400` carrying the `{"success": 0, "msg": ...}` envelope.
    pub fn assert_validation_error(self, msg: &str) -> Self {
        self.assert_bad_request()
            .assert_json_path("success", 0)
            .assert_json_path("msg", msg)
    }

    /// Assert a `400` envelope whose message contains `fragment`.
    pub fn assert_validation_error_contains(self, fragment: &str) -> Self {
        let resp = self.assert_bad_request().assert_json_path("success", 0);
        let msg: String = resp.json_path("msg");
        assert!(
            msg.contains(fragment),
            "validation message {msg:?} does not contain {fragment:?}"
        );
        resp
    }

    /// Assert that `path` (see [`resolve_path`]) resolves to `expected`.
    pub fn assert_json_path(self, path: &str, expected: impl Into<Value>) -> Self {
        let root: Value = self.json();
        let actual = resolve_path(&root, path);
        let expected = expected.into();
        assert_eq!(
            actual, expected,
            "JSON path \"{path}\" assertion failed\n  Expected: {expected}\n  Actual:   {actual}\n  Body: {root}",
        );
        self
    }

    pub fn assert_json_path_fn(self, path: &str, predicate: impl FnOnce(&Value) -> bool) -> Self {
        let root: Value = self.json();
        let actual = resolve_path(&root, path);
        assert!(
            predicate(&actual),
            "JSON path \"{path}\" predicate failed\n  Value: {actual}\n  Body: {root}",
        );
        self
    }

    pub fn assert_header(self, name: &str, expected: &str) -> Self {
        assert_eq!(
            self.header(name),
            Some(expected),
            "header {name} mismatch, headers: {:?}",
            self.headers
        );
        self
    }

    pub fn json_path<T: DeserializeOwned>(&self, path: &str) -> T {
        let root: Value = self.json();
        let value = resolve_path(&root, path);
        serde_json::from_value(value.clone()).unwrap_or_else(|e| {
            panic!("Failed to deserialize JSON path \"{path}\": {e}\n  Value: {value}\n  Body: {root}")
        })
    }

    pub fn header(&self, name: impl AsRef<str>) -> Option<&str> {
        let name: HeaderName = name.as_ref().parse().ok()?;
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn json<T: DeserializeOwned>(&self) -> T {
        serde_json::from_slice(&self.body)
            .unwrap_or_else(|e| panic!("Failed to parse JSON: {e}\nBody: {}", self.text()))
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }
}
