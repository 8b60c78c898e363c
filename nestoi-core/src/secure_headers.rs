//! Hardening response headers applied to every response.
//!
//! # Default headers
//!
//! | Header | Value |
//! |--------|-------|
//! | `X-Content-Type-Options` | `nosniff` |
//! | `X-Frame-Options` | `SAMEORIGIN` |
//! | `Strict-Transport-Security` | `max-age=15552000; includeSubDomains` |
//! | `X-XSS-Protection` | `0` |
//! | `Referrer-Policy` | `no-referrer` |
//! | `X-DNS-Prefetch-Control` | `off` |
//! | `X-Download-Options` | `noopen` |
//! | `X-Permitted-Cross-Domain-Policies` | `none` |
//! | `Cross-Origin-Opener-Policy` | `same-origin` |
//! | `Origin-Agent-Cluster` | `?1` |
//!
//! No `Content-Security-Policy` is sent by default: the documentation page
//! loads its assets from a CDN.
//!
//! # Usage
//!
//! ```ignore
//! let router = SecureHeaders::default().apply(router);
//!
//! let router = SecureHeaders::builder()
//!     .frame_options("DENY")
//!     .content_security_policy("default-src 'self'")
//!     .build()
//!     .apply(router);
//! ```

use std::sync::Arc;

use axum::extract::Request;
use axum::http::{HeaderName, HeaderValue};
use axum::middleware::Next;
use axum::response::Response;
use axum::Router;

/// A fixed set of headers inserted into every response.
#[derive(Debug, Clone)]
pub struct SecureHeaders {
    headers: Vec<(HeaderName, HeaderValue)>,
}

impl SecureHeaders {
    pub fn builder() -> SecureHeadersBuilder {
        SecureHeadersBuilder::new()
    }

    pub fn headers(&self) -> &[(HeaderName, HeaderValue)] {
        &self.headers
    }

    /// Wrap `router` so every response carries these headers. Headers already
    /// set by an inner stage are overwritten.
    pub fn apply(self, router: Router) -> Router {
        let headers = Arc::new(self.headers);
        router.layer(axum::middleware::from_fn(move |req: Request, next: Next| {
            let headers = headers.clone();
            async move {
                let mut response: Response = next.run(req).await;
                for (name, value) in headers.iter() {
                    response.headers_mut().insert(name.clone(), value.clone());
                }
                response
            }
        }))
    }
}

impl Default for SecureHeaders {
    fn default() -> Self {
        SecureHeadersBuilder::new().build()
    }
}

/// Builder for [`SecureHeaders`].
pub struct SecureHeadersBuilder {
    content_type_options: bool,
    frame_options: Option<String>,
    hsts: bool,
    hsts_max_age: u64,
    hsts_include_subdomains: bool,
    xss_protection: bool,
    referrer_policy: Option<String>,
    dns_prefetch_control: bool,
    download_options: bool,
    cross_domain_policies: Option<String>,
    cross_origin_opener_policy: Option<String>,
    origin_agent_cluster: bool,
    content_security_policy: Option<String>,
}

impl SecureHeadersBuilder {
    fn new() -> Self {
        Self {
            content_type_options: true,
            frame_options: Some("SAMEORIGIN".to_string()),
            hsts: true,
            hsts_max_age: 15552000,
            hsts_include_subdomains: true,
            xss_protection: true,
            referrer_policy: Some("no-referrer".to_string()),
            dns_prefetch_control: true,
            download_options: true,
            cross_domain_policies: Some("none".to_string()),
            cross_origin_opener_policy: Some("same-origin".to_string()),
            origin_agent_cluster: true,
            content_security_policy: None,
        }
    }

    pub fn content_type_options(mut self, enabled: bool) -> Self {
        self.content_type_options = enabled;
        self
    }

    /// Set the `X-Frame-Options` value (e.g. `"DENY"`, `"SAMEORIGIN"`).
    pub fn frame_options(mut self, value: impl Into<String>) -> Self {
        self.frame_options = Some(value.into());
        self
    }

    pub fn no_frame_options(mut self) -> Self {
        self.frame_options = None;
        self
    }

    pub fn hsts(mut self, enabled: bool) -> Self {
        self.hsts = enabled;
        self
    }

    /// `max-age` of `Strict-Transport-Security`, in seconds.
    pub fn hsts_max_age(mut self, seconds: u64) -> Self {
        self.hsts_max_age = seconds;
        self
    }

    pub fn hsts_include_subdomains(mut self, include: bool) -> Self {
        self.hsts_include_subdomains = include;
        self
    }

    pub fn xss_protection(mut self, enabled: bool) -> Self {
        self.xss_protection = enabled;
        self
    }

    pub fn referrer_policy(mut self, value: impl Into<String>) -> Self {
        self.referrer_policy = Some(value.into());
        self
    }

    pub fn dns_prefetch_control(mut self, enabled: bool) -> Self {
        self.dns_prefetch_control = enabled;
        self
    }

    pub fn download_options(mut self, enabled: bool) -> Self {
        self.download_options = enabled;
        self
    }

    pub fn cross_domain_policies(mut self, value: impl Into<String>) -> Self {
        self.cross_domain_policies = Some(value.into());
        self
    }

    pub fn cross_origin_opener_policy(mut self, value: impl Into<String>) -> Self {
        self.cross_origin_opener_policy = Some(value.into());
        self
    }

    pub fn origin_agent_cluster(mut self, enabled: bool) -> Self {
        self.origin_agent_cluster = enabled;
        self
    }

    pub fn content_security_policy(mut self, value: impl Into<String>) -> Self {
        self.content_security_policy = Some(value.into());
        self
    }

    pub fn build(self) -> SecureHeaders {
        let mut headers = Vec::new();
        let mut push = |name: &'static str, value: &str| {
            if let Ok(value) = HeaderValue::from_str(value) {
                headers.push((HeaderName::from_static(name), value));
            }
        };

        if self.content_type_options {
            push("x-content-type-options", "nosniff");
        }
        if let Some(ref value) = self.frame_options {
            push("x-frame-options", value);
        }
        if self.hsts {
            let value = if self.hsts_include_subdomains {
                format!("max-age={}; includeSubDomains", self.hsts_max_age)
            } else {
                format!("max-age={}", self.hsts_max_age)
            };
            push("strict-transport-security", &value);
        }
        if self.xss_protection {
            push("x-xss-protection", "0");
        }
        if let Some(ref value) = self.referrer_policy {
            push("referrer-policy", value);
        }
        if self.dns_prefetch_control {
            push("x-dns-prefetch-control", "off");
        }
        if self.download_options {
            push("x-download-options", "noopen");
        }
        if let Some(ref value) = self.cross_domain_policies {
            push("x-permitted-cross-domain-policies", value);
        }
        if let Some(ref value) = self.cross_origin_opener_policy {
            push("cross-origin-opener-policy", value);
        }
        if self.origin_agent_cluster {
            push("origin-agent-cluster", "?1");
        }
        if let Some(ref value) = self.content_security_policy {
            push("content-security-policy", value);
        }

        SecureHeaders { headers }
    }
}
