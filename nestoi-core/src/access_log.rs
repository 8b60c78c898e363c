//! One-line-per-request access logging in the classic log layouts.
//!
//! | Format | Layout |
//! |--------|--------|
//! | `combined` | `addr - - [date] "METHOD url HTTP/v" status length "referrer" "user-agent"` |
//! | `common` | `addr - - [date] "METHOD url HTTP/v" status length` |
//! | `dev` | `METHOD url status time ms - length` |
//! | `short` | `addr - METHOD url HTTP/v status length - time ms` |
//! | `tiny` | `METHOD url status length - time ms` |
//!
//! Lines are emitted at `INFO` under the `nestoi::access` target.

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use axum::extract::{ConnectInfo, Request};
use axum::http::{header, HeaderMap, Version};
use axum::middleware::Next;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::middleware::Middleware;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Combined,
    Common,
    Dev,
    Short,
    Tiny,
}

/// What is known about a request once its response is ready.
#[derive(Debug, Clone)]
pub struct AccessRecord {
    pub remote_addr: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub method: String,
    pub url: String,
    pub http_version: &'static str,
    pub status: u16,
    pub content_length: Option<String>,
    pub referrer: Option<String>,
    pub user_agent: Option<String>,
    pub response_time: Duration,
}

impl AccessRecord {
    pub fn format(&self, format: LogFormat) -> String {
        let addr = or_dash(self.remote_addr.as_deref());
        let length = or_dash(self.content_length.as_deref());
        let millis = self.response_time.as_secs_f64() * 1000.0;

        match format {
            LogFormat::Combined => format!(
                "{} - - [{}] \"{} {} HTTP/{}\" {} {} \"{}\" \"{}\"",
                addr,
                self.timestamp.format("%d/%b/%Y:%H:%M:%S %z"),
                self.method,
                self.url,
                self.http_version,
                self.status,
                length,
                or_dash(self.referrer.as_deref()),
                or_dash(self.user_agent.as_deref()),
            ),
            LogFormat::Common => format!(
                "{} - - [{}] \"{} {} HTTP/{}\" {} {}",
                addr,
                self.timestamp.format("%d/%b/%Y:%H:%M:%S %z"),
                self.method,
                self.url,
                self.http_version,
                self.status,
                length,
            ),
            LogFormat::Dev => format!(
                "{} {} {} {millis:.3} ms - {length}",
                self.method, self.url, self.status
            ),
            LogFormat::Short => format!(
                "{addr} - {} {} HTTP/{} {} {length} - {millis:.3} ms",
                self.method, self.url, self.http_version, self.status
            ),
            LogFormat::Tiny => format!(
                "{} {} {} {length} - {millis:.3} ms",
                self.method, self.url, self.status
            ),
        }
    }
}

fn or_dash(value: Option<&str>) -> &str {
    value.unwrap_or("-")
}

fn header_str(headers: &HeaderMap, name: header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

fn version_str(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "0.9",
        Version::HTTP_10 => "1.0",
        Version::HTTP_2 => "2.0",
        Version::HTTP_3 => "3.0",
        _ => "1.1",
    }
}

/// Middleware logging every request in `format`.
///
/// The client address is read from `ConnectInfo<SocketAddr>`, which is present
/// when the server is started with connect info.
pub fn access_log(format: LogFormat) -> Middleware {
    Middleware::from_fn(move |req: Request, next: Next| async move {
        let start = Instant::now();
        let timestamp = Utc::now();
        let remote_addr = req
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string());
        let method = req.method().to_string();
        let url = req
            .uri()
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| req.uri().path().to_string());
        let http_version = version_str(req.version());
        let referrer = header_str(req.headers(), header::REFERER);
        let user_agent = header_str(req.headers(), header::USER_AGENT);

        let response = next.run(req).await;

        let record = AccessRecord {
            remote_addr,
            timestamp,
            method,
            url,
            http_version,
            status: response.status().as_u16(),
            content_length: header_str(response.headers(), header::CONTENT_LENGTH),
            referrer,
            user_agent,
            response_time: start.elapsed(),
        };
        tracing::info!(target: "nestoi::access", "{}", record.format(format));
        response
    })
}
