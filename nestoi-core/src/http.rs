//! HTTP types handlers and middlewares are written against.

pub use axum::body::Body;
pub use axum::extract::{ConnectInfo, OriginalUri, Path, Query, Request, State};
pub use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri};
pub use axum::middleware::Next;
pub use axum::response::{Html, IntoResponse, Redirect, Response};
pub use axum::{Json, Router};

/// Escape text for inclusion in HTML element content or attribute values.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}
