use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::EnvFilter;

/// Install the global `tracing` subscriber with a standard `fmt` layer.
///
/// Respects `RUST_LOG`, falling back to `info,tower_http=debug`. Calling it
/// again after a subscriber is installed does nothing.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// A permissive CORS layer allowing any origin, method and header.
pub fn default_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
}
