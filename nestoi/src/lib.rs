//! nestoi compiles route tags and field rules into an axum router.
//!
//! Each route is registered with a validation middleware per declared request
//! section, and an OpenAPI document describing the same routes is served at
//! `/api-docs`. The assembled router is wrapped in the usual hardening layers:
//! rate limiting, secure headers, CORS and an access log.
//!
//! ```ignore
//! use nestoi::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), NestoiError> {
//!     init_tracing();
//!     let router = nestoi::build(AppConfig::load("dev")?.route_tags(routes()))?;
//!     nestoi::serve(router, "0.0.0.0:3000").await
//! }
//! ```

mod app;
pub mod prelude;
mod server;

pub use app::{build, extract_app_config, ApiBundle, AppConfig};
pub use server::{serve, serve_with_shutdown};

pub use nestoi_core;
pub use nestoi_openapi;
pub use nestoi_rate_limit;
