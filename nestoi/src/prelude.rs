//! Everything needed to declare an application with a single `use`.
//!
//! ```ignore
//! use nestoi::prelude::*;
//! ```

pub use crate::{build, extract_app_config, serve, ApiBundle, AppConfig};

pub use nestoi_core::http::{
    Body, HeaderMap, IntoResponse, Json, Next, Path, Query, Request, Response, StatusCode,
};
pub use nestoi_core::{
    init_tracing, ApiKeyLocation, AppSettings, Endpoint, FieldRef, LogFormat, Middleware,
    NestoiError, RouteHandler, RouteMethods, RouteSchema, RouteTag, SecurityScheme,
    ValidationRule,
};
