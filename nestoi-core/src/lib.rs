pub mod access_log;
pub mod config;
pub mod error;
pub mod extract;
pub mod http;
pub mod layers;
pub mod meta;
pub mod middleware;
pub mod route;
pub mod schema;
pub mod secure_headers;
pub mod security;
pub mod validation;

pub use access_log::{access_log, AccessRecord, LogFormat};
pub use config::{AppSettings, ConfigError, DocsSettings, RateLimit, Settings};
pub use error::NestoiError;
pub use extract::{ExtractedRoutes, RouteExtractor};
pub use layers::{default_cors, init_tracing};
pub use meta::{BodyField, ParamInfo, ParamLocation, RouteInfo, TagInfo};
pub use middleware::{Endpoint, Middleware};
pub use route::{
    embedded_placeholder, transform_path, FieldRef, HttpVerb, RouteHandler, RouteMethod,
    RouteMethods, RouteSchema, RouteTag, SchemaKind,
};
pub use schema::{DescriptorMap, FieldDescriptor, FieldType, SchemaRegistry, ValidationRule};
pub use secure_headers::SecureHeaders;
pub use security::{
    default_security_schemes, resolve_security_schemes, ApiKeyLocation, SecurityScheme,
    SecuritySchemes,
};
pub use validation::{ValidationFailure, DEFAULT_BODY_LIMIT};
