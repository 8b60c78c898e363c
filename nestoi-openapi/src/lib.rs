mod builder;
mod handlers;

pub use builder::{build_spec, OpenApiConfig};
pub use handlers::{openapi_routes, DOCS_MOUNT, SPEC_PATH};
