use std::sync::Arc;

use axum::response::{Html, IntoResponse};
use axum::routing::get;
use axum::Router;
use nestoi_core::http::escape_html;
use serde_json::Value;

use crate::builder::OpenApiConfig;

/// Where the documentation UI is mounted.
pub const DOCS_MOUNT: &str = "/api-docs";

/// Where the JSON document is served.
pub const SPEC_PATH: &str = "/api-docs/openapi.json";

const SWAGGER_UI_VERSION: &str = "5";

/// Build a router serving the JSON document and, when `config.docs_ui` is set,
/// the Swagger UI page at [`DOCS_MOUNT`].
pub fn openapi_routes(config: &OpenApiConfig, spec: &Value) -> Router {
    let spec_json: Arc<str> = serde_json::to_string_pretty(spec)
        .unwrap_or_else(|_| "{}".to_string())
        .into();

    let mut router = Router::new().route(
        SPEC_PATH,
        get(move || {
            let json = spec_json.clone();
            async move { ([("content-type", "application/json")], json.to_string()).into_response() }
        }),
    );

    if config.docs_ui {
        let page: Arc<str> = swagger_ui_html(&config.title).into();
        let index = get(move || {
            let page = page.clone();
            async move { Html(page.to_string()) }
        });
        router = router
            .route(DOCS_MOUNT, index.clone())
            .route(&format!("{DOCS_MOUNT}/"), index);
    }

    router
}

fn swagger_ui_html(title: &str) -> String {
    format!(
        r##"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <link rel="stylesheet" href="https://unpkg.com/swagger-ui-dist@{version}/swagger-ui.css">
</head>
<body>
    <div id="swagger-ui"></div>
    <script src="https://unpkg.com/swagger-ui-dist@{version}/swagger-ui-bundle.js"></script>
    <script>
        window.onload = () => {{
            window.ui = SwaggerUIBundle({{
                url: "{spec}",
                dom_id: "#swagger-ui",
                persistAuthorization: true,
            }});
        }};
    </script>
</body>
</html>"##,
        title = escape_html(title),
        version = SWAGGER_UI_VERSION,
        spec = SPEC_PATH,
    )
}
