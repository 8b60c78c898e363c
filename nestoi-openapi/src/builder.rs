use nestoi_core::meta::{BodyField, ParamInfo, RouteInfo, TagInfo};
use nestoi_core::schema::DescriptorMap;
use nestoi_core::security::{default_security_schemes, resolve_security_schemes, SecurityScheme, SecuritySchemes};
use nestoi_core::Settings;
use serde_json::{json, Map, Value};

/// Configuration for the generated OpenAPI document.
#[derive(Debug, Clone)]
pub struct OpenApiConfig {
    pub title: String,
    pub version: String,
    pub description: Option<String>,
    pub openapi_version: String,
    pub servers: Vec<String>,
    pub security_schemes: SecuritySchemes,
    pub docs_ui: bool,
}

impl OpenApiConfig {
    pub fn new(title: &str, version: &str) -> Self {
        Self {
            title: title.to_string(),
            version: version.to_string(),
            description: None,
            openapi_version: nestoi_core::config::DEFAULT_OPENAPI_VERSION.to_string(),
            servers: Vec::new(),
            security_schemes: default_security_schemes(),
            docs_ui: true,
        }
    }

    /// Document configuration taken from resolved application settings.
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            title: settings.title.clone(),
            version: settings.version.clone(),
            description: settings.description.clone(),
            openapi_version: settings.docs.openapi_version.clone(),
            servers: settings.docs.servers.clone(),
            security_schemes: settings.docs.security_schemes.clone(),
            docs_ui: settings.docs.enabled,
        }
    }

    pub fn with_description(mut self, desc: &str) -> Self {
        self.description = Some(desc.to_string());
        self
    }

    pub fn with_openapi_version(mut self, version: &str) -> Self {
        self.openapi_version = version.to_string();
        self
    }

    pub fn with_server(mut self, url: &str) -> Self {
        self.servers.push(url.to_string());
        self
    }

    /// Replace the documented schemes. An empty map restores the `bearerAuth` default.
    pub fn with_security_schemes(mut self, schemes: SecuritySchemes) -> Self {
        self.security_schemes = resolve_security_schemes(Some(&schemes));
        self
    }

    /// Replace the documented schemes with a single named scheme.
    pub fn with_security_scheme(mut self, name: &str, scheme: SecurityScheme) -> Self {
        let mut schemes = SecuritySchemes::new();
        schemes.insert(name.to_string(), scheme);
        self.security_schemes = schemes;
        self
    }

    pub fn with_docs_ui(mut self, enabled: bool) -> Self {
        self.docs_ui = enabled;
        self
    }

    /// Scheme names in document order.
    pub fn security_names(&self) -> Vec<String> {
        self.security_schemes.keys().cloned().collect()
    }
}

fn parameter(param: &ParamInfo) -> Value {
    let mut schema = Map::new();
    schema.insert("type".into(), json!(param.descriptor.field_type));
    if let Some(ref example) = param.descriptor.example {
        schema.insert("example".into(), example.clone());
    }

    let mut out = Map::new();
    out.insert("name".into(), json!(param.name));
    out.insert("in".into(), json!(param.location.as_str()));
    out.insert("required".into(), json!(param.required));
    out.insert("explode".into(), json!(true));
    if let Some(ref description) = param.descriptor.description {
        out.insert("description".into(), json!(description));
    }
    out.insert("schema".into(), Value::Object(schema));
    Value::Object(out)
}

fn request_body(fields: &[BodyField]) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();
    for field in fields {
        let mut property = Map::new();
        property.insert("type".into(), json!(field.descriptor.field_type));
        if let Some(ref example) = field.descriptor.example {
            property.insert("example".into(), example.clone());
        }
        properties.insert(field.name.clone(), Value::Object(property));
        if field.required {
            required.push(field.name.clone());
        }
    }

    let mut schema = json!({ "type": "object", "properties": properties });
    if !required.is_empty() {
        schema["required"] = json!(required);
    }

    json!({
        "content": {
            "application/json": { "schema": schema }
        },
        "required": true
    })
}

fn operation(route: &RouteInfo) -> Value {
    let mut op = Map::new();
    op.insert("tags".into(), json!([route.tag]));
    if let Some(ref summary) = route.summary {
        op.insert("summary".into(), json!(summary));
    }
    op.insert(
        "parameters".into(),
        Value::Array(route.params.iter().map(parameter).collect()),
    );
    if let Some(ref body) = route.request_body {
        op.insert("requestBody".into(), request_body(body));
    }
    op.insert(
        "responses".into(),
        json!({
            "400": { "description": "Validation or execution failed" },
            "401": { "description": "Unauthorized" }
        }),
    );
    let security: Vec<Value> = route
        .security
        .iter()
        .map(|name| {
            let mut requirement = Map::new();
            requirement.insert(name.clone(), json!([]));
            Value::Object(requirement)
        })
        .collect();
    op.insert("security".into(), Value::Array(security));
    Value::Object(op)
}

/// Build the OpenAPI JSON document from config and extracted route metadata.
///
/// `paths` are keyed by the declared path (with `{name}` placeholders), then by
/// method key. `components.schemas` holds the field descriptors.
pub fn build_spec(
    config: &OpenApiConfig,
    tags: &[TagInfo],
    routes: &[RouteInfo],
    descriptors: &DescriptorMap,
) -> Value {
    let mut paths: Map<String, Value> = Map::new();
    for route in routes {
        let entry = paths
            .entry(route.path.clone())
            .or_insert_with(|| json!({}));
        if let Some(obj) = entry.as_object_mut() {
            obj.insert(route.method.clone(), operation(route));
        }
    }

    let mut info: Map<String, Value> = Map::new();
    info.insert("title".into(), json!(config.title));
    if let Some(ref desc) = config.description {
        info.insert("description".into(), json!(desc));
    }
    info.insert("version".into(), json!(config.version));

    let servers: Vec<Value> = config
        .servers
        .iter()
        .map(|url| json!({ "url": url }))
        .collect();

    json!({
        "openapi": config.openapi_version,
        "info": info,
        "servers": servers,
        "tags": tags,
        "paths": paths,
        "components": {
            "schemas": descriptors,
            "securitySchemes": config.security_schemes,
        }
    })
}
