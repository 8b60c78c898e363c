use axum::response::Html;
use axum::routing::get;
use axum::Router;
use nestoi_core::http::escape_html;
use nestoi_core::{
    access_log, default_cors, AppSettings, ExtractedRoutes, HttpVerb, LogFormat, Middleware,
    NestoiError, RouteExtractor, RouteTag, SchemaRegistry, SecureHeaders, SecurityScheme,
    Settings, ValidationRule,
};
use nestoi_openapi::{build_spec, openapi_routes, OpenApiConfig, DOCS_MOUNT, SPEC_PATH};
use nestoi_rate_limit::ClientRateLimit;
use serde_json::Value;
use tracing::{info, warn};

/// Everything an application is assembled from.
///
/// Settings can come from code, from [`AppSettings`] (YAML, `.env` and
/// environment), or both: builder calls override whatever was loaded.
///
/// ```ignore
/// let app = AppConfig::new()
///     .title("Pet store")
///     .field("name", ValidationRule::string().min(1).example("Rex"))
///     .route_tag(
///         RouteTag::new("pets", "Pet operations").route(
///             "/pets",
///             RouteMethods::new().post(
///                 RouteHandler::new()
///                     .schema(RouteSchema::new().body(["*name"]))
///                     .handler(Endpoint::new(create_pet)),
///             ),
///         ),
///     );
/// let router = nestoi::build(app)?;
/// ```
#[derive(Default)]
pub struct AppConfig {
    settings: AppSettings,
    fields: Vec<(String, ValidationRule)>,
    route_tags: Vec<RouteTag>,
    middlewares: Vec<Middleware>,
}

impl AppConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from settings loaded elsewhere. Field rules declared under
    /// `fields:` are registered before the ones added in code.
    pub fn from_settings(settings: AppSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    /// Load `application.yaml`, the profile file, `.env` files and the
    /// `NESTOI__` environment overlay from the working directory.
    pub fn load(profile: &str) -> Result<Self, NestoiError> {
        Ok(Self::from_settings(AppSettings::load(profile)?))
    }

    pub fn settings(&self) -> &AppSettings {
        &self.settings
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.settings.title = Some(title.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.settings.description = Some(description.into());
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.settings.version = Some(version.into());
        self
    }

    /// Serve every generated route under `prefix`. Docs and the landing page
    /// stay at the root.
    pub fn route_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.settings.route_prefix = Some(prefix.into());
        self
    }

    /// Allow `limit` requests per client every `window_minutes`.
    pub fn rate_limit(mut self, limit: u32, window_minutes: u64) -> Self {
        let rate_limit = self.settings.rate_limit.get_or_insert_with(Default::default);
        rate_limit.limit = Some(limit);
        rate_limit.window_minutes = Some(window_minutes);
        self
    }

    pub fn log_format(mut self, format: LogFormat) -> Self {
        self.settings.log_format = Some(format);
        self
    }

    pub fn body_limit(mut self, bytes: usize) -> Self {
        self.settings.body_limit = Some(bytes);
        self
    }

    /// Do not mount the documentation UI nor the JSON document.
    pub fn disable_docs(mut self) -> Self {
        self.settings.swagger.get_or_insert_with(Default::default).disabled = Some(true);
        self
    }

    pub fn server(mut self, url: impl Into<String>) -> Self {
        self.settings
            .swagger
            .get_or_insert_with(Default::default)
            .servers
            .push(url.into());
        self
    }

    pub fn openapi_version(mut self, version: impl Into<String>) -> Self {
        self.settings
            .swagger
            .get_or_insert_with(Default::default)
            .openapi_version = Some(version.into());
        self
    }

    /// Add a security scheme. The first one added replaces the default
    /// `bearerAuth` scheme.
    pub fn security_scheme(mut self, name: impl Into<String>, scheme: SecurityScheme) -> Self {
        self.settings
            .swagger
            .get_or_insert_with(Default::default)
            .security_schemes
            .get_or_insert_with(Default::default)
            .insert(name.into(), scheme);
        self
    }

    /// Register a validation rule for a field name. Names are global: the
    /// same rule is used wherever a route lists the field.
    pub fn field(mut self, name: impl Into<String>, rule: impl Into<ValidationRule>) -> Self {
        self.fields.push((name.into(), rule.into()));
        self
    }

    pub fn route_tag(mut self, tag: RouteTag) -> Self {
        self.route_tags.push(tag);
        self
    }

    pub fn route_tags(mut self, tags: impl IntoIterator<Item = RouteTag>) -> Self {
        self.route_tags.extend(tags);
        self
    }

    /// Add an application-wide middleware. Middlewares run in the order they
    /// were added, after the access log and before any route.
    pub fn middleware(mut self, middleware: Middleware) -> Self {
        self.middlewares.push(middleware);
        self
    }

    fn registry(&self) -> Result<SchemaRegistry, NestoiError> {
        let mut registry = SchemaRegistry::new();
        for (name, schema) in &self.settings.fields {
            registry.register(name.as_str(), schema.clone())?;
        }
        for (name, rule) in &self.fields {
            registry.register(name.as_str(), rule.clone())?;
        }
        Ok(registry)
    }
}

/// The generated document and router, before hardening layers are applied.
#[derive(Debug)]
pub struct ApiBundle {
    /// The OpenAPI document.
    pub api_docs: Value,
    pub openapi: OpenApiConfig,
    pub routes: ExtractedRoutes,
    pub settings: Settings,
}

/// Resolve settings, register field rules and walk the route tags.
///
/// # Errors
///
/// Any rule that fails to compile, a field registered twice with different
/// rules, or a route whose composite rule is rejected by the validation
/// engine.
pub fn extract_app_config(config: &AppConfig) -> Result<ApiBundle, NestoiError> {
    let settings = config.settings.resolve();
    let registry = config.registry()?;
    let descriptors = registry.describe();

    let mut openapi = OpenApiConfig::from_settings(&settings);
    if let Some(prefix) = &settings.route_prefix {
        if openapi.servers.is_empty() {
            openapi.servers.push(prefix.clone());
        }
    }

    let routes = RouteExtractor::new(&registry, &descriptors)
        .security(openapi.security_names())
        .body_limit(settings.body_limit)
        .extract(&config.route_tags)?;

    let api_docs = build_spec(&openapi, &routes.tags, &routes.routes, &descriptors);

    Ok(ApiBundle {
        api_docs,
        openapi,
        routes,
        settings,
    })
}

/// Assemble the application router.
///
/// Layers, outermost first: rate limiter, secure headers, CORS, access log,
/// application middlewares. Inside them sit the documentation routes, the
/// generated routes (nested under the prefix when one is set) and the landing
/// page at `GET /`.
pub fn build(config: AppConfig) -> Result<Router, NestoiError> {
    let ApiBundle {
        api_docs,
        openapi,
        routes,
        settings,
    } = extract_app_config(&config)?;

    let unprefixed = settings.route_prefix.is_none();
    let owns = |path: &str| unprefixed && routes.handles(path, HttpVerb::Get);
    let owns_root = owns("/");
    let docs_taken = [DOCS_MOUNT, SPEC_PATH, "/api-docs/"].into_iter().any(owns);
    let route_count = routes.routes.len();
    let tag_count = routes.tags.len();

    let mut app = Router::new();
    if settings.docs.enabled {
        if docs_taken {
            warn!("a generated route is served under {DOCS_MOUNT}, documentation is not mounted");
        } else {
            app = app.merge(openapi_routes(&openapi, &api_docs));
        }
    }

    app = match &settings.route_prefix {
        Some(prefix) => app.nest(prefix, routes.router),
        None => app.merge(routes.router),
    };

    if !owns_root {
        let page = landing_page(&settings.title);
        app = app.route(
            "/",
            get(move || {
                let page = page.clone();
                async move { Html(page) }
            }),
        );
    }

    for middleware in config.middlewares.iter().rev() {
        app = middleware.layer(app);
    }
    app = access_log(settings.log_format).layer(app);
    app = app.layer(default_cors());
    app = SecureHeaders::default().apply(app);
    app = ClientRateLimit::from_settings(&settings.rate_limit).apply(app);

    info!(
        title = %settings.title,
        routes = route_count,
        tags = tag_count,
        prefix = settings.route_prefix.as_deref().unwrap_or("/"),
        docs = settings.docs.enabled && !docs_taken,
        rate_limit = settings.rate_limit.limit,
        "application assembled"
    );

    Ok(app)
}

fn landing_page(title: &str) -> String {
    format!(
        "<center><br /><h1>Welcome to {}</h1><a href=\"{DOCS_MOUNT}\"><h2>Swagger API Docs</h2></a></center>",
        escape_html(title)
    )
}
