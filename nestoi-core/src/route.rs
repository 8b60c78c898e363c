//! Declarative route model: tags, paths, method entries and their field lists.

use axum::routing::MethodFilter;

use crate::middleware::{Endpoint, Middleware};

/// Marker accepted in string field references to flag a field as required.
pub const REQUIRED_MARKER: char = '*';

/// A reference to a registered field from a route's body, query or params list.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldRef {
    name: String,
    required: bool,
}

impl FieldRef {
    pub fn required(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: true,
        }
    }

    pub fn optional(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: false,
        }
    }

    /// Parse the marker form: a `*` anywhere in `raw` makes the field required,
    /// and every `*` is removed from the resulting name.
    pub fn parse(raw: &str) -> Self {
        let required = raw.contains(REQUIRED_MARKER);
        let name: String = raw.chars().filter(|c| *c != REQUIRED_MARKER).collect();
        Self { name, required }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_required(&self) -> bool {
        self.required
    }
}

impl From<&str> for FieldRef {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}

impl From<String> for FieldRef {
    fn from(raw: String) -> Self {
        Self::parse(&raw)
    }
}

/// The three request sections a route can declare fields for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaKind {
    Body,
    Query,
    Params,
}

impl SchemaKind {
    /// Processing order for a route's field lists.
    pub const ORDER: [SchemaKind; 3] = [SchemaKind::Body, SchemaKind::Query, SchemaKind::Params];
}

/// Field lists declared for one route.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteSchema {
    pub body: Option<Vec<FieldRef>>,
    pub query: Option<Vec<FieldRef>>,
    pub params: Option<Vec<FieldRef>>,
}

impl RouteSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn body<I, F>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: Into<FieldRef>,
    {
        self.body = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    pub fn query<I, F>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: Into<FieldRef>,
    {
        self.query = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    pub fn params<I, F>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: Into<FieldRef>,
    {
        self.params = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    pub fn fields(&self, kind: SchemaKind) -> Option<&[FieldRef]> {
        match kind {
            SchemaKind::Body => self.body.as_deref(),
            SchemaKind::Query => self.query.as_deref(),
            SchemaKind::Params => self.params.as_deref(),
        }
    }
}

/// HTTP verbs a route can be registered on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpVerb {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Head,
    Options,
    Trace,
}

const VERBS: [(&str, HttpVerb); 8] = [
    ("get", HttpVerb::Get),
    ("post", HttpVerb::Post),
    ("put", HttpVerb::Put),
    ("delete", HttpVerb::Delete),
    ("patch", HttpVerb::Patch),
    ("head", HttpVerb::Head),
    ("options", HttpVerb::Options),
    ("trace", HttpVerb::Trace),
];

impl HttpVerb {
    pub fn lookup(key: &str) -> Option<Self> {
        VERBS
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(key))
            .map(|(_, verb)| *verb)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            HttpVerb::Get => "get",
            HttpVerb::Post => "post",
            HttpVerb::Put => "put",
            HttpVerb::Delete => "delete",
            HttpVerb::Patch => "patch",
            HttpVerb::Head => "head",
            HttpVerb::Options => "options",
            HttpVerb::Trace => "trace",
        }
    }

    pub fn method_filter(self) -> MethodFilter {
        match self {
            HttpVerb::Get => MethodFilter::GET,
            HttpVerb::Post => MethodFilter::POST,
            HttpVerb::Put => MethodFilter::PUT,
            HttpVerb::Delete => MethodFilter::DELETE,
            HttpVerb::Patch => MethodFilter::PATCH,
            HttpVerb::Head => MethodFilter::HEAD,
            HttpVerb::Options => MethodFilter::OPTIONS,
            HttpVerb::Trace => MethodFilter::TRACE,
        }
    }
}

/// The method key a route entry was declared under.
///
/// Keys that are not a known verb are kept as [`RouteMethod::Custom`]; they are
/// documented under their own key and served on GET.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RouteMethod {
    Known(HttpVerb),
    Custom(String),
}

impl RouteMethod {
    pub fn from_key(key: &str) -> Self {
        match HttpVerb::lookup(key) {
            Some(verb) => RouteMethod::Known(verb),
            None => RouteMethod::Custom(key.to_string()),
        }
    }

    /// The key used in the documented `paths` object.
    pub fn key(&self) -> &str {
        match self {
            RouteMethod::Known(verb) => verb.as_str(),
            RouteMethod::Custom(key) => key,
        }
    }

    /// The verb the route is served on.
    pub fn verb(&self) -> HttpVerb {
        match self {
            RouteMethod::Known(verb) => *verb,
            RouteMethod::Custom(_) => HttpVerb::Get,
        }
    }
}

impl From<HttpVerb> for RouteMethod {
    fn from(verb: HttpVerb) -> Self {
        RouteMethod::Known(verb)
    }
}

impl From<&str> for RouteMethod {
    fn from(key: &str) -> Self {
        RouteMethod::from_key(key)
    }
}

/// One method entry under a path.
#[derive(Clone, Default)]
pub struct RouteHandler {
    pub summary: Option<String>,
    pub schema: Option<RouteSchema>,
    pub handler: Option<Endpoint>,
    pub middlewares: Vec<Middleware>,
}

impl RouteHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    pub fn schema(mut self, schema: RouteSchema) -> Self {
        self.schema = Some(schema);
        self
    }

    pub fn handler(mut self, endpoint: Endpoint) -> Self {
        self.handler = Some(endpoint);
        self
    }

    pub fn middleware(mut self, middleware: Middleware) -> Self {
        self.middlewares.push(middleware);
        self
    }
}

impl std::fmt::Debug for RouteHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteHandler")
            .field("summary", &self.summary)
            .field("schema", &self.schema)
            .field("handler", &self.handler.is_some())
            .field("middlewares", &self.middlewares.len())
            .finish()
    }
}

/// Method entries for one path, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct RouteMethods {
    entries: Vec<(RouteMethod, RouteHandler)>,
}

impl RouteMethods {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(self, handler: RouteHandler) -> Self {
        self.method(HttpVerb::Get, handler)
    }

    pub fn post(self, handler: RouteHandler) -> Self {
        self.method(HttpVerb::Post, handler)
    }

    pub fn put(self, handler: RouteHandler) -> Self {
        self.method(HttpVerb::Put, handler)
    }

    pub fn delete(self, handler: RouteHandler) -> Self {
        self.method(HttpVerb::Delete, handler)
    }

    pub fn patch(self, handler: RouteHandler) -> Self {
        self.method(HttpVerb::Patch, handler)
    }

    /// Add an entry under an arbitrary method key.
    pub fn method(mut self, method: impl Into<RouteMethod>, handler: RouteHandler) -> Self {
        self.entries.push((method.into(), handler));
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&RouteMethod, &RouteHandler)> {
        self.entries.iter().map(|(method, handler)| (method, handler))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A named group of routes sharing documentation and middlewares.
#[derive(Debug, Clone)]
pub struct RouteTag {
    pub name: String,
    pub description: String,
    pub routes: Vec<(String, RouteMethods)>,
    pub middlewares: Vec<Middleware>,
}

impl RouteTag {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            routes: Vec::new(),
            middlewares: Vec::new(),
        }
    }

    /// Add a path with its method entries. Paths use `{name}` placeholders.
    pub fn route(mut self, path: impl Into<String>, methods: RouteMethods) -> Self {
        self.routes.push((path.into(), methods));
        self
    }

    /// Add a middleware that runs for every route of this tag.
    pub fn middleware(mut self, middleware: Middleware) -> Self {
        self.middlewares.push(middleware);
        self
    }
}

/// Rewrite `{name}` placeholders into the router's `:name` segment syntax.
///
/// A placeholder is rewritten only when it fills a whole segment and encloses
/// a non-empty run of word characters; anything else is copied through
/// unchanged. See [`embedded_placeholder`] for `{name}` mixed with other text.
pub fn transform_path(path: &str) -> String {
    path.split('/')
        .map(|segment| match placeholder(segment) {
            Some(name) => format!(":{name}"),
            None => segment.to_string(),
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// The first `{name}` placeholder sharing its segment with other text, as in
/// `/files/{name}.json`. The router captures whole segments only.
pub fn embedded_placeholder(path: &str) -> Option<&str> {
    path.split('/')
        .filter(|segment| placeholder(segment).is_none())
        .find_map(|segment| {
            let mut rest = segment;
            while let Some(open) = rest.find('{') {
                let after = &rest[open + 1..];
                let len = ident_len(after);
                if len > 0 && after[len..].starts_with('}') {
                    return Some(&after[..len]);
                }
                rest = after;
            }
            None
        })
}

fn placeholder(segment: &str) -> Option<&str> {
    let name = segment.strip_prefix('{')?.strip_suffix('}')?;
    (!name.is_empty() && ident_len(name) == name.len()).then_some(name)
}

fn ident_len(s: &str) -> usize {
    s.find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(s.len())
}

