//! Walks route tags once, producing documentation metadata and a live router.

use std::collections::{HashMap, HashSet};

use axum::Router;
use tracing::{debug, warn};

use crate::error::NestoiError;
use crate::meta::{BodyField, ParamInfo, ParamLocation, RouteInfo, TagInfo};
use crate::middleware::{Endpoint, Middleware};
use crate::route::{embedded_placeholder, transform_path, FieldRef, HttpVerb, RouteHandler, RouteMethod, RouteTag, SchemaKind};
use crate::schema::{DescriptorMap, FieldDescriptor, SchemaRegistry, ValidationRule};
use crate::security::DEFAULT_SCHEME_NAME;
use crate::validation::{validate_body, validate_query, ObjectRule, DEFAULT_BODY_LIMIT};

/// Output of [`RouteExtractor::extract`].
pub struct ExtractedRoutes {
    /// Tags in input order.
    pub tags: Vec<TagInfo>,
    /// One entry per registered route, in registration order.
    pub routes: Vec<RouteInfo>,
    pub router: Router,
    registered: HashSet<(String, HttpVerb)>,
}

impl ExtractedRoutes {
    /// Whether the router serves `verb` on `path` (a `:name` style router path).
    pub fn handles(&self, path: &str, verb: HttpVerb) -> bool {
        self.registered.contains(&(path.to_string(), verb))
    }
}

impl std::fmt::Debug for ExtractedRoutes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtractedRoutes")
            .field("tags", &self.tags)
            .field("routes", &self.routes)
            .finish()
    }
}

/// Turns route tags into documentation metadata and a router.
///
/// For every `(path, method)` entry the extractor documents the declared
/// fields, compiles one object rule per validated section, and registers the
/// route with its middleware chain:
///
/// query check, body check, tag middlewares, route middlewares, handler.
///
/// Entries without a handler answer `404` once their middlewares pass.
pub struct RouteExtractor<'a> {
    registry: &'a SchemaRegistry,
    descriptors: &'a DescriptorMap,
    security: Vec<String>,
    body_limit: usize,
}

impl<'a> RouteExtractor<'a> {
    pub fn new(registry: &'a SchemaRegistry, descriptors: &'a DescriptorMap) -> Self {
        Self {
            registry,
            descriptors,
            security: vec![DEFAULT_SCHEME_NAME.to_string()],
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }

    /// Security scheme names listed on every operation.
    pub fn security<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.security = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn body_limit(mut self, limit: usize) -> Self {
        self.body_limit = limit;
        self
    }

    pub fn extract(&self, route_tags: &[RouteTag]) -> Result<ExtractedRoutes, NestoiError> {
        let mut tags = Vec::with_capacity(route_tags.len());
        let mut routes = Vec::new();
        let mut router = Router::new();
        let mut registered = HashSet::new();
        // Router path shape (parameter names erased) -> first path registered with it.
        let mut shapes: HashMap<String, String> = HashMap::new();

        for tag in route_tags {
            tags.push(TagInfo {
                name: tag.name.clone(),
                description: tag.description.clone(),
            });

            for (path, methods) in &tag.routes {
                if let Some(name) = embedded_placeholder(path) {
                    return Err(NestoiError::InvalidRouteSchema {
                        route: path.clone(),
                        reason: format!("parameter '{{{name}}}' must fill a whole path segment"),
                    });
                }
                let mut translated = transform_path(path);
                if !translated.starts_with('/') {
                    translated.insert(0, '/');
                }
                let router_path = shapes
                    .entry(path_shape(&translated))
                    .or_insert_with(|| translated.clone())
                    .clone();
                if router_path != translated {
                    warn!(
                        path = %path,
                        registered = %router_path,
                        "path differs from an earlier route only in parameter names; serving it under the earlier path"
                    );
                }

                for (method, entry) in methods.iter() {
                    let verb = method.verb();
                    if !registered.insert((router_path.clone(), verb)) {
                        warn!(
                            tag = %tag.name,
                            path = %path,
                            method = method.key(),
                            "{} {router_path} is already registered, skipping",
                            verb.as_str().to_uppercase(),
                        );
                        continue;
                    }

                    let (info, chain) = self.build_route(tag, path, method, entry)?;

                    let endpoint = entry.handler.clone().unwrap_or_else(Endpoint::not_found);
                    let mut route = endpoint.into_method_router(verb);
                    for middleware in chain.iter().rev() {
                        route = middleware.layer_method_router(route);
                    }
                    router = router.route(&router_path, route);

                    debug!(
                        tag = %tag.name,
                        method = method.key(),
                        path = %router_path,
                        middlewares = chain.len(),
                        "registered route"
                    );
                    routes.push(info);
                }
            }
        }

        Ok(ExtractedRoutes {
            tags,
            routes,
            router,
            registered,
        })
    }

    fn build_route(
        &self,
        tag: &RouteTag,
        path: &str,
        method: &RouteMethod,
        entry: &RouteHandler,
    ) -> Result<(RouteInfo, Vec<Middleware>), NestoiError> {
        let mut params = Vec::new();
        let mut request_body = None;
        let mut query_rule = ObjectRule::new();
        let mut body_rule = ObjectRule::new();

        if let Some(schema) = &entry.schema {
            for kind in SchemaKind::ORDER {
                let Some(fields) = schema.fields(kind) else {
                    continue;
                };

                match kind {
                    SchemaKind::Body => {
                        let mut body = Vec::with_capacity(fields.len());
                        for field in fields {
                            body.push(BodyField {
                                name: field.name().to_string(),
                                required: field.is_required(),
                                descriptor: self.descriptor(field),
                            });
                            body_rule.insert(field, self.rule(field, method, path)?);
                        }
                        request_body = Some(body);
                    }
                    SchemaKind::Query => {
                        for field in fields {
                            params.push(self.param(field, ParamLocation::Query));
                            query_rule.insert(field, self.rule(field, method, path)?);
                        }
                    }
                    // Path segments are matched by the router and not checked further.
                    SchemaKind::Params => {
                        for field in fields {
                            params.push(self.param(field, ParamLocation::Path));
                        }
                    }
                }
            }
        }

        let route_name = format!("{} {path}", method.key().to_uppercase());
        let compile = |rule: &ObjectRule| {
            rule.compile().map_err(|reason| NestoiError::InvalidRouteSchema {
                route: route_name.clone(),
                reason,
            })
        };

        let mut chain = Vec::new();
        if !query_rule.is_empty() {
            chain.push(validate_query(compile(&query_rule)?));
        }
        if !body_rule.is_empty() {
            chain.push(validate_body(compile(&body_rule)?, self.body_limit));
        }
        chain.extend(tag.middlewares.iter().cloned());
        chain.extend(entry.middlewares.iter().cloned());

        let info = RouteInfo {
            path: path.to_string(),
            method: method.key().to_string(),
            tag: tag.name.clone(),
            summary: entry.summary.clone(),
            params,
            request_body,
            security: self.security.clone(),
        };

        Ok((info, chain))
    }

    /// Rule for a validated field. Body and query fields must be registered.
    fn rule(
        &self,
        field: &FieldRef,
        method: &RouteMethod,
        path: &str,
    ) -> Result<&'a ValidationRule, NestoiError> {
        self.registry
            .get(field.name())
            .ok_or_else(|| NestoiError::UnknownField {
                route: format!("{} {path}", method.key().to_uppercase()),
                field: field.name().to_string(),
            })
    }

    fn descriptor(&self, field: &FieldRef) -> FieldDescriptor {
        self.descriptors
            .get(field.name())
            .cloned()
            .unwrap_or_else(FieldDescriptor::fallback)
    }

    fn param(&self, field: &FieldRef, location: ParamLocation) -> ParamInfo {
        ParamInfo {
            name: field.name().to_string(),
            location,
            required: field.is_required(),
            descriptor: self.descriptor(field),
        }
    }
}

fn path_shape(router_path: &str) -> String {
    router_path
        .split('/')
        .map(|segment| if segment.starts_with(':') { ":" } else { segment })
        .collect::<Vec<_>>()
        .join("/")
}
