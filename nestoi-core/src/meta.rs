use serde::Serialize;

use crate::schema::FieldDescriptor;

/// A documented route group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TagInfo {
    pub name: String,
    pub description: String,
}

/// Documentation metadata for one registered `(path, method)` pair.
#[derive(Debug, Clone, Serialize)]
pub struct RouteInfo {
    /// Path as declared, with `{name}` placeholders.
    pub path: String,
    /// Method key as declared (lowercase for known verbs).
    pub method: String,
    pub tag: String,
    pub summary: Option<String>,
    pub params: Vec<ParamInfo>,
    /// `None` when the route declares no body list at all.
    pub request_body: Option<Vec<BodyField>>,
    /// Names of the security schemes the operation lists.
    pub security: Vec<String>,
}

/// Metadata about a route parameter.
#[derive(Debug, Clone, Serialize)]
pub struct ParamInfo {
    pub name: String,
    pub location: ParamLocation,
    pub required: bool,
    pub descriptor: FieldDescriptor,
}

/// Where a parameter is located in the HTTP request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamLocation {
    Path,
    Query,
}

impl ParamLocation {
    pub fn as_str(self) -> &'static str {
        match self {
            ParamLocation::Path => "path",
            ParamLocation::Query => "query",
        }
    }
}

/// One property of a JSON request body.
#[derive(Debug, Clone, Serialize)]
pub struct BodyField {
    pub name: String,
    pub required: bool,
    pub descriptor: FieldDescriptor,
}
