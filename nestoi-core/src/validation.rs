//! Per-route request validation.
//!
//! Each route gets at most one composite rule per request section. The rule is
//! an object schema built from the route's field list, compiled once when the
//! router is assembled, and checked by a [`Middleware`] on every request.
//!
//! A failed check answers `400` with `{"success": 0, "msg": "..."}` and stops
//! the chain. The handler never sees an invalid request.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::Request;
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use jsonschema::Validator;
use serde_json::{json, Map, Number, Value};

use crate::middleware::Middleware;
use crate::route::FieldRef;
use crate::schema::{declared_type, ValidationRule};

/// Default bound on buffered request bodies, 100 KiB.
pub const DEFAULT_BODY_LIMIT: usize = 100 * 1024;

/// Object rule assembled from one section's field list.
#[derive(Debug, Clone, Default)]
pub struct ObjectRule {
    properties: Map<String, Value>,
    required: Vec<String>,
}

impl ObjectRule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `field` with its registered rule.
    pub fn insert(&mut self, field: &FieldRef, rule: &ValidationRule) {
        self.properties
            .insert(field.name().to_string(), rule.schema().clone());

        if field.is_required() && !self.required.iter().any(|name| name == field.name()) {
            self.required.push(field.name().to_string());
        }
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// The composite schema. Keys outside the declared fields are rejected.
    pub fn to_schema(&self) -> Value {
        let mut schema = json!({
            "type": "object",
            "properties": Value::Object(self.properties.clone()),
            "additionalProperties": false,
        });
        if !self.required.is_empty() {
            schema["required"] = json!(self.required);
        }
        schema
    }

    pub fn compile(&self) -> Result<CompiledRule, String> {
        let validator = jsonschema::validator_for(&self.to_schema()).map_err(|e| e.to_string())?;
        Ok(CompiledRule {
            validator: Arc::new(validator),
            properties: Arc::new(self.properties.clone()),
        })
    }
}

/// A compiled object rule, cheap to clone into middlewares.
#[derive(Clone)]
pub struct CompiledRule {
    validator: Arc<Validator>,
    properties: Arc<Map<String, Value>>,
}

impl CompiledRule {
    /// Check `instance`, returning the first failure as a readable message.
    pub fn check(&self, instance: &Value) -> Result<(), String> {
        match self.validator.iter_errors(instance).next() {
            None => Ok(()),
            Some(err) => {
                let path = err.instance_path.to_string();
                let field = path.trim_start_matches('/');
                if field.is_empty() {
                    Err(err.to_string())
                } else {
                    Err(format!("{field}: {err}"))
                }
            }
        }
    }

    /// Decode a raw query string into a JSON object shaped for this rule.
    ///
    /// Repeated keys collect into arrays. Values are converted to the declared
    /// type of their field where the text allows it, and left as strings
    /// otherwise so the check reports the mismatch.
    pub fn query_value(&self, raw: &str) -> Value {
        let mut grouped: Vec<(String, Vec<String>)> = Vec::new();
        for (key, value) in form_urlencoded::parse(raw.as_bytes()) {
            match grouped.iter_mut().find(|(k, _)| *k == key) {
                Some((_, values)) => values.push(value.into_owned()),
                None => grouped.push((key.into_owned(), vec![value.into_owned()])),
            }
        }

        let mut out = Map::new();
        for (key, values) in grouped {
            let schema = self.properties.get(&key);
            let value = if schema.and_then(declared_type) == Some("array") {
                let items = schema.and_then(|s| s.get("items"));
                Value::Array(values.iter().map(|v| coerce(v, items)).collect())
            } else if values.len() == 1 {
                coerce(&values[0], schema)
            } else {
                Value::Array(values.iter().map(|v| coerce(v, schema)).collect())
            };
            out.insert(key, value);
        }
        Value::Object(out)
    }
}

impl std::fmt::Debug for CompiledRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledRule")
            .field("properties", &self.properties.keys().collect::<Vec<_>>())
            .finish()
    }
}

fn coerce(raw: &str, schema: Option<&Value>) -> Value {
    let text = || Value::String(raw.to_string());
    match schema.and_then(declared_type) {
        Some("integer") => raw.parse::<i64>().map(Value::from).unwrap_or_else(|_| text()),
        Some("number") => raw
            .parse::<i64>()
            .map(Value::from)
            .ok()
            .or_else(|| {
                raw.parse::<f64>()
                    .ok()
                    .and_then(Number::from_f64)
                    .map(Value::Number)
            })
            .unwrap_or_else(text),
        Some("boolean") => match raw {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            _ => text(),
        },
        _ => text(),
    }
}

/// The response sent when a request section fails its check.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationFailure {
    status: StatusCode,
    msg: String,
}

impl ValidationFailure {
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            msg: msg.into(),
        }
    }

    pub fn payload_too_large(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::PAYLOAD_TOO_LARGE,
            msg: msg.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn msg(&self) -> &str {
        &self.msg
    }
}

impl IntoResponse for ValidationFailure {
    fn into_response(self) -> Response {
        let body = json!({ "success": 0, "msg": self.msg });
        (self.status, Json(body)).into_response()
    }
}

/// Middleware checking the decoded query string against `rule`.
pub fn validate_query(rule: CompiledRule) -> Middleware {
    Middleware::from_fn(move |req: Request, next: Next| {
        let rule = rule.clone();
        async move {
            let value = rule.query_value(req.uri().query().unwrap_or(""));
            match rule.check(&value) {
                Ok(()) => next.run(req).await,
                Err(msg) => ValidationFailure::new(msg).into_response(),
            }
        }
    })
}

/// Middleware checking the JSON body against `rule`.
///
/// The body is buffered up to `limit` bytes and handed on unchanged when the
/// check passes. An empty body is checked as `{}`.
pub fn validate_body(rule: CompiledRule, limit: usize) -> Middleware {
    Middleware::from_fn(move |req: Request, next: Next| {
        let rule = rule.clone();
        async move {
            let (parts, body) = req.into_parts();
            let bytes = match axum::body::to_bytes(body, limit).await {
                Ok(bytes) => bytes,
                Err(err) => return ValidationFailure::payload_too_large(err.to_string()).into_response(),
            };

            let value = if bytes.iter().all(u8::is_ascii_whitespace) {
                json!({})
            } else {
                match serde_json::from_slice::<Value>(&bytes) {
                    Ok(value) => value,
                    Err(err) => return ValidationFailure::new(err.to_string()).into_response(),
                }
            };

            match rule.check(&value) {
                Ok(()) => next.run(Request::from_parts(parts, Body::from(bytes))).await,
                Err(msg) => ValidationFailure::new(msg).into_response(),
            }
        }
    })
}
