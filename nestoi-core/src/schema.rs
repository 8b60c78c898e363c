//! Field rules and their documentation-only descriptors.
//!
//! A [`ValidationRule`] is a JSON Schema fragment for one named field. The
//! [`SchemaRegistry`] holds every rule of the application in one flat
//! namespace and can describe itself as a [`DescriptorMap`], which is what the
//! OpenAPI document embeds for parameters and request bodies.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::error::NestoiError;

/// JSON type of a documented field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Number,
    String,
    Boolean,
    Array,
    Object,
    Null,
}

impl FieldType {
    /// Map a JSON Schema `type` keyword onto the documented type set.
    ///
    /// `integer` is reported as `number`; unknown names fall back to `string`.
    pub fn from_schema_type(name: &str) -> Self {
        match name {
            "number" | "integer" => FieldType::Number,
            "boolean" => FieldType::Boolean,
            "array" => FieldType::Array,
            "object" => FieldType::Object,
            "null" => FieldType::Null,
            _ => FieldType::String,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FieldType::Number => "number",
            FieldType::String => "string",
            FieldType::Boolean => "boolean",
            FieldType::Array => "array",
            FieldType::Object => "object",
            FieldType::Null => "null",
        }
    }
}

/// Documentation metadata for one named field. Carries no validation behavior.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldDescriptor {
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid: Option<Vec<String>>,
}

impl FieldDescriptor {
    pub fn new(field_type: FieldType) -> Self {
        Self {
            field_type,
            example: None,
            description: None,
            min: None,
            max: None,
            valid: None,
        }
    }

    /// Descriptor used for fields that have no registered rule: `{ type: "string" }`.
    pub fn fallback() -> Self {
        Self::new(FieldType::String)
    }
}

/// Field descriptors keyed by field name.
pub type DescriptorMap = BTreeMap<String, FieldDescriptor>;

/// Returns the first non-`null` entry of a schema's `type` keyword.
pub(crate) fn declared_type(schema: &Value) -> Option<&str> {
    match schema.get("type")? {
        Value::String(name) => Some(name.as_str()),
        Value::Array(names) => names
            .iter()
            .filter_map(Value::as_str)
            .find(|name| *name != "null")
            .or_else(|| names.first().and_then(Value::as_str)),
        _ => None,
    }
}

/// A named, composable shape check for one field, expressed as JSON Schema.
///
/// Whether the field is required is decided where the rule is used, not here.
///
/// ```ignore
/// let age = ValidationRule::integer().min(0).max(150).example(30);
/// let role = ValidationRule::string().one_of(["admin", "user"]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationRule {
    schema: Value,
}

impl ValidationRule {
    /// Wrap an arbitrary JSON Schema fragment.
    pub fn new(schema: Value) -> Self {
        Self { schema }
    }

    pub fn string() -> Self {
        Self::new(json!({ "type": "string" }))
    }

    pub fn number() -> Self {
        Self::new(json!({ "type": "number" }))
    }

    pub fn integer() -> Self {
        Self::new(json!({ "type": "integer" }))
    }

    pub fn boolean() -> Self {
        Self::new(json!({ "type": "boolean" }))
    }

    pub fn array(items: ValidationRule) -> Self {
        Self::new(json!({ "type": "array", "items": items.schema }))
    }

    pub fn object() -> Self {
        Self::new(json!({ "type": "object" }))
    }

    /// Attach an example value shown in the documentation.
    pub fn example(self, value: impl Into<Value>) -> Self {
        self.with_keyword("example", value.into())
    }

    pub fn description(self, text: impl Into<String>) -> Self {
        self.with_keyword("description", Value::String(text.into()))
    }

    /// Lower bound: `minLength` for strings, `minItems` for arrays, `minimum` otherwise.
    pub fn min(self, bound: impl Into<Value>) -> Self {
        let keyword = match declared_type(&self.schema) {
            Some("string") => "minLength",
            Some("array") => "minItems",
            _ => "minimum",
        };
        self.with_keyword(keyword, bound.into())
    }

    /// Upper bound: `maxLength` for strings, `maxItems` for arrays, `maximum` otherwise.
    pub fn max(self, bound: impl Into<Value>) -> Self {
        let keyword = match declared_type(&self.schema) {
            Some("string") => "maxLength",
            Some("array") => "maxItems",
            _ => "maximum",
        };
        self.with_keyword(keyword, bound.into())
    }

    /// Restrict the field to a fixed set of literal values.
    pub fn one_of<I, V>(self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        self.with_keyword("enum", Value::Array(values))
    }

    /// Regular expression the string value must match.
    pub fn pattern(self, regex: impl Into<String>) -> Self {
        self.with_keyword("pattern", Value::String(regex.into()))
    }

    pub fn format(self, format: impl Into<String>) -> Self {
        self.with_keyword("format", Value::String(format.into()))
    }

    fn with_keyword(mut self, keyword: &str, value: Value) -> Self {
        if let Value::Object(obj) = &mut self.schema {
            obj.insert(keyword.to_string(), value);
        }
        self
    }

    /// The underlying JSON Schema.
    pub fn schema(&self) -> &Value {
        &self.schema
    }

    /// The declared JSON type of the rule, if any.
    pub fn declared_type(&self) -> Option<&str> {
        declared_type(&self.schema)
    }

    /// Flatten the rule's shape into a [`FieldDescriptor`].
    pub fn describe(&self) -> FieldDescriptor {
        let Some(obj) = self.schema.as_object() else {
            return FieldDescriptor::fallback();
        };

        let field_type = match declared_type(&self.schema) {
            Some(name) => FieldType::from_schema_type(name),
            None if obj.contains_key("properties") => FieldType::Object,
            None if obj.contains_key("items") => FieldType::Array,
            None => FieldType::String,
        };

        FieldDescriptor {
            field_type,
            example: obj.get("example").cloned().or_else(|| {
                obj.get("examples")
                    .and_then(Value::as_array)
                    .and_then(|examples| examples.first())
                    .cloned()
            }),
            description: obj
                .get("description")
                .and_then(Value::as_str)
                .map(str::to_string),
            min: first_number(obj, &["minimum", "minLength", "minItems"]),
            max: first_number(obj, &["maximum", "maxLength", "maxItems"]),
            valid: obj.get("enum").and_then(Value::as_array).map(|values| {
                values.iter().map(render_literal).collect()
            }),
        }
    }

    fn compile_check(&self, field: &str) -> Result<(), NestoiError> {
        jsonschema::validator_for(&self.schema)
            .map(|_| ())
            .map_err(|err| NestoiError::InvalidRule {
                field: field.to_string(),
                reason: err.to_string(),
            })
    }
}

impl From<Value> for ValidationRule {
    fn from(schema: Value) -> Self {
        Self::new(schema)
    }
}

fn first_number(obj: &Map<String, Value>, keywords: &[&str]) -> Option<f64> {
    keywords
        .iter()
        .find_map(|keyword| obj.get(*keyword).and_then(Value::as_f64))
}

fn render_literal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Flat registry of validation rules keyed by field name.
///
/// Field names are one global namespace across all route tags. Registering a
/// name twice is accepted only when both definitions are identical.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    rules: BTreeMap<String, ValidationRule>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a rule under `name`.
    ///
    /// # Errors
    ///
    /// [`NestoiError::InvalidRule`] when the validation engine cannot compile
    /// the rule, [`NestoiError::ConflictingField`] when `name` already holds a
    /// different rule.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        rule: impl Into<ValidationRule>,
    ) -> Result<(), NestoiError> {
        let name = name.into();
        let rule = rule.into();
        rule.compile_check(&name)?;

        match self.rules.get(&name) {
            Some(existing) if *existing == rule => Ok(()),
            Some(_) => Err(NestoiError::ConflictingField(name)),
            None => {
                self.rules.insert(name, rule);
                Ok(())
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&ValidationRule> {
        self.rules.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.rules.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ValidationRule)> {
        self.rules.iter().map(|(name, rule)| (name.as_str(), rule))
    }

    /// Describe every registered rule, one descriptor per field name.
    pub fn describe(&self) -> DescriptorMap {
        self.rules
            .iter()
            .map(|(name, rule)| (name.clone(), rule.describe()))
            .collect()
    }
}
