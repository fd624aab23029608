//! JSON-schema based validation and sanitization of resource input.
//!
//! A [`ResourceSchema`] is parsed once from a JSON-schema document and is
//! immutable afterwards; the full (create) and partial (update, `required`
//! relaxed) validation modes are both derived from the same parsed form, so
//! no schema state is ever mutated between calls. The [`Validator`] is an
//! explicitly constructed instance owned by each resource mapper, never
//! process-global state.
//!
//! Validation collects **all** violations instead of stopping at the first
//! one, and strips properties not declared in the schema as a side effect
//! (sanitization).

use serde_json::{Map, Value};

use crate::error::{MapperError, MapperResult, Violation};

/// The subset of JSON-schema `type` keywords understood by the validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonType {
    String,
    Number,
    Integer,
    Boolean,
    Array,
    Object,
    Null,
}

impl JsonType {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "string" => Some(JsonType::String),
            "number" => Some(JsonType::Number),
            "integer" => Some(JsonType::Integer),
            "boolean" => Some(JsonType::Boolean),
            "array" => Some(JsonType::Array),
            "object" => Some(JsonType::Object),
            "null" => Some(JsonType::Null),
            _ => None,
        }
    }

    fn matches(&self, value: &Value) -> bool {
        match self {
            JsonType::String => value.is_string(),
            JsonType::Number => value.is_number(),
            JsonType::Integer => match value.as_f64() {
                Some(number) => number.fract() == 0.0,
                None => false,
            },
            JsonType::Boolean => value.is_boolean(),
            JsonType::Array => value.is_array(),
            JsonType::Object => value.is_object(),
            JsonType::Null => value.is_null(),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            JsonType::String => "string",
            JsonType::Number => "number",
            JsonType::Integer => "integer",
            JsonType::Boolean => "boolean",
            JsonType::Array => "array",
            JsonType::Object => "object",
            JsonType::Null => "null",
        }
    }
}

/// One declared property: the allowed types, or any type when the schema did
/// not constrain it.
#[derive(Debug, Clone)]
struct Property {
    name: String,
    types: Vec<JsonType>,
}

/// A JSON-schema for one resource type, parsed into an immutable form.
///
/// # Example
///
/// ```ignore
/// use halcrud_core::schema::ResourceSchema;
/// use serde_json::json;
///
/// let schema = ResourceSchema::new(json!({
///     "type": "object",
///     "properties": {
///         "name": { "type": "string" },
///         "age": { "type": "integer" }
///     },
///     "required": ["name"]
/// }))?;
/// # Ok::<(), halcrud_core::error::MapperError>(())
/// ```
#[derive(Debug, Clone)]
pub struct ResourceSchema {
    properties: Vec<Property>,
    required: Vec<String>,
}

impl ResourceSchema {
    /// Parses a JSON-schema document.
    ///
    /// # Errors
    ///
    /// Returns [`MapperError::InvalidSchema`] when the document is not an
    /// object schema or uses a malformed `properties`/`required` clause.
    pub fn new(schema: Value) -> MapperResult<Self> {
        let root = schema
            .as_object()
            .ok_or_else(|| MapperError::InvalidSchema("schema must be an object".into()))?;

        let mut properties = Vec::new();

        if let Some(declared) = root.get("properties") {
            let declared = declared
                .as_object()
                .ok_or_else(|| MapperError::InvalidSchema("'properties' must be an object".into()))?;

            for (name, spec) in declared {
                properties.push(Property {
                    name: name.clone(),
                    types: Self::parse_types(name, spec)?,
                });
            }
        }

        let mut required = Vec::new();

        if let Some(names) = root.get("required") {
            let names = names
                .as_array()
                .ok_or_else(|| MapperError::InvalidSchema("'required' must be an array".into()))?;

            for name in names {
                match name.as_str() {
                    Some(name) => required.push(name.to_string()),
                    None => {
                        return Err(MapperError::InvalidSchema(
                            "'required' entries must be strings".into(),
                        ));
                    }
                }
            }
        }

        Ok(Self { properties, required })
    }

    fn parse_types(name: &str, spec: &Value) -> MapperResult<Vec<JsonType>> {
        let spec = spec.as_object().ok_or_else(|| {
            MapperError::InvalidSchema(format!("property '{name}' must be an object schema"))
        })?;

        let declared = match spec.get("type") {
            None => return Ok(Vec::new()),
            Some(Value::String(single)) => vec![single.clone()],
            Some(Value::Array(many)) => many
                .iter()
                .map(|t| t.as_str().map(str::to_string))
                .collect::<Option<Vec<_>>>()
                .ok_or_else(|| {
                    MapperError::InvalidSchema(format!(
                        "property '{name}' has a non-string entry in 'type'"
                    ))
                })?,
            Some(_) => {
                return Err(MapperError::InvalidSchema(format!(
                    "property '{name}' has a malformed 'type' keyword"
                )));
            }
        };

        declared
            .iter()
            .map(|t| {
                JsonType::parse(t).ok_or_else(|| {
                    MapperError::InvalidSchema(format!("property '{name}' has unknown type '{t}'"))
                })
            })
            .collect()
    }

    /// Returns whether a property name is declared by this schema.
    pub fn declares(&self, name: &str) -> bool {
        self.properties.iter().any(|p| p.name == name)
    }
}

/// Schema validator with fixed options: strip undeclared properties, collect
/// all violations.
#[derive(Debug, Clone)]
pub struct Validator {
    schema: ResourceSchema,
}

impl Validator {
    /// Creates a validator for one resource schema.
    pub fn new(schema: ResourceSchema) -> Self {
        Self { schema }
    }

    /// Validates and sanitizes a JSON object against the schema.
    ///
    /// Properties not declared in the schema are removed from the returned
    /// object. When `enforce_required` is false the schema's `required`
    /// clause is relaxed, allowing partial input (update semantics).
    ///
    /// # Errors
    ///
    /// Returns [`MapperError::Validation`] carrying every violation found.
    pub fn validate(&self, data: Value, enforce_required: bool) -> MapperResult<Map<String, Value>> {
        let mut data = match data {
            Value::Object(map) => map,
            other => {
                return Err(MapperError::Validation(vec![Violation::new(
                    "",
                    "type",
                    format!("expected an object, got {}", type_name(&other)),
                )]));
            }
        };

        data.retain(|name, _| self.schema.declares(name));

        let mut violations = Vec::new();

        if enforce_required {
            for name in &self.schema.required {
                if !data.contains_key(name) {
                    violations.push(Violation::new(
                        format!("/{name}"),
                        "required",
                        format!("missing required property '{name}'"),
                    ));
                }
            }
        }

        for property in &self.schema.properties {
            let Some(value) = data.get(&property.name) else {
                continue;
            };

            if property.types.is_empty() {
                continue;
            }

            if !property.types.iter().any(|t| t.matches(value)) {
                let expected = property
                    .types
                    .iter()
                    .map(JsonType::name)
                    .collect::<Vec<_>>()
                    .join(" or ");

                violations.push(Violation::new(
                    format!("/{}", property.name),
                    "type",
                    format!("expected {expected}, got {}", type_name(value)),
                ));
            }
        }

        if violations.is_empty() {
            Ok(data)
        } else {
            Err(MapperError::Validation(violations))
        }
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
