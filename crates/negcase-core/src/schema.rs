//! Resolved schema model
//!
//! Raw JSON Schema values from the contract are resolved once into
//! [`Schema`] nodes: `$ref`, `allOf`, `anyOf`/`oneOf` and implicit types are
//! settled at load time so generators never re-inspect raw JSON.

use serde_json::{Map, Value};

/// Maximum nesting depth during resolution. Deeper nodes (including
/// self-referential `$ref` chains) resolve to [`SchemaKind::Unknown`].
pub const MAX_DEPTH: u32 = 20;

/// A resolved schema node.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Schema {
    pub kind: SchemaKind,
    /// Declared `enum` values (empty when not an enum)
    pub enumeration: Vec<Value>,
    /// Declared `example`
    pub example: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum SchemaKind {
    Object {
        /// Properties in declaration order
        properties: Vec<(String, Schema)>,
        required: Vec<String>,
    },
    Array {
        items: Option<Box<Schema>>,
    },
    String {
        min_length: Option<u64>,
        max_length: Option<u64>,
    },
    Integer(NumericBounds),
    Number(NumericBounds),
    Boolean,
    #[default]
    Unknown,
}

/// `minimum` / `maximum` as declared (integers stay integers).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NumericBounds {
    pub minimum: Option<serde_json::Number>,
    pub maximum: Option<serde_json::Number>,
}

/// The declared JSON type of a node, without its constraints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeTag {
    Object,
    Array,
    String,
    Integer,
    Number,
    Boolean,
    Unknown,
}

impl Schema {
    /// Resolve a raw schema value against `components` (the
    /// `components.schemas` map of the contract).
    #[must_use]
    pub fn resolve(raw: &Value, components: &Value) -> Self {
        resolve_inner(raw, components, 0)
    }

    #[must_use]
    pub fn type_tag(&self) -> TypeTag {
        match self.kind {
            SchemaKind::Object { .. } => TypeTag::Object,
            SchemaKind::Array { .. } => TypeTag::Array,
            SchemaKind::String { .. } => TypeTag::String,
            SchemaKind::Integer(_) => TypeTag::Integer,
            SchemaKind::Number(_) => TypeTag::Number,
            SchemaKind::Boolean => TypeTag::Boolean,
            SchemaKind::Unknown => TypeTag::Unknown,
        }
    }

    /// Object properties, or an empty slice for non-objects.
    #[must_use]
    pub fn properties(&self) -> &[(String, Schema)] {
        match &self.kind {
            SchemaKind::Object { properties, .. } => properties,
            _ => &[],
        }
    }

    #[must_use]
    pub fn property(&self, name: &str) -> Option<&Schema> {
        self.properties()
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, s)| s)
    }

    #[must_use]
    pub fn is_required(&self, name: &str) -> bool {
        match &self.kind {
            SchemaKind::Object { required, .. } => required.iter().any(|r| r == name),
            _ => false,
        }
    }

    #[must_use]
    pub fn items(&self) -> Option<&Schema> {
        match &self.kind {
            SchemaKind::Array { items } => items.as_deref(),
            _ => None,
        }
    }
}

pub(crate) fn resolve_ref(ref_str: &str, components: &Value) -> Option<Value> {
    ref_str
        .strip_prefix("#/components/schemas/")
        .and_then(|name| components.get(name).cloned())
}

fn resolve_inner(raw: &Value, components: &Value, depth: u32) -> Schema {
    if depth > MAX_DEPTH {
        return Schema::default();
    }
    let Some(obj) = raw.as_object() else {
        return Schema::default();
    };

    // $ref
    if let Some(ref_str) = obj.get("$ref").and_then(|v| v.as_str()) {
        return match resolve_ref(ref_str, components) {
            Some(target) => resolve_inner(&target, components, depth + 1),
            None => Schema::default(),
        };
    }

    // allOf: merge object members
    if let Some(parts) = obj.get("allOf").and_then(|v| v.as_array()) {
        return merge_all_of(obj, parts, components, depth);
    }

    // anyOf / oneOf: first non-null alternative
    for key in ["anyOf", "oneOf"] {
        if let Some(alternatives) = obj.get(key).and_then(|v| v.as_array()) {
            let chosen = alternatives
                .iter()
                .find(|s| s.get("type").and_then(|t| t.as_str()) != Some("null"));
            let mut schema = chosen
                .map(|s| resolve_inner(s, components, depth + 1))
                .unwrap_or_default();
            if let Some(example) = obj.get("example") {
                schema.example = Some(example.clone());
            }
            return schema;
        }
    }

    let kind = match declared_type(obj) {
        Some("object") => resolve_object(obj, components, depth),
        Some("array") => SchemaKind::Array {
            items: obj
                .get("items")
                .map(|items| Box::new(resolve_inner(items, components, depth + 1))),
        },
        Some("string") => string_kind(obj),
        Some("integer") => SchemaKind::Integer(numeric_bounds(obj)),
        Some("number") => SchemaKind::Number(numeric_bounds(obj)),
        Some("boolean") => SchemaKind::Boolean,
        Some(_) => SchemaKind::Unknown,
        None => infer_kind(obj, components, depth),
    };

    Schema {
        kind,
        enumeration: obj
            .get("enum")
            .and_then(|v| v.as_array())
            .cloned()
            .unwrap_or_default(),
        example: obj.get("example").cloned(),
    }
}

/// `type` may be a string or (OpenAPI 3.1) a list such as `["string", "null"]`.
fn declared_type(obj: &Map<String, Value>) -> Option<&str> {
    match obj.get("type")? {
        Value::String(s) => Some(s.as_str()),
        Value::Array(types) => types
            .iter()
            .filter_map(|t| t.as_str())
            .find(|t| *t != "null")
            .or(Some("unknown")),
        _ => Some("unknown"),
    }
}

fn infer_kind(obj: &Map<String, Value>, components: &Value, depth: u32) -> SchemaKind {
    if obj.contains_key("properties") {
        resolve_object(obj, components, depth)
    } else if let Some(items) = obj.get("items") {
        SchemaKind::Array {
            items: Some(Box::new(resolve_inner(items, components, depth + 1))),
        }
    } else if obj.contains_key("minLength") || obj.contains_key("maxLength") {
        string_kind(obj)
    } else if obj.contains_key("minimum") || obj.contains_key("maximum") {
        SchemaKind::Number(numeric_bounds(obj))
    } else {
        SchemaKind::Unknown
    }
}

fn resolve_object(obj: &Map<String, Value>, components: &Value, depth: u32) -> SchemaKind {
    let properties = obj
        .get("properties")
        .and_then(|v| v.as_object())
        .map(|props| {
            props
                .iter()
                .map(|(name, raw)| (name.clone(), resolve_inner(raw, components, depth + 1)))
                .collect()
        })
        .unwrap_or_default();
    SchemaKind::Object {
        properties,
        required: required_names(obj),
    }
}

fn merge_all_of(
    obj: &Map<String, Value>,
    parts: &[Value],
    components: &Value,
    depth: u32,
) -> Schema {
    let mut properties: Vec<(String, Schema)> = Vec::new();
    let mut required = required_names(obj);
    let mut last_non_object = None;

    for part in parts {
        let resolved = resolve_inner(part, components, depth + 1);
        match resolved.kind {
            SchemaKind::Object {
                properties: props,
                required: req,
            } => {
                for (name, schema) in props {
                    match properties.iter_mut().find(|(n, _)| *n == name) {
                        Some(slot) => slot.1 = schema,
                        None => properties.push((name, schema)),
                    }
                }
                for r in req {
                    if !required.contains(&r) {
                        required.push(r);
                    }
                }
            }
            _ => last_non_object = Some(resolved),
        }
    }

    if properties.is_empty() {
        if let Some(schema) = last_non_object {
            return schema;
        }
    }

    Schema {
        kind: SchemaKind::Object {
            properties,
            required,
        },
        enumeration: Vec::new(),
        example: obj.get("example").cloned(),
    }
}

fn required_names(obj: &Map<String, Value>) -> Vec<String> {
    obj.get("required")
        .and_then(|v| v.as_array())
        .map(|arr| {
            arr.iter()
                .filter_map(|v| v.as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default()
}

fn string_kind(obj: &Map<String, Value>) -> SchemaKind {
    SchemaKind::String {
        min_length: obj.get("minLength").and_then(|v| v.as_u64()),
        max_length: obj.get("maxLength").and_then(|v| v.as_u64()),
    }
}

fn numeric_bounds(obj: &Map<String, Value>) -> NumericBounds {
    let number = |key: &str| match obj.get(key) {
        Some(Value::Number(n)) => Some(n.clone()),
        _ => None,
    };
    NumericBounds {
        minimum: number("minimum"),
        maximum: number("maximum"),
    }
}
