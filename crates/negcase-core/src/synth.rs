//! Baseline example synthesis
//!
//! Builds one representative request body from a resolved [`Schema`]:
//! one value per declared field, declared examples first.

use serde_json::{Map, Value, json};

use crate::schema::{Schema, SchemaKind, TypeTag};

/// Synthesize a baseline value for `schema`.
///
/// Terminates on every resolved schema because resolution is depth-bounded.
#[must_use]
pub fn synthesize(schema: &Schema) -> Value {
    match &schema.kind {
        SchemaKind::Object {
            properties,
            required,
        } => {
            let mut obj = Map::new();
            for (name, prop) in properties {
                let value = match &prop.example {
                    Some(example) => example.clone(),
                    None => synthesize(prop),
                };
                obj.insert(name.clone(), value);
            }
            for name in required {
                if !obj.contains_key(name) {
                    let tag = schema
                        .property(name)
                        .map_or(TypeTag::String, Schema::type_tag);
                    obj.insert(name.clone(), zero_value(tag));
                }
            }
            Value::Object(obj)
        }
        SchemaKind::Array { items } => {
            let element = items.as_deref().map_or(Value::Null, synthesize);
            Value::Array(vec![element])
        }
        SchemaKind::String { .. } => example_or(schema, json!("")),
        SchemaKind::Integer(_) => example_or(schema, json!(0)),
        SchemaKind::Number(_) => example_or(schema, json!(0.0)),
        SchemaKind::Boolean => example_or(schema, json!(true)),
        SchemaKind::Unknown => example_or(schema, Value::Null),
    }
}

/// Type-appropriate zero value used to fill required-but-absent fields.
#[must_use]
pub fn zero_value(tag: TypeTag) -> Value {
    match tag {
        TypeTag::String => json!(""),
        TypeTag::Integer => json!(0),
        TypeTag::Number => json!(0.0),
        TypeTag::Boolean => json!(false),
        TypeTag::Array => json!([]),
        TypeTag::Object => json!({}),
        TypeTag::Unknown => Value::Null,
    }
}

fn example_or(schema: &Schema, default: Value) -> Value {
    schema.example.clone().unwrap_or(default)
}
