//! Per-field mutators: missing-required, blank, invalid-type, invalid-enum

use serde_json::{Value, json};

use crate::operation::{Operation, Variant, VariantKind};
use crate::path::{self, FieldPath};
use crate::schema::{Schema, TypeTag};

/// Value outside every enum a contract is expected to declare.
pub const INVALID_ENUM_SENTINEL: &str = "invalid_enum_val_123";

/// Sentinel of an incompatible type for a field declared as `tag`.
///
/// `None` for unknown types: there is nothing to be incompatible with.
#[must_use]
pub fn invalid_type_sentinel(tag: TypeTag) -> Option<Value> {
    match tag {
        TypeTag::String => Some(json!(12345)),
        TypeTag::Integer | TypeTag::Number => Some(json!("invalid_string")),
        TypeTag::Boolean => Some(json!("not_a_boolean")),
        TypeTag::Array => Some(json!("not_an_array")),
        TypeTag::Object => Some(json!("not_an_object")),
        TypeTag::Unknown => None,
    }
}

/// Generate up to four mutation cases for the field at `field_path`.
///
/// `base_body` is the root request body; mutations are always applied at
/// the full path so the rest of the document keeps its shape.
#[must_use]
pub fn field_variants(
    op: &Operation,
    base_body: &Value,
    field_path: &FieldPath,
    field_schema: &Schema,
    required: bool,
) -> Vec<Variant> {
    let mut variants = Vec::new();
    let tag = field_schema.type_tag();

    if required {
        variants.push(
            Variant::from_operation(
                op,
                VariantKind::MissingField,
                format!("Missing required body field '{field_path}'"),
            )
            .with_body(path::delete(base_body, field_path)),
        );
    }

    if tag == TypeTag::String {
        variants.push(
            Variant::from_operation(
                op,
                VariantKind::BlankField,
                format!("Blank string for body field '{field_path}'"),
            )
            .with_body(path::set(base_body, field_path, json!(""))),
        );
    }

    if let Some(sentinel) = invalid_type_sentinel(tag) {
        variants.push(
            Variant::from_operation(
                op,
                VariantKind::InvalidType,
                format!("Invalid type for body field '{field_path}'"),
            )
            .with_body(path::set(base_body, field_path, sentinel)),
        );
    }

    let sentinel = json!(INVALID_ENUM_SENTINEL);
    if !field_schema.enumeration.is_empty() && !field_schema.enumeration.contains(&sentinel) {
        variants.push(
            Variant::from_operation(
                op,
                VariantKind::InvalidEnum,
                format!("Invalid enum value for body field '{field_path}'"),
            )
            .with_body(path::set(base_body, field_path, sentinel)),
        );
    }

    variants
}
