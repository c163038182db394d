//! Recursive body generator
//!
//! Drives the field mutators over every property at every nesting level:
//! nested objects, and object items of arrays (one pass per element present
//! in the current example array).

use serde_json::Value;

use crate::operation::{Operation, Variant};
use crate::path::{self, FieldPath};
use crate::schema::{Schema, TypeTag};

use super::field::field_variants;

/// Generate field mutations for every property reachable from `schema`.
///
/// `base_body` is the root baseline body. Pass [`FieldPath::root`] and the
/// request body schema to cover the whole document.
#[must_use]
pub fn recursive_body_variants(
    op: &Operation,
    base_body: &Value,
    current: &FieldPath,
    schema: &Schema,
) -> Vec<Variant> {
    let mut variants = Vec::new();

    for (name, prop_schema) in schema.properties() {
        let field_path = current.child(name.as_str());
        variants.extend(field_variants(
            op,
            base_body,
            &field_path,
            prop_schema,
            schema.is_required(name),
        ));

        match prop_schema.type_tag() {
            TypeTag::Object => {
                variants.extend(recursive_body_variants(
                    op,
                    base_body,
                    &field_path,
                    prop_schema,
                ));
            }
            TypeTag::Array => {
                let Some(items) = prop_schema
                    .items()
                    .filter(|i| i.type_tag() == TypeTag::Object)
                else {
                    continue;
                };
                let len = path::get(base_body, &field_path)
                    .and_then(Value::as_array)
                    .map_or(0, Vec::len);
                for idx in 0..len {
                    variants.extend(recursive_body_variants(
                        op,
                        base_body,
                        &field_path.child(idx),
                        items,
                    ));
                }
            }
            _ => {}
        }
    }

    variants
}
