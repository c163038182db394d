//! Query/path parameter variants
//!
//! Mutates the serialized parameter set, never the body.

use serde_json::{Value, json};

use crate::operation::{Operation, ParamLocation, Variant, VariantKind};

/// A baseline "valid" variant, then missing/invalid cases per declared
/// query or path parameter.
#[must_use]
pub fn parameter_variants(op: &Operation) -> Vec<Variant> {
    let mut variants = vec![Variant::from_operation(
        op,
        VariantKind::Parameter,
        "Valid request with all parameters".to_string(),
    )];

    let declared = op
        .parameters
        .iter()
        .filter(|p| matches!(p.location, ParamLocation::Query | ParamLocation::Path));

    for param in declared {
        if param.required {
            let mut params = op.params.clone();
            params.remove(&param.name);
            variants.push(
                Variant::from_operation(
                    op,
                    VariantKind::Parameter,
                    format!("Missing required parameter '{}'", param.name),
                )
                .with_params(params),
            );
        }

        let current = op
            .params
            .get(&param.name)
            .cloned()
            .or_else(|| param.schema.example.clone())
            .unwrap_or_else(|| json!("string"));
        let mut params = op.params.clone();
        params.insert(param.name.clone(), swapped(&current));
        variants.push(
            Variant::from_operation(
                op,
                VariantKind::Parameter,
                format!("Invalid type for parameter '{}'", param.name),
            )
            .with_params(params),
        );
    }

    variants
}

fn swapped(value: &Value) -> Value {
    match value {
        Value::String(_) => json!(12345),
        Value::Number(_) => json!("invalid"),
        _ => Value::Null,
    }
}
