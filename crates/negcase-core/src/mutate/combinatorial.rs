//! Multi-field removal and invalid-type combinations over top-level body fields

use serde_json::{Map, Value, json};

use crate::operation::{Operation, Variant, VariantKind};
use crate::schema::{Schema, TypeTag};

use super::field::invalid_type_sentinel;

/// Emit, for every `r`-combination of top-level fields with
/// `2 <= r <= min(max_combination, field_count)`, one deletion variant and
/// one invalid-type variant. Deletions come first.
#[must_use]
pub fn combinatorial_variants(
    op: &Operation,
    base_body: &Value,
    schema: Option<&Schema>,
    max_combination: usize,
) -> Vec<Variant> {
    let Some(fields) = base_body.as_object() else {
        return Vec::new();
    };
    if fields.len() < 2 {
        return Vec::new();
    }

    let names: Vec<&str> = fields.keys().map(String::as_str).collect();
    let combos: Vec<Vec<&str>> = (2..=max_combination.min(names.len()))
        .flat_map(|r| combinations(&names, r))
        .collect();

    let mut variants = Vec::with_capacity(combos.len() * 2);

    for combo in &combos {
        let mut body = fields.clone();
        for name in combo {
            body.shift_remove(*name);
        }
        variants.push(
            Variant::from_operation(
                op,
                VariantKind::Combinatorial,
                format!("Missing multiple body fields ({})", combo.join(", ")),
            )
            .with_body(Value::Object(body)),
        );
    }

    for combo in &combos {
        let mut body: Map<String, Value> = fields.clone();
        for name in combo {
            body.insert((*name).to_string(), sentinel_for(schema, name));
        }
        variants.push(
            Variant::from_operation(
                op,
                VariantKind::Combinatorial,
                format!("Invalid types for multiple body fields ({})", combo.join(", ")),
            )
            .with_body(Value::Object(body)),
        );
    }

    variants
}

/// Undeclared fields are treated as strings.
fn sentinel_for(schema: Option<&Schema>, name: &str) -> Value {
    let tag = schema
        .and_then(|s| s.property(name))
        .map_or(TypeTag::String, Schema::type_tag);
    invalid_type_sentinel(tag).unwrap_or_else(|| json!("invalid"))
}

/// All `r`-element combinations of `items`, lexicographic by position.
fn combinations<'a>(items: &[&'a str], r: usize) -> Vec<Vec<&'a str>> {
    let n = items.len();
    if r == 0 || r > n {
        return Vec::new();
    }
    let mut out = Vec::new();
    let mut idx: Vec<usize> = (0..r).collect();
    loop {
        out.push(idx.iter().map(|&i| items[i]).collect());

        // rightmost index that can still advance
        let Some(pos) = (0..r).rev().find(|&i| idx[i] != i + n - r) else {
            return out;
        };
        idx[pos] += 1;
        for j in pos + 1..r {
            idx[j] = idx[j - 1] + 1;
        }
    }
}
