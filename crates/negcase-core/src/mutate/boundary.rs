//! Off-by-one boundary violations for top-level body fields

use serde_json::{Number, Value, json};

use crate::operation::{Operation, Variant, VariantKind};
use crate::path::{self, FieldPath};
use crate::schema::{NumericBounds, Schema, SchemaKind};

/// Longest string a boundary case will build. An above-maxLength case that
/// would need more is not generated.
const MAX_STRING_LEN: usize = 10_000;

/// One variant per violated side of each declared length/range bound.
#[must_use]
pub fn boundary_variants(op: &Operation, base_body: &Value, schema: &Schema) -> Vec<Variant> {
    let mut variants = Vec::new();

    for (name, prop) in schema.properties() {
        let field_path = FieldPath::root().child(name.as_str());
        let mut push = |description: String, value: Value| {
            variants.push(
                Variant::from_operation(op, VariantKind::Boundary, description)
                    .with_body(path::set(base_body, &field_path, value)),
            );
        };

        match &prop.kind {
            SchemaKind::String {
                min_length,
                max_length,
            } => {
                if let Some(min) = min_length.filter(|m| *m > 0) {
                    push(
                        format!("Below minLength boundary for '{name}'"),
                        json!(filler(min - 1)),
                    );
                }
                let above = max_length
                    .and_then(|max| usize::try_from(max).ok())
                    .and_then(|max| max.checked_add(1))
                    .filter(|len| *len <= MAX_STRING_LEN);
                if let Some(len) = above {
                    push(
                        format!("Above maxLength boundary for '{name}'"),
                        json!("a".repeat(len)),
                    );
                }
            }
            SchemaKind::Integer(bounds) | SchemaKind::Number(bounds) => {
                let NumericBounds { minimum, maximum } = bounds;
                let below = minimum
                    .as_ref()
                    .filter(|m| is_positive(m))
                    .and_then(|m| shift(m, -1));
                if let Some(below) = below {
                    push(format!("Below minimum boundary for '{name}'"), below);
                }
                if let Some(above) = maximum.as_ref().and_then(|m| shift(m, 1)) {
                    push(format!("Above maximum boundary for '{name}'"), above);
                }
            }
            _ => {}
        }
    }

    variants
}

/// Shorter than a huge minLength is still below it, so this one may cap.
fn filler(len: u64) -> String {
    let len = usize::try_from(len).unwrap_or(MAX_STRING_LEN).min(MAX_STRING_LEN);
    "a".repeat(len)
}

fn is_positive(n: &Number) -> bool {
    n.as_f64().is_some_and(|v| v > 0.0)
}

/// `n + delta`, keeping integers as integers. `None` when an integer
/// result fits neither `i64` nor `u64`.
fn shift(n: &Number, delta: i64) -> Option<Value> {
    if let Some(i) = n.as_i64().and_then(|i| i.checked_add(delta)) {
        return Some(Value::from(i));
    }
    if let Some(u) = n.as_u64().and_then(|u| u.checked_add_signed(delta)) {
        return Some(Value::from(u));
    }
    if !n.is_f64() {
        return None;
    }
    n.as_f64()
        .and_then(|f| Number::from_f64(f + delta as f64))
        .map(Value::Number)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(raw_schema: Value, body: Value) -> Vec<Variant> {
        let schema = Schema::resolve(&raw_schema, &json!({}));
        let mut op = Operation::new("POST", "/things", "http://localhost/things");
        op.body = Some(body.clone());
        boundary_variants(&op, &body, &schema)
    }

    #[test]
    fn string_length_off_by_one() {
        let v = run(
            json!({"type": "object", "properties": {"code": {"type": "string", "minLength": 3, "maxLength": 5}}}),
            json!({"code": "abcd"}),
        );
        assert_eq!(v.len(), 2);
        assert_eq!(v[0].description, "Below minLength boundary for 'code'");
        assert_eq!(v[0].body, Some(json!({"code": "aa"})));
        assert_eq!(v[1].description, "Above maxLength boundary for 'code'");
        assert_eq!(v[1].body, Some(json!({"code": "aaaaaa"})));
    }

    #[test]
    fn numeric_range_off_by_one() {
        let v = run(
            json!({"type": "object", "properties": {"qty": {"type": "integer", "minimum": 1, "maximum": 10}}}),
            json!({"qty": 5}),
        );
        assert_eq!(v[0].body, Some(json!({"qty": 0})));
        assert_eq!(v[1].body, Some(json!({"qty": 11})));
    }

    #[test]
    fn fractional_bounds_stay_floats() {
        let v = run(
            json!({"type": "object", "properties": {"ratio": {"type": "number", "minimum": 0.5, "maximum": 2.5}}}),
            json!({"ratio": 1.0}),
        );
        assert_eq!(v[0].body, Some(json!({"ratio": -0.5})));
        assert_eq!(v[1].body, Some(json!({"ratio": 3.5})));
    }

    #[test]
    fn zero_and_absent_bounds_produce_nothing_on_that_side() {
        let v = run(
            json!({"type": "object", "properties": {
                "s": {"type": "string", "minLength": 0},
                "n": {"type": "integer", "minimum": 0},
                "b": {"type": "boolean"}
            }}),
            json!({"s": "", "n": 0, "b": true}),
        );
        assert!(v.is_empty());
    }

    #[test]
    fn zero_maximum_still_violated() {
        let v = run(
            json!({"type": "object", "properties": {"n": {"type": "integer", "maximum": 0}}}),
            json!({"n": 0}),
        );
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].body, Some(json!({"n": 1})));
    }

    #[test]
    fn above_max_length_skipped_past_cap() {
        let v = run(
            json!({"type": "object", "properties": {
                "s": {"type": "string", "maxLength": 20_000},
                "t": {"type": "string", "maxLength": MAX_STRING_LEN - 1}
            }}),
            json!({"s": "", "t": ""}),
        );
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].description, "Above maxLength boundary for 't'");
        let len = v[0].body.as_ref().unwrap()["t"].as_str().unwrap().len();
        assert_eq!(len, MAX_STRING_LEN);
    }

    #[test]
    fn huge_min_length_still_below() {
        let v = run(
            json!({"type": "object", "properties": {"s": {"type": "string", "minLength": 50_000}}}),
            json!({"s": ""}),
        );
        assert_eq!(v.len(), 1);
        let len = v[0].body.as_ref().unwrap()["s"].as_str().unwrap().len();
        assert!(len < 50_000);
    }

    #[test]
    fn integer_maximum_at_i64_limit() {
        let v = run(
            json!({"type": "object", "properties": {
                "n": {"type": "integer", "maximum": i64::MAX},
                "u": {"type": "integer", "maximum": u64::MAX}
            }}),
            json!({"n": 0, "u": 0}),
        );
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].description, "Above maximum boundary for 'n'");
        assert_eq!(v[0].body, Some(json!({"n": 9_223_372_036_854_775_808_u64, "u": 0})));
    }
}
