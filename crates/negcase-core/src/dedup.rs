//! Variant deduplication
//!
//! Two variants are the same test when they send the same headers, body and
//! parameter set. The key ignores which generator produced them, so merging
//! streams pairwise in any grouping yields the same suite.

use std::collections::HashSet;

use serde_json::{Map, Value};

use crate::operation::Variant;

/// Canonical identity of a variant: its request content rendered as compact
/// JSON with every object's keys sorted.
#[must_use]
pub fn canonical_key(variant: &Variant) -> String {
    let headers: Map<String, Value> = variant
        .headers
        .iter()
        .map(|(k, v)| (k.clone(), Value::String(v.clone())))
        .collect();
    let params: Map<String, Value> = variant
        .params
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    let mut key = String::new();
    write_sorted(&mut key, &Value::Object(headers));
    key.push('|');
    match &variant.body {
        Some(body) => write_sorted(&mut key, body),
        None => key.push('-'),
    }
    key.push('|');
    write_sorted(&mut key, &Value::Object(params));
    key
}

fn write_sorted(out: &mut String, value: &Value) {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_unstable_by(|a, b| a.0.cmp(b.0));
            out.push('{');
            for (i, (k, v)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(k.clone()).to_string());
                out.push(':');
                write_sorted(out, v);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_sorted(out, item);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

/// Concatenate `first` and `second`, keeping the first occurrence of each
/// canonical key.
#[must_use]
pub fn merge(first: Vec<Variant>, second: Vec<Variant>) -> Vec<Variant> {
    let mut seen = HashSet::new();
    first
        .into_iter()
        .chain(second)
        .filter(|v| seen.insert(canonical_key(v)))
        .collect()
}

/// Left fold of [`merge`] over `streams`.
#[must_use]
pub fn merge_all<I>(streams: I) -> Vec<Variant>
where
    I: IntoIterator<Item = Vec<Variant>>,
{
    streams.into_iter().fold(Vec::new(), merge)
}
