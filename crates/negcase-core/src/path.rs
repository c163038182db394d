//! Path addressing inside mixed map/array JSON documents
//!
//! `set` and `delete` are pure: they return a new document and never touch
//! the input. Structural mismatches are coerced (`set`) or ignored
//! (`delete`), never reported.

use std::fmt;

use serde_json::{Map, Value};

/// One step of a [`FieldPath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Map key
    Key(String),
    /// Array index
    Index(usize),
}

impl From<&str> for Segment {
    fn from(key: &str) -> Self {
        Self::Key(key.to_string())
    }
}

impl From<usize> for Segment {
    fn from(idx: usize) -> Self {
        Self::Index(idx)
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(k) => f.write_str(k),
            Self::Index(i) => write!(f, "{i}"),
        }
    }
}

/// Location of a value in a request body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FieldPath(Vec<Segment>);

impl FieldPath {
    #[must_use]
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Extend with one more segment, returning a new path.
    #[must_use]
    pub fn child(&self, segment: impl Into<Segment>) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment.into());
        Self(segments)
    }

    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.0
    }

    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<Segment>> for FieldPath {
    fn from(segments: Vec<Segment>) -> Self {
        Self(segments)
    }
}

/// Dotted rendering used in variant descriptions: `items.0.name`.
impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, seg) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{seg}")?;
        }
        Ok(())
    }
}

/// Read the value at `path`, if every segment resolves.
#[must_use]
pub fn get<'a>(doc: &'a Value, path: &FieldPath) -> Option<&'a Value> {
    path.segments()
        .iter()
        .try_fold(doc, |cur, seg| match (seg, cur) {
            (Segment::Key(k), Value::Object(map)) => map.get(k),
            (Segment::Index(i), Value::Array(arr)) => arr.get(*i),
            _ => None,
        })
}

/// Return a copy of `doc` with `value` written at `path`.
///
/// Missing or mismatched intermediate structure is replaced by an empty
/// container of the kind the next segment needs. Arrays are padded with
/// empty maps (or `null` at the final segment) until the index exists.
#[must_use]
pub fn set(doc: &Value, path: &FieldPath, value: Value) -> Value {
    let mut out = doc.clone();
    set_in_place(&mut out, path.segments(), value);
    out
}

fn set_in_place(cur: &mut Value, segments: &[Segment], value: Value) {
    let Some((seg, rest)) = segments.split_first() else {
        *cur = value;
        return;
    };
    let is_last = rest.is_empty();

    match seg {
        Segment::Key(key) => {
            if !cur.is_object() {
                *cur = Value::Object(Map::new());
            }
            let Value::Object(map) = cur else {
                return;
            };
            if is_last {
                map.insert(key.clone(), value);
                return;
            }
            let slot = map
                .entry(key.clone())
                .or_insert_with(|| Value::Object(Map::new()));
            if !slot.is_object() && !slot.is_array() {
                *slot = Value::Object(Map::new());
            }
            set_in_place(slot, rest, value);
        }
        Segment::Index(idx) => {
            if !cur.is_array() {
                *cur = Value::Array(Vec::new());
            }
            let Value::Array(arr) = cur else {
                return;
            };
            while arr.len() <= *idx {
                arr.push(if is_last {
                    Value::Null
                } else {
                    Value::Object(Map::new())
                });
            }
            if is_last {
                arr[*idx] = value;
                return;
            }
            let slot = &mut arr[*idx];
            if !slot.is_object() && !slot.is_array() {
                *slot = Value::Object(Map::new());
            }
            set_in_place(slot, rest, value);
        }
    }
}

/// Return a copy of `doc` without the value at `path`.
///
/// If any segment fails to resolve the copy is returned unchanged.
#[must_use]
pub fn delete(doc: &Value, path: &FieldPath) -> Value {
    let mut out = doc.clone();
    if let Some((last, parents)) = path.segments().split_last() {
        delete_in_place(&mut out, parents, last);
    }
    out
}

fn delete_in_place(cur: &mut Value, parents: &[Segment], last: &Segment) {
    let Some((seg, rest)) = parents.split_first() else {
        match (last, cur) {
            (Segment::Key(k), Value::Object(map)) => {
                map.shift_remove(k);
            }
            (Segment::Index(i), Value::Array(arr)) if *i < arr.len() => {
                arr.remove(*i);
            }
            _ => {}
        }
        return;
    };

    let next = match (seg, cur) {
        (Segment::Key(k), Value::Object(map)) => map.get_mut(k),
        (Segment::Index(i), Value::Array(arr)) => arr.get_mut(*i),
        _ => None,
    };
    if let Some(next) = next {
        delete_in_place(next, rest, last);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn p(segments: Vec<Segment>) -> FieldPath {
        FieldPath::from(segments)
    }

    #[test]
    fn set_top_level_key() {
        let doc = json!({"a": 1, "b": 2});
        let out = set(&doc, &p(vec!["a".into()]), json!("x"));
        assert_eq!(out, json!({"a": "x", "b": 2}));
        assert_eq!(doc, json!({"a": 1, "b": 2}), "input must be untouched");
    }

    #[test]
    fn set_nested_through_array() {
        let doc = json!({"items": [{"name": "n0"}, {"name": "n1"}]});
        let out = set(
            &doc,
            &p(vec!["items".into(), 1.into(), "name".into()]),
            json!(""),
        );
        assert_eq!(out, json!({"items": [{"name": "n0"}, {"name": ""}]}));
    }

    #[test]
    fn set_coerces_scalar_into_map() {
        let doc = json!({"a": 5});
        let out = set(&doc, &p(vec!["a".into(), "b".into()]), json!(true));
        assert_eq!(out, json!({"a": {"b": true}}));
    }

    #[test]
    fn set_coerces_map_into_array() {
        let doc = json!({"a": {"x": 1}});
        let out = set(&doc, &p(vec!["a".into(), 0.into()]), json!(7));
        assert_eq!(out, json!({"a": [7]}));
    }

    #[test]
    fn set_pads_arrays() {
        let doc = json!({"a": []});
        let out = set(&doc, &p(vec!["a".into(), 2.into()]), json!(1));
        assert_eq!(out, json!({"a": [null, null, 1]}));

        let out = set(&doc, &p(vec!["a".into(), 1.into(), "k".into()]), json!(1));
        assert_eq!(out, json!({"a": [{}, {"k": 1}]}));
    }

    #[test]
    fn set_creates_missing_intermediate() {
        let out = set(&json!({}), &p(vec!["a".into(), "b".into()]), json!(1));
        assert_eq!(out, json!({"a": {"b": 1}}));
    }

    #[test]
    fn set_root_replaces_document() {
        let out = set(&json!({"a": 1}), &FieldPath::root(), json!([1]));
        assert_eq!(out, json!([1]));
    }

    #[test]
    fn delete_existing_key() {
        let doc = json!({"id": "ab12", "name": "x"});
        let out = delete(&doc, &p(vec!["id".into()]));
        assert_eq!(out, json!({"name": "x"}));
        assert_eq!(doc["id"], "ab12");
    }

    #[test]
    fn delete_keeps_key_order() {
        let doc = json!({"c": 1, "a": 2, "b": 3});
        let out = delete(&doc, &p(vec!["c".into()]));
        let keys: Vec<&String> = out.as_object().unwrap().keys().collect();
        assert_eq!(keys, ["a", "b"]);
    }

    #[test]
    fn delete_array_element_shifts() {
        let doc = json!({"a": [1, 2, 3]});
        let out = delete(&doc, &p(vec!["a".into(), 0.into()]));
        assert_eq!(out, json!({"a": [2, 3]}));
    }

    #[test]
    fn delete_missing_path_is_noop() {
        let doc = json!({"a": {"b": [1]}});
        for path in [
            p(vec!["zz".into()]),
            p(vec!["a".into(), "c".into()]),
            p(vec!["a".into(), "b".into(), 5.into()]),
            p(vec!["a".into(), 0.into()]),
            p(vec!["a".into(), "b".into(), 0.into(), "deep".into()]),
            FieldPath::root(),
        ] {
            assert_eq!(delete(&doc, &path), doc, "path {path}");
        }
    }

    #[test]
    fn get_resolves_nested() {
        let doc = json!({"a": [{"b": 3}]});
        assert_eq!(
            get(&doc, &p(vec!["a".into(), 0.into(), "b".into()])),
            Some(&json!(3))
        );
        assert_eq!(get(&doc, &p(vec!["a".into(), "b".into()])), None);
    }

    #[test]
    fn display_is_dotted() {
        let path = FieldPath::root().child("items").child(0).child("name");
        assert_eq!(path.to_string(), "items.0.name");
    }
}
