//! Path expressions for reading and writing nested JSON.
//!
//! A path is a dot-separated list of segments:
//!
//! - `key`: object member
//! - `key[0]`: first element of the array at `key`, created as `[{}]` when absent
//! - `key[]`: every element of the array at `key`. Writing a list broadcasts it
//!   element-wise (creating the array when absent); writing any other value copies
//!   it into every existing element.
//! - `_self`: the current object. Writing an object merges its members in.
//!
//! Writes never silently clobber: setting a key that already holds a different,
//! non-object value is an error. Object-over-object writes merge shallowly.

use genai_core::{GenAiError, Result};
use serde_json::{Map, Value};

/// Path that refers to the current object.
pub const SELF: &str = "_self";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Segment<'a> {
    Key(&'a str),
    First(&'a str),
    Each(&'a str),
    SelfRef,
}

fn parse(path: &str) -> Vec<Segment<'_>> {
    path.split('.')
        .map(|seg| {
            if seg == SELF {
                Segment::SelfRef
            } else if let Some(key) = seg.strip_suffix("[]") {
                Segment::Each(key)
            } else if let Some(key) = seg.strip_suffix("[0]") {
                Segment::First(key)
            } else {
                Segment::Key(seg)
            }
        })
        .collect()
}

fn conflict(path: &str, key: &str) -> GenAiError {
    GenAiError::invalid_request(format!(
        "cannot set value for an existing key '{key}' (path '{path}')"
    ))
}

// ─────────────────────────────────────────────────────────────────────────────
// Read
// ─────────────────────────────────────────────────────────────────────────────

/// Read the value at `path`. Missing members and JSON `null` both read as `None`.
///
/// A `[]` segment maps the rest of the path over the array; elements without the
/// value yield `null` so positions stay aligned.
pub fn get_value_by_path(data: &Value, path: &str) -> Option<Value> {
    get_segments(data, &parse(path)).filter(|v| !v.is_null())
}

fn get_segments(data: &Value, segments: &[Segment<'_>]) -> Option<Value> {
    let Some((first, rest)) = segments.split_first() else {
        return Some(data.clone());
    };
    match *first {
        Segment::SelfRef => get_segments(data, rest),
        Segment::Key(key) => get_segments(data.get(key)?, rest),
        Segment::First(key) => get_segments(data.get(key)?.as_array()?.first()?, rest),
        Segment::Each(key) => {
            let items = data.get(key)?.as_array()?;
            Some(Value::Array(
                items
                    .iter()
                    .map(|item| get_segments(item, rest).unwrap_or(Value::Null))
                    .collect(),
            ))
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Write
// ─────────────────────────────────────────────────────────────────────────────

/// Write `value` at `path`, creating intermediate objects and arrays as needed.
///
/// Writing `null` is a no-op.
pub fn set_value_by_path(data: &mut Value, path: &str, value: Value) -> Result<()> {
    set_segments(data, &parse(path), value, path)
}

fn as_object<'v>(data: &'v mut Value, path: &str) -> Result<&'v mut Map<String, Value>> {
    match data {
        Value::Object(map) => Ok(map),
        _ => Err(GenAiError::invalid_request(format!(
            "path '{path}' crosses a non-object value"
        ))),
    }
}

fn set_segments(data: &mut Value, segments: &[Segment<'_>], value: Value, path: &str) -> Result<()> {
    if value.is_null() {
        return Ok(());
    }
    if data.is_null() {
        *data = Value::Object(Map::new());
    }
    let Some((first, rest)) = segments.split_first() else {
        return Err(GenAiError::invalid_request("empty path"));
    };

    match *first {
        Segment::SelfRef if rest.is_empty() => merge_self(data, value, path),
        Segment::SelfRef => set_segments(data, rest, value, path),
        Segment::Key(key) if rest.is_empty() => set_leaf(as_object(data, path)?, key, value, path),
        Segment::First(_) | Segment::Each(_) if rest.is_empty() => Err(GenAiError::invalid_request(
            format!("path '{path}' may not end with an array segment"),
        )),
        Segment::Key(key) => {
            let child = as_object(data, path)?
                .entry(key)
                .or_insert_with(|| Value::Object(Map::new()));
            set_segments(child, rest, value, path)
        }
        Segment::First(key) => {
            let child = as_object(data, path)?
                .entry(key)
                .or_insert_with(|| Value::Array(vec![Value::Object(Map::new())]));
            let Value::Array(items) = child else {
                return Err(conflict(path, key));
            };
            if items.is_empty() {
                items.push(Value::Object(Map::new()));
            }
            set_segments(&mut items[0], rest, value, path)
        }
        Segment::Each(key) => {
            let map = as_object(data, path)?;
            if !map.contains_key(key) {
                let Value::Array(values) = &value else {
                    return Err(GenAiError::invalid_request(format!(
                        "value must be a list given an array path '{path}'"
                    )));
                };
                let empty = vec![Value::Object(Map::new()); values.len()];
                let _ = map.insert(key.to_string(), Value::Array(empty));
            }
            let Some(Value::Array(items)) = map.get_mut(key) else {
                return Ok(());
            };
            match value {
                Value::Array(values) => {
                    if values.len() != items.len() {
                        return Err(GenAiError::invalid_request(format!(
                            "path '{path}' got {} values for {} existing elements",
                            values.len(),
                            items.len()
                        )));
                    }
                    for (item, v) in items.iter_mut().zip(values) {
                        set_segments(item, rest, v, path)?;
                    }
                }
                other => {
                    for item in items.iter_mut() {
                        set_segments(item, rest, other.clone(), path)?;
                    }
                }
            }
            Ok(())
        }
    }
}

fn merge_self(data: &mut Value, value: Value, path: &str) -> Result<()> {
    match (data, value) {
        (Value::Object(target), Value::Object(source)) => {
            for (k, v) in source {
                let _ = target.insert(k, v);
            }
            Ok(())
        }
        _ => Err(GenAiError::invalid_request(format!(
            "'{path}' requires an object value"
        ))),
    }
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(false) => true,
        Value::String(s) => s.is_empty(),
        Value::Object(m) => m.is_empty(),
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::Bool(true) | Value::Array(_) => false,
    }
}

fn set_leaf(map: &mut Map<String, Value>, key: &str, value: Value, path: &str) -> Result<()> {
    let Some(existing) = map.get_mut(key) else {
        let _ = map.insert(key.to_string(), value);
        return Ok(());
    };
    if is_empty(&value) || *existing == value {
        return Ok(());
    }
    match (existing, value) {
        (Value::Object(target), Value::Object(source)) => {
            for (k, v) in source {
                let _ = target.insert(k, v);
            }
            Ok(())
        }
        _ => Err(conflict(path, key)),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
