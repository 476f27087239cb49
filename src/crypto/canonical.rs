//! Canonical JSON encoding for signed payloads.
//!
//! Signed bytes must not depend on map iteration order. Objects are rebuilt
//! with their keys in sorted order at every nesting level and written in
//! compact form (no whitespace). `serde_json` may be compiled with
//! `preserve_order` by another crate in the dependency graph, so the sort is
//! done explicitly here.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::Result;

/// Recursively sort object keys.
pub fn canonicalize(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let sorted: BTreeMap<String, Value> = map
                .into_iter()
                .map(|(k, v)| (k, canonicalize(v)))
                .collect();
            let mut out = Map::new();
            for (k, v) in sorted {
                out.insert(k, v);
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(canonicalize).collect()),
        other => other,
    }
}

/// Serialize `value` to canonical JSON bytes.
pub fn to_canonical_vec<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    let tree = serde_json::to_value(value)?;
    Ok(serde_json::to_vec(&canonicalize(tree))?)
}
