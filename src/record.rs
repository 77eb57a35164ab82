//! Level records and their canonical on-disk JSON form.
//!
//! A record is an opaque JSON mapping with two fields the sync pipeline cares
//! about: `id` (document key and filename stem) and `order` (pull-time sort
//! key). Local files additionally carry `uuid`, a copy of `id`.
//!
//! Serialization is deterministic: keys are sorted at every nesting level and
//! indentation is fixed at four spaces, so pulling an unchanged collection
//! twice produces byte-identical files.

use std::cmp::Ordering;
use std::path::Path;

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::{Map, Value};

use crate::sync::SyncError;

const ID_FIELD: &str = "id";
const UUID_FIELD: &str = "uuid";
const ORDER_FIELD: &str = "order";

/// One puzzle level as persisted in the collection.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelRecord {
    id: String,
    /// Every field except `id` and `uuid`
    fields: Map<String, Value>,
}

impl LevelRecord {
    /// Builds a record from a document key and its body.
    ///
    /// Any `id` or `uuid` inside the body is dropped in favour of the key.
    pub fn new(id: impl Into<String>, mut fields: Map<String, Value>) -> Self {
        fields.remove(ID_FIELD);
        fields.remove(UUID_FIELD);
        Self {
            id: id.into(),
            fields,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Numeric sort key, if the record has one.
    pub fn order(&self) -> Option<f64> {
        self.fields.get(ORDER_FIELD).and_then(Value::as_f64)
    }

    /// Name of the mirror file holding this record.
    pub fn file_name(&self) -> String {
        format!("{}.json", self.id)
    }

    /// Body stored in the remote collection: the fields plus `id`, never `uuid`.
    pub fn remote_body(&self) -> Map<String, Value> {
        let mut body = self.fields.clone();
        body.insert(ID_FIELD.to_string(), Value::String(self.id.clone()));
        body
    }

    /// Local representation: the remote body plus `uuid`.
    fn local_body(&self) -> Map<String, Value> {
        let mut body = self.remote_body();
        body.insert(UUID_FIELD.to_string(), Value::String(self.id.clone()));
        body
    }

    /// Ascending by `order`; records without a numeric order go last.
    pub fn cmp_by_order(&self, other: &Self) -> Ordering {
        match (self.order(), other.order()) {
            (Some(a), Some(b)) => a.total_cmp(&b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }
}

/// Sorts records for pull, keeping fetch order among equal keys.
pub fn sort_by_order(records: &mut [LevelRecord]) {
    // slice::sort_by is stable
    records.sort_by(LevelRecord::cmp_by_order);
}

/// Encodes a record as canonical JSON: sorted keys, four-space indent.
pub fn serialize(record: &LevelRecord) -> String {
    let value = sorted(&Value::Object(record.local_body()));

    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value
        .serialize(&mut ser)
        .expect("serializing a JSON value into memory cannot fail");

    String::from_utf8(buf).expect("serde_json emits UTF-8")
}

/// Rebuilds `value` with object keys in byte order at every level.
///
/// Map iteration order depends on serde_json features, so it is never relied on.
fn sorted(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.clone(), sorted(v)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.iter().map(sorted).collect()),
        other => other.clone(),
    }
}

/// Parses mirror file text back into a record.
///
/// `fallback_id` is used when the text has no `id` field (normally the file
/// stem). `path` only labels errors.
pub fn deserialize(
    text: &str,
    fallback_id: Option<&str>,
    path: &Path,
) -> Result<LevelRecord, SyncError> {
    let value: Value = serde_json::from_str(text)
        .map_err(|e| SyncError::malformed(path, format!("invalid JSON: {}", e)))?;

    let Value::Object(fields) = value else {
        return Err(SyncError::malformed(path, "expected a JSON object"));
    };

    let id = match fields.get(ID_FIELD) {
        Some(Value::String(id)) if !id.is_empty() => id.clone(),
        Some(Value::String(_)) => return Err(SyncError::malformed(path, "empty id")),
        Some(_) => return Err(SyncError::malformed(path, "id must be a string")),
        None => match fallback_id {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => return Err(SyncError::malformed(path, "missing id")),
        },
    };

    // A slash would address a nested document in the remote store.
    if id.contains('/') {
        return Err(SyncError::malformed(
            path,
            format!("id '{}' must not contain '/'", id),
        ));
    }

    Ok(LevelRecord::new(id, fields))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::path::PathBuf;

    fn record(id: &str, body: Value) -> LevelRecord {
        match body {
            Value::Object(fields) => LevelRecord::new(id, fields),
            _ => panic!("test body must be an object"),
        }
    }

    fn path() -> PathBuf {
        PathBuf::from("levels/test.json")
    }

    #[test]
    fn test_serialize_sorts_keys_and_indents() {
        let r = record("lvl-1", json!({"theme": "forest", "order": 1, "board": [1, 2]}));
        let text = serialize(&r);

        let expected = "{\n    \"board\": [\n        1,\n        2\n    ],\n    \"id\": \"lvl-1\",\n    \"order\": 1,\n    \"theme\": \"forest\",\n    \"uuid\": \"lvl-1\"\n}";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_serialize_ignores_insertion_order() {
        let mut a = Map::new();
        a.insert("zeta".to_string(), json!(1));
        a.insert("alpha".to_string(), json!({"y": 1, "x": 2}));

        let mut b = Map::new();
        b.insert("alpha".to_string(), json!({"x": 2, "y": 1}));
        b.insert("zeta".to_string(), json!(1));

        assert_eq!(
            serialize(&LevelRecord::new("same", a)),
            serialize(&LevelRecord::new("same", b))
        );
    }

    #[test]
    fn test_serialize_adds_uuid_equal_to_id() {
        let r = record("abc", json!({"order": 3}));
        let value: Value = serde_json::from_str(&serialize(&r)).unwrap();
        assert_eq!(value["id"], "abc");
        assert_eq!(value["uuid"], "abc");
    }

    #[test]
    fn test_roundtrip() {
        let r = record(
            "castle-07",
            json!({
                "order": 7,
                "difficulty": 2.5,
                "locked": false,
                "hint": null,
                "grid": {"rows": 4, "cols": 4, "cells": ["a", "b", {"wall": true}]}
            }),
        );

        let parsed = deserialize(&serialize(&r), None, &path()).unwrap();
        assert_eq!(parsed, r);
    }

    #[test]
    fn test_deserialize_invalid_json() {
        let err = deserialize("{ not json", None, &path()).unwrap_err();
        assert!(matches!(err, SyncError::MalformedRecord { .. }));
        assert!(err.to_string().contains("invalid JSON"));
    }

    #[test]
    fn test_deserialize_rejects_non_object() {
        let err = deserialize("[1, 2, 3]", Some("x"), &path()).unwrap_err();
        assert!(matches!(err, SyncError::MalformedRecord { .. }));
    }

    #[test]
    fn test_deserialize_rejects_non_string_id() {
        let err = deserialize(r#"{"id": 5}"#, Some("x"), &path()).unwrap_err();
        assert!(err.to_string().contains("id must be a string"));
    }

    #[test]
    fn test_deserialize_uses_fallback_id() {
        let r = deserialize(r#"{"order": 1}"#, Some("from-stem"), &path()).unwrap();
        assert_eq!(r.id(), "from-stem");
    }

    #[test]
    fn test_deserialize_missing_id_without_fallback() {
        let err = deserialize(r#"{"order": 1}"#, None, &path()).unwrap_err();
        assert!(err.to_string().contains("missing id"));
    }

    #[test]
    fn test_deserialize_rejects_slash_in_id() {
        let err = deserialize(r#"{"id": "world/1", "order": 1}"#, None, &path()).unwrap_err();
        assert!(matches!(err, SyncError::MalformedRecord { .. }));
        assert!(err.to_string().contains("must not contain '/'"));
    }

    #[test]
    fn test_remote_body_excludes_uuid() {
        let r = deserialize(r#"{"id": "a", "uuid": "a", "order": 2}"#, None, &path()).unwrap();
        let body = r.remote_body();
        assert_eq!(body.get("id"), Some(&json!("a")));
        assert!(!body.contains_key("uuid"));
    }

    #[test]
    fn test_sort_by_order_is_stable() {
        let mut records = vec![
            record("c", json!({"order": 3})),
            record("none-1", json!({})),
            record("a1", json!({"order": 1})),
            record("b", json!({"order": 2})),
            record("a2", json!({"order": 1.0})),
            record("none-2", json!({"order": "high"})),
        ];

        sort_by_order(&mut records);

        let ids: Vec<&str> = records.iter().map(LevelRecord::id).collect();
        assert_eq!(ids, vec!["a1", "a2", "b", "c", "none-1", "none-2"]);
    }

    #[test]
    fn test_file_name() {
        assert_eq!(record("b", json!({})).file_name(), "b.json");
    }
}
