//! Conversion between plain JSON and Firestore's typed value encoding.
//!
//! Firestore wraps every value in a single-key object naming its type, e.g.
//! `{"integerValue": "7"}` or `{"mapValue": {"fields": {...}}}`.

use serde_json::{json, Map, Value};

/// Encodes a JSON value as a Firestore value.
pub fn to_firestore(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                json!({ "integerValue": i.to_string() })
            } else if let Some(u) = n.as_u64() {
                // Beyond i64 Firestore has no integer type; fall back to double.
                json!({ "doubleValue": u as f64 })
            } else {
                json!({ "doubleValue": n.as_f64() })
            }
        }
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => {
            let values: Vec<Value> = items.iter().map(to_firestore).collect();
            json!({ "arrayValue": { "values": values } })
        }
        Value::Object(map) => json!({ "mapValue": { "fields": fields_to_firestore(map) } }),
    }
}

/// Encodes a JSON object as a Firestore `fields` map.
pub fn fields_to_firestore(map: &Map<String, Value>) -> Map<String, Value> {
    map.iter()
        .map(|(k, v)| (k.clone(), to_firestore(v)))
        .collect()
}

/// Decodes a Firestore value into plain JSON.
pub fn from_firestore(value: &Value) -> Result<Value, String> {
    let Some(obj) = value.as_object() else {
        return Err(format!("expected a typed value object, got {}", value));
    };
    let Some((kind, inner)) = obj.iter().next() else {
        return Err("empty typed value".to_string());
    };

    match kind.as_str() {
        "nullValue" => Ok(Value::Null),
        "booleanValue" => inner
            .as_bool()
            .map(Value::Bool)
            .ok_or_else(|| format!("booleanValue is not a bool: {}", inner)),
        "integerValue" => {
            // Sent as a decimal string, but accept bare numbers too.
            let parsed = match inner {
                Value::String(s) => s.parse::<i64>().ok(),
                Value::Number(n) => n.as_i64(),
                _ => None,
            };
            parsed
                .map(Value::from)
                .ok_or_else(|| format!("invalid integerValue: {}", inner))
        }
        "doubleValue" => match inner {
            // Whole doubles arrive as `2` and come back out as integers, so a
            // pull then push stores them as integerValue.
            Value::Number(_) => Ok(inner.clone()),
            // NaN and infinities arrive as strings and have no JSON form.
            Value::String(s) => Err(format!("non-finite doubleValue: {}", s)),
            _ => Err(format!("invalid doubleValue: {}", inner)),
        },
        "stringValue" | "timestampValue" | "bytesValue" | "referenceValue" => match inner {
            Value::String(_) => Ok(inner.clone()),
            _ => Err(format!("{} is not a string: {}", kind, inner)),
        },
        "geoPointValue" => {
            let lat = inner.get("latitude").cloned().unwrap_or(json!(0.0));
            let lng = inner.get("longitude").cloned().unwrap_or(json!(0.0));
            Ok(json!({ "latitude": lat, "longitude": lng }))
        }
        "arrayValue" => {
            let items = match inner.get("values") {
                Some(Value::Array(items)) => items
                    .iter()
                    .map(from_firestore)
                    .collect::<Result<Vec<_>, _>>()?,
                // An empty array is sent as `{"arrayValue": {}}`.
                None => Vec::new(),
                Some(other) => return Err(format!("invalid arrayValue: {}", other)),
            };
            Ok(Value::Array(items))
        }
        "mapValue" => match inner.get("fields") {
            Some(Value::Object(fields)) => fields_from_firestore(fields).map(Value::Object),
            None => Ok(Value::Object(Map::new())),
            Some(other) => Err(format!("invalid mapValue: {}", other)),
        },
        other => Err(format!("unsupported value type: {}", other)),
    }
}

/// Decodes a Firestore `fields` map into a JSON object.
pub fn fields_from_firestore(fields: &Map<String, Value>) -> Result<Map<String, Value>, String> {
    fields
        .iter()
        .map(|(k, v)| from_firestore(v).map(|v| (k.clone(), v)))
        .collect()
}
