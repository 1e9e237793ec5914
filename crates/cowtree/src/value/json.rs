//! Conversion between [`Value`] and `serde_json::Value`.
//!
//! Objects become records and arrays become sequences. Going the other way,
//! sets encode as arrays, and maps encode as objects when every key is a
//! string, otherwise as an array of `[key, value]` pairs. Both directions
//! lose the map/set distinction, so `from_json(to_json(v))` only round-trips
//! values made of records, sequences and primitives.

use serde_json::Value as Json;

use super::{Key, Value};

/// Converts a JSON document into a [`Value`] tree.
pub fn from_json(json: &Json) -> Value {
    match json {
        Json::Null => Value::Null,
        Json::Bool(b) => Value::Bool(*b),
        Json::Number(n) => Value::Number(n.clone()),
        Json::String(s) => Value::from(s.as_str()),
        Json::Array(items) => Value::from_sequence(items.iter().map(from_json).collect()),
        Json::Object(map) => Value::from_record(
            map.iter()
                .map(|(k, v)| (k.clone(), from_json(v)))
                .collect(),
        ),
    }
}

/// Converts a [`Value`] tree into a JSON document.
pub fn to_json(value: &Value) -> Json {
    match value {
        Value::Null => Json::Null,
        Value::Bool(b) => Json::Bool(*b),
        Value::Number(n) => Json::Number(n.clone()),
        Value::String(s) => Json::String(s.to_string()),
        Value::Record(rc) => Json::Object(
            rc.iter()
                .map(|(k, v)| (k.clone(), to_json(v)))
                .collect(),
        ),
        Value::Sequence(rc) => Json::Array(rc.iter().map(to_json).collect()),
        Value::Set(rc) => Json::Array(rc.iter().map(|k| to_json(k.value())).collect()),
        Value::Map(rc) => {
            if rc.keys().all(|k| matches!(k.value(), Value::String(_))) {
                Json::Object(
                    rc.iter()
                        .map(|(k, v)| (k.value().as_str().unwrap_or_default().to_string(), to_json(v)))
                        .collect(),
                )
            } else {
                Json::Array(
                    rc.iter()
                        .map(|(k, v)| Json::Array(vec![to_json(k.value()), to_json(v)]))
                        .collect(),
                )
            }
        }
    }
}

/// Renders a map key or set member as a path key string.
///
/// Strings stay as they are, every other key uses its JSON text.
pub(crate) fn key_text(key: &Key) -> String {
    match key.value() {
        Value::String(s) => s.to_string(),
        other => to_json(other).to_string(),
    }
}

impl Value {
    pub fn from_json(json: &Json) -> Value {
        from_json(json)
    }

    pub fn to_json(&self) -> Json {
        to_json(self)
    }
}

impl From<Json> for Value {
    fn from(json: Json) -> Self {
        from_json(&json)
    }
}
