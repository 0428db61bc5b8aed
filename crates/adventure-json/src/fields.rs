//! Typed field lookups on raw JSON objects.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

use crate::error::JsonError;
use crate::JsonMap;

/// Read a field that must be present and well-formed.
pub fn required<T: DeserializeOwned>(
    json: &JsonMap,
    type_name: &'static str,
    key: &str,
) -> Result<T, JsonError> {
    match json.get(key) {
        None | Some(Value::Null) => Err(JsonError::MissingField {
            type_name,
            key: key.to_string(),
        }),
        Some(value) => {
            T::deserialize(value).map_err(|e| JsonError::invalid(type_name, key, e))
        }
    }
}

/// Read a field that may be absent. A present but malformed value is logged
/// and treated as absent.
pub fn optional<T: DeserializeOwned>(json: &JsonMap, type_name: &'static str, key: &str) -> Option<T> {
    match json.get(key) {
        None | Some(Value::Null) => None,
        Some(value) => match T::deserialize(value) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                warn!(type_name, key, "{type_name} parse error: invalid \"{key}\": {e}");
                None
            }
        },
    }
}

/// Read a nested object that must be present.
pub fn required_object<'a>(
    json: &'a JsonMap,
    type_name: &'static str,
    key: &str,
) -> Result<&'a JsonMap, JsonError> {
    match json.get(key) {
        None | Some(Value::Null) => Err(JsonError::MissingField {
            type_name,
            key: key.to_string(),
        }),
        Some(Value::Object(map)) => Ok(map),
        Some(_) => Err(JsonError::invalid(type_name, key, "expected an object")),
    }
}

/// Read a nested array that must be present.
pub fn required_array<'a>(
    json: &'a JsonMap,
    type_name: &'static str,
    key: &str,
) -> Result<&'a [Value], JsonError> {
    match json.get(key) {
        None | Some(Value::Null) => Err(JsonError::MissingField {
            type_name,
            key: key.to_string(),
        }),
        Some(Value::Array(items)) => Ok(items),
        Some(_) => Err(JsonError::invalid(type_name, key, "expected an array")),
    }
}

/// Move the value under `from` to `to`, if `from` exists and `to` does not.
/// The usual shape of a rename in a version correcter.
pub fn rename_key(json: &mut JsonMap, from: &str, to: &str) {
    if json.contains_key(to) {
        return;
    }
    if let Some(value) = json.remove(from) {
        json.insert(to.to_string(), value);
    }
}
