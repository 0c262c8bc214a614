//! Helpers over `serde_json::Value` configuration trees.

use figment::providers::Serialized;
use figment::Figment;
use serde_json::{Map, Value};

/// Stack configuration layers, lowest precedence first.
///
/// Objects merge key by key; arrays and scalars from a later layer replace
/// earlier ones. Every layer must be a JSON object.
pub fn layered<'a>(
    layers: impl IntoIterator<Item = &'a Value>,
) -> Result<Value, figment::Error> {
    layers
        .into_iter()
        .fold(Figment::new(), |figment, layer| {
            figment.merge(Serialized::defaults(layer))
        })
        .extract()
}

/// Look up a nested value by key path.
///
/// Segments are separated by `/` or `.`; numeric segments index into arrays.
/// An empty path returns the root. Missing segments yield `None`.
pub fn get_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split(['/', '.'])
        .filter(|segment| !segment.is_empty())
        .try_fold(value, |current, segment| match current {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })
}

/// Set a nested value, creating intermediate objects as needed.
///
/// Non-object intermediate values are replaced by objects.
pub fn set_path(value: &mut Value, path: &str, new_value: Value) {
    let segments: Vec<&str> = path.split(['/', '.']).filter(|s| !s.is_empty()).collect();
    let root = std::mem::take(value);
    *value = with_path(root, &segments, new_value);
}

fn with_path(value: Value, segments: &[&str], new_value: Value) -> Value {
    let Some((first, rest)) = segments.split_first() else {
        return new_value;
    };
    let mut map = match value {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    let child = map.remove(*first).unwrap_or(Value::Null);
    map.insert((*first).to_string(), with_path(child, rest, new_value));
    Value::Object(map)
}

/// Copy of `value` without the given top-level keys.
pub fn without_keys(value: &Value, keys: &[&str]) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .filter(|(key, _)| !keys.contains(&key.as_str()))
                .map(|(key, v)| (key.clone(), v.clone()))
                .collect(),
        ),
        other => other.clone(),
    }
}
