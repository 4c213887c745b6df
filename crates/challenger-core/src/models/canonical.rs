use serde::Serialize;
use serde_json::{Map, Value};

/// Serialize `value` as compact JSON with every object's keys in sorted order.
///
/// Sorting is done explicitly rather than relying on `serde_json::Map`
/// ordering, which becomes insertion order when `preserve_order` is enabled
/// anywhere in the dependency graph.
pub fn to_canonical_string<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<String> {
    let value = serde_json::to_value(value)?;
    serde_json::to_string(&sort_keys(value))
}

fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            let mut sorted = Map::new();
            for (key, value) in entries {
                sorted.insert(key, sort_keys(value));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_nested_keys_sorted_and_compact() {
        let value = json!({"b": 1, "a": {"z": [ {"y": 1, "x": 2} ], "c": null}});
        assert_eq!(
            to_canonical_string(&value).unwrap(),
            r#"{"a":{"c":null,"z":[{"x":2,"y":1}]},"b":1}"#
        );
    }

    #[test]
    fn test_arrays_keep_order() {
        let value = json!([3, 1, 2]);
        assert_eq!(to_canonical_string(&value).unwrap(), "[3,1,2]");
    }
}
