//! Stable JSON encoder for on-disk records.
//!
//! Saves must be human-diffable across runs: object keys are sorted by
//! UTF-8 byte order recursively (the output does not depend on the
//! `serde_json` map backing), the body is pretty-printed with two-space
//! indentation, and a trailing newline closes the file.

use serde_json::{Map, Value};

pub fn to_stable_json_bytes(value: &Value) -> Result<Vec<u8>, serde_json::Error> {
    let canon = canon_value(value.clone());
    let mut bytes = serde_json::to_vec_pretty(&canon)?;
    bytes.push(b'\n');
    Ok(bytes)
}

fn canon_value(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            let mut canon = Map::new();
            for (key, value) in entries {
                canon.insert(key, canon_value(value));
            }
            Value::Object(canon)
        }
        Value::Array(values) => Value::Array(values.into_iter().map(canon_value).collect()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn keys_are_sorted_recursively() {
        let value = json!({
            "b": 1,
            "a": {"d": 4, "c": 3},
            "aa": [{"z": 1, "y": 2}]
        });
        let text = String::from_utf8(to_stable_json_bytes(&value).unwrap()).unwrap();
        let a = text.find("\"a\"").unwrap();
        let aa = text.find("\"aa\"").unwrap();
        let b = text.find("\"b\"").unwrap();
        assert!(a < aa && aa < b);
        assert!(text.find("\"y\"").unwrap() < text.find("\"z\"").unwrap());
    }

    #[test]
    fn output_ends_with_a_newline() {
        let bytes = to_stable_json_bytes(&json!({"k": "v"})).unwrap();
        assert_eq!(bytes.last(), Some(&b'\n'));
    }

    #[test]
    fn encoding_is_deterministic() {
        let value = json!({"one": [1, 2], "two": {"b": 2, "a": 1}});
        assert_eq!(
            to_stable_json_bytes(&value).unwrap(),
            to_stable_json_bytes(&value).unwrap()
        );
    }
}
