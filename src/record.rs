//! Record type and the truthiness rule used by the executor.

use indexmap::IndexMap;
use serde_json::Value;

/// An untyped record: field name to value, in insertion order.
///
/// Cloning a record clones every nested value, so a clone never aliases
/// the arrays or objects of the record it came from.
pub type Record = IndexMap<String, Value>;

/// Build a record from a JSON object. Any other value yields `None`.
pub fn record_from_json(value: Value) -> Option<Record> {
    match value {
        Value::Object(map) => Some(map.into_iter().collect()),
        _ => None,
    }
}

/// Whether a value counts as empty for the short-circuit in `parse`.
///
/// `null`, `false`, numeric zero, the empty string, the empty array and the
/// empty object are all falsy. A numeric `0` is treated exactly like a
/// missing field.
pub fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64().map_or(false, |f| f == 0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_falsy_values() {
        for value in [json!(null), json!(false), json!(0), json!(0.0), json!(""), json!([]), json!({})] {
            assert!(is_falsy(&value), "{value} should be falsy");
        }
    }

    #[test]
    fn test_truthy_values() {
        for value in [json!(true), json!(1), json!(-2.5), json!(" "), json!([""]), json!({"a": null})] {
            assert!(!is_falsy(&value), "{value} should be truthy");
        }
    }

    #[test]
    fn test_record_from_json() {
        let record = record_from_json(json!({"b": 1, "a": 2})).unwrap();
        assert_eq!(record.len(), 2);
        assert_eq!(record["a"], json!(2));
        assert_eq!(record["b"], json!(1));

        assert!(record_from_json(json!([1, 2])).is_none());
    }
}
