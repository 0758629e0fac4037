use crate::value::{parse_json, Value};
use tracing::debug;

/// Check if a value is an empty plain record.
///
/// True only for a record with no own enumerable properties and no
/// prototype; every other value, including an empty array, is not an "empty
/// object".
///
/// # Examples
///
/// ```
/// use grabbag_util::object::is_empty;
/// use grabbag_util::value::{Array, Record, Value};
///
/// assert!(is_empty(&Value::Record(Record::new())));
/// assert!(!is_empty(&Value::Record(Record::from_entries([("a", 1)]))));
/// assert!(!is_empty(&Value::Array(Array::new())));
/// ```
pub fn is_empty(value: &Value) -> bool {
    match value {
        Value::Record(record) => record.is_empty() && record.proto().is_none(),
        _ => false,
    }
}

/// Parse JSON text, returning `fallback` when the text is not valid JSON.
///
/// # Examples
///
/// ```
/// use grabbag_util::object::safe_json_parse;
/// use grabbag_util::value::Value;
///
/// assert_eq!(safe_json_parse("[1", Value::Null), Value::Null);
/// assert_eq!(safe_json_parse("true", Value::Null), Value::Bool(true));
/// ```
pub fn safe_json_parse(text: &str, fallback: Value) -> Value {
    match parse_json(text) {
        Ok(value) => value,
        Err(err) => {
            debug!(error = %err, "json parse failed, using fallback");
            fallback
        }
    }
}
