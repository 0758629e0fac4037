use super::{Array, NodeId, Record, Value};
use chrono::SecondsFormat;
use serde_json::{Map as JsonMap, Number, Value as Json};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum JsonError {
    #[error("invalid json: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("converting circular structure to json")]
    Cycle,
    #[error("value has no json representation")]
    Unrepresentable,
}

impl From<&Json> for Value {
    fn from(json: &Json) -> Self {
        match json {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Bool(*b),
            Json::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            Json::String(s) => Value::from(s.as_str()),
            Json::Array(items) => Value::Array(Array::from_values(items.iter().map(Value::from))),
            Json::Object(obj) => {
                let record = Record::new();
                for (key, val) in obj {
                    record.set(key.clone(), Value::from(val));
                }
                Value::Record(record)
            }
        }
    }
}

impl Value {
    /// Convert to JSON the way `JSON.stringify` would.
    ///
    /// Shared (non-cyclic) sub-graphs are written once per reference. A cycle
    /// is an error.
    ///
    /// # Examples
    ///
    /// ```
    /// use grabbag_util::value::{Record, Value};
    /// use serde_json::json;
    ///
    /// let record = Record::from_entries([("a", Value::from(1)), ("skip", Value::Undefined)]);
    /// assert_eq!(Value::Record(record).to_json().unwrap(), json!({"a": 1}));
    /// ```
    pub fn to_json(&self) -> Result<Json, JsonError> {
        let mut ancestors = Vec::new();
        to_json_inner(self, &mut ancestors)?.ok_or(JsonError::Unrepresentable)
    }
}

/// Parse JSON text into a fresh value graph.
pub fn parse_json(text: &str) -> Result<Value, JsonError> {
    let json: Json = serde_json::from_str(text)?;
    Ok(Value::from(&json))
}

fn number_to_json(n: f64) -> Json {
    const MAX_SAFE: f64 = 9_007_199_254_740_991.0;
    if n.fract() == 0.0 && n.abs() <= MAX_SAFE {
        return Json::Number(Number::from(n as i64));
    }
    Number::from_f64(n).map_or(Json::Null, Json::Number)
}

fn to_json_inner(value: &Value, ancestors: &mut Vec<NodeId>) -> Result<Option<Json>, JsonError> {
    let json = match value {
        Value::Undefined | Value::Function(_) => return Ok(None),
        Value::Null => Json::Null,
        Value::Bool(b) => Json::Bool(*b),
        Value::Number(n) => number_to_json(*n),
        Value::String(s) => Json::String(s.to_string()),
        Value::Date(d) => match d.to_datetime() {
            Some(t) => Json::String(t.to_rfc3339_opts(SecondsFormat::Millis, true)),
            None => Json::Null,
        },
        Value::Map(_) | Value::Set(_) | Value::Pattern(_) => Json::Object(JsonMap::new()),
        Value::Array(array) => {
            enter(ancestors, array.id())?;
            let mut out = Vec::with_capacity(array.len());
            for item in array.to_vec() {
                out.push(to_json_inner(&item, ancestors)?.unwrap_or(Json::Null));
            }
            ancestors.pop();
            Json::Array(out)
        }
        Value::Record(record) => {
            enter(ancestors, record.id())?;
            let obj = object_to_json(record.entries(), ancestors)?;
            ancestors.pop();
            obj
        }
        Value::Host(host) => {
            enter(ancestors, host.id())?;
            let obj = object_to_json(host.own_enumerable(), ancestors)?;
            ancestors.pop();
            obj
        }
    };
    Ok(Some(json))
}

fn enter(ancestors: &mut Vec<NodeId>, id: NodeId) -> Result<(), JsonError> {
    if ancestors.contains(&id) {
        return Err(JsonError::Cycle);
    }
    ancestors.push(id);
    Ok(())
}

fn object_to_json(
    entries: Vec<(String, Value)>,
    ancestors: &mut Vec<NodeId>,
) -> Result<Json, JsonError> {
    let mut obj = JsonMap::new();
    for (key, val) in entries {
        if let Some(json) = to_json_inner(&val, ancestors)? {
            obj.insert(key, json);
        }
    }
    Ok(Json::Object(obj))
}
