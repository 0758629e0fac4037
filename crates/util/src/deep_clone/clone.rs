use crate::value::{Array, Date, Map, NodeId, Record, Set, Value};
use std::collections::HashMap;
use tracing::{debug, trace};

/// Identity-keyed record of the nodes already copied.
///
/// One memo normally lives for one [`deep_clone`] call. Passing the same memo
/// to several [`deep_clone_with`] calls copies several roots as one graph:
/// a node reachable from more than one root is copied once.
///
/// The memo keeps every original it has seen alive, so a node id can never
/// be reused by another allocation while the memo exists.
#[derive(Default)]
pub struct CloneMemo {
    seen: HashMap<NodeId, (Value, Value)>,
}

impl CloneMemo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct nodes copied so far.
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    /// The copy made for `original`, if it was visited.
    pub fn get(&self, original: &Value) -> Option<Value> {
        let id = original.node_id()?;
        self.seen.get(&id).map(|(_, copy)| copy.clone())
    }

    fn register(&mut self, id: NodeId, original: &Value, copy: Value) -> Value {
        self.seen.insert(id, (original.clone(), copy.clone()));
        copy
    }
}

/// Creates a deep clone of a value graph.
///
/// Primitives, strings and functions are returned as they are. Every
/// composite node is copied exactly once, so shared references stay shared
/// and cycles stay cycles in the result. Records keep only their own
/// enumerable properties. Host objects become plain records.
///
/// # Examples
///
/// ```
/// use grabbag_util::deep_clone::deep_clone;
/// use grabbag_util::value::{Record, Value};
///
/// let original = Record::new();
/// original.set("self", original.clone());
///
/// let copy = deep_clone(&Value::Record(original.clone()));
/// let copy_record = copy.as_record().unwrap();
///
/// assert_ne!(copy, Value::Record(original));
/// assert_eq!(copy_record.get("self"), Some(copy.clone()));
/// ```
pub fn deep_clone(value: &Value) -> Value {
    let mut memo = CloneMemo::new();
    let copy = deep_clone_with(value, &mut memo);
    trace!(nodes = memo.len(), "deep clone finished");
    copy
}

/// Deep clone using a caller-provided memo. See [`CloneMemo`].
pub fn deep_clone_with(value: &Value, memo: &mut CloneMemo) -> Value {
    let Some(id) = value.node_id() else {
        return value.clone();
    };
    if let Some((_, copy)) = memo.seen.get(&id) {
        return copy.clone();
    }

    // Each container registers its empty copy before recursing; a child that
    // leads back to it then finds the copy in the memo.
    match value {
        Value::Date(date) => memo.register(id, value, Value::Date(Date::from_epoch(date.millis()))),
        Value::Pattern(pattern) => memo.register(id, value, Value::Pattern(pattern.duplicate())),
        Value::Map(map) => {
            let out = Map::new();
            memo.register(id, value, Value::Map(out.clone()));
            for (key, val) in map.entries() {
                let key = deep_clone_with(&key, memo);
                let val = deep_clone_with(&val, memo);
                out.set(key, val);
            }
            Value::Map(out)
        }
        Value::Set(set) => {
            let out = Set::new();
            memo.register(id, value, Value::Set(out.clone()));
            for item in set.values() {
                out.add(deep_clone_with(&item, memo));
            }
            Value::Set(out)
        }
        Value::Array(array) => {
            let out = Array::new();
            memo.register(id, value, Value::Array(out.clone()));
            for item in array.to_vec() {
                out.push(deep_clone_with(&item, memo));
            }
            Value::Array(out)
        }
        Value::Record(record) => {
            let out = Record::new();
            memo.register(id, value, Value::Record(out.clone()));
            copy_properties(record.entries(), &out, memo);
            Value::Record(out)
        }
        Value::Host(host) => {
            debug!(class = host.class_name(), "host object cloned as plain record");
            let out = Record::new();
            memo.register(id, value, Value::Record(out.clone()));
            copy_properties(host.own_enumerable(), &out, memo);
            Value::Record(out)
        }
        _ => value.clone(),
    }
}

fn copy_properties(entries: Vec<(String, Value)>, out: &Record, memo: &mut CloneMemo) {
    for (key, val) in entries {
        let val = deep_clone_with(&val, memo);
        out.set(key, val);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deep_equal::deep_equal;
    use crate::value::{Function, HostObject, Pattern};
    use serde_json::json;

    #[test]
    fn test_clone_primitives_are_returned_unchanged() {
        for value in [
            Value::Undefined,
            Value::Null,
            Value::Bool(true),
            Value::from(42),
            Value::from("hello"),
        ] {
            assert_eq!(deep_clone(&value), value);
        }
    }

    #[test]
    fn test_clone_function_keeps_identity() {
        let f = Value::Function(Function::new(|_| Value::Null));
        assert_eq!(deep_clone(&f), f);
    }

    #[test]
    fn test_clone_nested() {
        let value = Value::from(&json!({
            "array": [1, 2, {"nested": true}],
            "object": {"a": "b"},
            "scalar": 42
        }));
        let cloned = deep_clone(&value);
        assert_ne!(cloned, value);
        assert!(deep_equal(&cloned, &value));
        assert_eq!(cloned.to_json().unwrap(), value.to_json().unwrap());
    }

    #[test]
    fn test_clone_is_deep() {
        let value = Value::from(&json!({"arr": [1, 2, 3]}));
        let cloned = deep_clone(&value);

        let original_arr = value.as_record().unwrap().get("arr").unwrap();
        let cloned_arr = cloned.as_record().unwrap().get("arr").unwrap();
        assert_ne!(original_arr, cloned_arr);

        cloned_arr.as_array().unwrap().push(4);
        assert_eq!(original_arr.as_array().unwrap().len(), 3);
    }

    #[test]
    fn test_clone_self_cycle() {
        let record = Record::new();
        record.set("self", record.clone());
        let cloned = deep_clone(&Value::Record(record.clone()));
        let inner = cloned.as_record().unwrap().get("self").unwrap();
        assert_eq!(inner, cloned);
        assert_ne!(inner, Value::Record(record));
    }

    #[test]
    fn test_clone_array_cycle() {
        let array = Array::new();
        array.push(1);
        array.push(array.clone());
        let cloned = deep_clone(&Value::Array(array));
        let cloned_array = cloned.as_array().unwrap();
        assert_eq!(cloned_array.get(1), Some(cloned.clone()));
    }

    #[test]
    fn test_clone_shared_reference_copied_once() {
        let shared = Record::new();
        let obj = Record::new();
        obj.set("x", shared.clone());
        obj.set("y", shared.clone());
        let cloned = deep_clone(&Value::Record(obj));
        let record = cloned.as_record().unwrap();
        assert_eq!(record.get("x"), record.get("y"));
        assert_ne!(record.get("x"), Some(Value::Record(shared)));
    }

    #[test]
    fn test_clone_date() {
        let date = Date::from_millis(1_700_000_000_000);
        let cloned = deep_clone(&Value::Date(date.clone()));
        let cloned_date = cloned.as_date().unwrap();
        assert_eq!(cloned_date.millis(), Some(1_700_000_000_000));
        date.set_millis(Some(0));
        assert_eq!(cloned_date.millis(), Some(1_700_000_000_000));

        let invalid = deep_clone(&Value::Date(Date::invalid()));
        assert!(!invalid.as_date().unwrap().is_valid());
    }

    #[test]
    fn test_clone_pattern() {
        let pattern = Pattern::new("a+b", "gi").unwrap();
        pattern.set_last_index(3);
        let cloned = deep_clone(&Value::Pattern(pattern.clone()));
        let cloned_pattern = cloned.as_pattern().unwrap();
        assert_ne!(cloned_pattern.id(), pattern.id());
        assert_eq!(cloned_pattern.source(), "a+b");
        assert_eq!(cloned_pattern.flags(), "gi");
        assert_eq!(cloned_pattern.last_index(), 0);
    }

    #[test]
    fn test_clone_map_clones_keys_and_values() {
        let key = Record::from_entries([("id", 1)]);
        let val = Array::from_values([Value::from("v")]);
        let map = Map::new();
        map.set(key.clone(), val.clone());
        map.set("plain", 2);

        let cloned = deep_clone(&Value::Map(map));
        let entries = cloned.as_map().unwrap().entries();
        assert_eq!(entries.len(), 2);
        let (cloned_key, cloned_val) = &entries[0];
        assert_ne!(cloned_key, &Value::Record(key.clone()));
        assert_ne!(cloned_val, &Value::Array(val));
        assert!(deep_equal(cloned_key, &Value::Record(key)));
        assert_eq!(entries[1], (Value::from("plain"), Value::from(2)));
    }

    #[test]
    fn test_clone_set() {
        let member = Record::new();
        let set = Set::new();
        set.add(1);
        set.add(member.clone());
        let cloned = deep_clone(&Value::Set(set));
        let values = cloned.as_set().unwrap().values();
        assert_eq!(values[0], Value::from(1));
        assert_ne!(values[1], Value::Record(member));
        assert!(values[1].as_record().is_some());
    }

    #[test]
    fn test_clone_map_containing_itself() {
        let map = Map::new();
        map.set("me", map.clone());
        map.set(map.clone(), "key is me");
        let cloned = deep_clone(&Value::Map(map));
        let cloned_map = cloned.as_map().unwrap();
        assert_eq!(cloned_map.get(&Value::from("me")), Some(cloned.clone()));
        assert_eq!(cloned_map.get(&cloned), Some(Value::from("key is me")));
    }

    #[test]
    fn test_clone_keeps_only_own_enumerable_properties() {
        let proto = Record::from_entries([("inherited", 1)]);
        let record = Record::with_proto(proto);
        record.set("own", 2);
        record.define_hidden("hidden", 3);

        let cloned = deep_clone(&Value::Record(record));
        let cloned_record = cloned.as_record().unwrap();
        assert_eq!(cloned_record.keys(), vec!["own".to_string()]);
        assert!(cloned_record.proto().is_none());
        assert_eq!(cloned_record.get("inherited"), None);
        assert_eq!(cloned_record.get("hidden"), None);
    }

    struct Point {
        x: f64,
        y: f64,
    }

    impl HostObject for Point {
        fn class_name(&self) -> &str {
            "Point"
        }

        fn own_enumerable(&self) -> Vec<(String, Value)> {
            vec![("x".into(), Value::from(self.x)), ("y".into(), Value::from(self.y))]
        }
    }

    #[test]
    fn test_clone_host_object_degrades_to_record() {
        let host = Value::Host(crate::value::Host::new(Point { x: 1.0, y: 2.0 }));
        let cloned = deep_clone(&host);
        let record = cloned.as_record().unwrap();
        assert_eq!(record.get("x"), Some(Value::from(1.0)));
        assert_eq!(record.get("y"), Some(Value::from(2.0)));
    }

    #[test]
    fn test_shared_memo_across_roots() {
        let shared = Record::new();
        let a = Array::from_values([Value::Record(shared.clone())]);
        let b = Array::from_values([Value::Record(shared.clone())]);

        let mut memo = CloneMemo::new();
        let a2 = deep_clone_with(&Value::Array(a), &mut memo);
        let b2 = deep_clone_with(&Value::Array(b), &mut memo);
        assert_eq!(a2.as_array().unwrap().get(0), b2.as_array().unwrap().get(0));
        assert_eq!(memo.get(&Value::Record(shared)), a2.as_array().unwrap().get(0));
        assert_eq!(memo.len(), 3);
    }

    #[test]
    fn test_separate_calls_are_independent() {
        let shared = Record::new();
        let first = deep_clone(&Value::Record(shared.clone()));
        let second = deep_clone(&Value::Record(shared));
        assert_ne!(first, second);
    }
}
