use crate::value::{Map, NodeId, Set, Value};
use std::collections::{HashMap, HashSet};

/// Performs a deep structural comparison between two values.
///
/// - Primitives compare with SameValueZero (`NaN` equals `NaN`).
/// - Functions compare by identity.
/// - Records compare by their own enumerable properties, in any order.
///   Host objects compare through the same record view.
/// - Arrays compare element by element.
/// - Dates compare by epoch value, patterns by source and flags.
/// - Maps and sets compare by size and per-entry match; composite keys and
///   members are matched structurally.
///
/// Cyclic graphs are handled: a pair of nodes already under comparison is
/// assumed equal.
///
/// # Examples
///
/// ```
/// use grabbag_util::deep_equal::deep_equal;
/// use grabbag_util::value::Value;
/// use serde_json::json;
///
/// let a = Value::from(&json!({"foo": [1, 2, 3]}));
/// let b = Value::from(&json!({"foo": [1, 2, 3]}));
/// let c = Value::from(&json!({"foo": [1, 2, 4]}));
///
/// assert!(deep_equal(&a, &b));
/// assert!(!deep_equal(&a, &c));
/// ```
pub fn deep_equal(a: &Value, b: &Value) -> bool {
    Comparison::default().equal(a, b)
}

#[derive(Default)]
struct Comparison {
    assumed: HashSet<(NodeId, NodeId)>,
}

impl Comparison {
    fn equal(&mut self, a: &Value, b: &Value) -> bool {
        match (a, b) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Bool(x), Value::Bool(y)) => x == y,
            (Value::Number(_), Value::Number(_)) => a.same_value_zero(b),
            (Value::String(x), Value::String(y)) => x == y,
            (Value::Function(x), Value::Function(y)) => x.id() == y.id(),
            (Value::Date(x), Value::Date(y)) => x.millis() == y.millis(),
            (Value::Pattern(x), Value::Pattern(y)) => {
                x.source() == y.source() && x.pattern_flags() == y.pattern_flags()
            }
            _ => self.composite(a, b),
        }
    }

    fn composite(&mut self, a: &Value, b: &Value) -> bool {
        let (Some(id_a), Some(id_b)) = (a.node_id(), b.node_id()) else {
            return false;
        };
        if id_a == id_b || !self.assumed.insert((id_a, id_b)) {
            return true;
        }
        match (a, b) {
            (Value::Array(x), Value::Array(y)) => {
                let xs = x.to_vec();
                let ys = y.to_vec();
                xs.len() == ys.len() && xs.iter().zip(&ys).all(|(p, q)| self.equal(p, q))
            }
            (Value::Map(x), Value::Map(y)) => self.maps(x, y),
            (Value::Set(x), Value::Set(y)) => self.sets(x, y),
            _ => match (record_view(a), record_view(b)) {
                (Some(x), Some(y)) => self.records(&x, &y),
                _ => false,
            },
        }
    }

    fn records(&mut self, xs: &[(String, Value)], ys: &[(String, Value)]) -> bool {
        if xs.len() != ys.len() {
            return false;
        }
        let lookup: HashMap<&str, &Value> = ys.iter().map(|(k, v)| (k.as_str(), v)).collect();
        xs.iter().all(|(key, x)| match lookup.get(key.as_str()) {
            Some(y) => self.equal(x, y),
            None => false,
        })
    }

    fn maps(&mut self, x: &Map, y: &Map) -> bool {
        if x.len() != y.len() {
            return false;
        }
        let candidates: Vec<(Value, Value)> = y
            .entries()
            .into_iter()
            .filter(|(k, _)| !k.is_primitive())
            .collect();
        let mut used = vec![false; candidates.len()];
        for (key, val) in x.entries() {
            if key.is_primitive() {
                match y.get(&key) {
                    Some(other) if self.equal(&val, &other) => continue,
                    _ => return false,
                }
            }
            let found = (0..candidates.len()).find(|&i| {
                !used[i]
                    && self.trial(|cmp| {
                        cmp.equal(&key, &candidates[i].0) && cmp.equal(&val, &candidates[i].1)
                    })
            });
            match found {
                Some(i) => used[i] = true,
                None => return false,
            }
        }
        true
    }

    fn sets(&mut self, x: &Set, y: &Set) -> bool {
        if x.len() != y.len() {
            return false;
        }
        let candidates: Vec<Value> = y.values().into_iter().filter(|v| !v.is_primitive()).collect();
        let mut used = vec![false; candidates.len()];
        for item in x.values() {
            if item.is_primitive() {
                if y.has(&item) {
                    continue;
                }
                return false;
            }
            let found = (0..candidates.len())
                .find(|&i| !used[i] && self.trial(|cmp| cmp.equal(&item, &candidates[i])));
            match found {
                Some(i) => used[i] = true,
                None => return false,
            }
        }
        true
    }

    /// Run a speculative comparison, dropping the assumptions it made if it
    /// fails.
    fn trial(&mut self, f: impl FnOnce(&mut Self) -> bool) -> bool {
        let saved = self.assumed.clone();
        let ok = f(self);
        if !ok {
            self.assumed = saved;
        }
        ok
    }
}

fn record_view(value: &Value) -> Option<Vec<(String, Value)>> {
    match value {
        Value::Record(r) => Some(r.entries()),
        Value::Host(h) => Some(h.own_enumerable()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{Array, Date, Function, Pattern, Record};
    use serde_json::json;

    fn v(json: serde_json::Value) -> Value {
        Value::from(&json)
    }

    // Scalar tests
    #[test]
    fn test_equal_numbers() {
        assert!(deep_equal(&v(json!(1)), &v(json!(1))));
        assert!(!deep_equal(&v(json!(1)), &v(json!(2))));
    }

    #[test]
    fn test_nan_equals_nan() {
        assert!(deep_equal(&Value::Number(f64::NAN), &Value::Number(f64::NAN)));
    }

    #[test]
    fn test_zero_and_null_not_equal() {
        assert!(!deep_equal(&v(json!(0)), &v(json!(null))));
        assert!(!deep_equal(&Value::Null, &Value::Undefined));
    }

    #[test]
    fn test_one_and_true_not_equal() {
        assert!(!deep_equal(&v(json!(1)), &v(json!(true))));
    }

    #[test]
    fn test_equal_strings() {
        assert!(deep_equal(&v(json!("a")), &v(json!("a"))));
        assert!(!deep_equal(&v(json!("a")), &v(json!("b"))));
    }

    // Object tests
    #[test]
    fn test_equal_objects_different_order() {
        assert!(deep_equal(
            &v(json!({"a": 1, "b": "2"})),
            &v(json!({"b": "2", "a": 1}))
        ));
    }

    #[test]
    fn test_not_equal_objects_extra_property() {
        assert!(!deep_equal(
            &v(json!({"a": 1, "b": "2"})),
            &v(json!({"a": 1, "b": "2", "c": []}))
        ));
    }

    #[test]
    fn test_not_equal_objects_different_properties() {
        assert!(!deep_equal(
            &v(json!({"a": 1, "b": "2", "c": 3})),
            &v(json!({"a": 1, "b": "2", "d": 3}))
        ));
    }

    #[test]
    fn test_empty_object_and_array_not_equal() {
        assert!(!deep_equal(&v(json!({})), &v(json!([]))));
    }

    #[test]
    fn test_hidden_properties_ignored() {
        let a = Record::from_entries([("x", 1)]);
        a.define_hidden("secret", 1);
        let b = Record::from_entries([("x", 1)]);
        assert!(deep_equal(&Value::Record(a), &Value::Record(b)));
    }

    // Array tests
    #[test]
    fn test_arrays() {
        assert!(deep_equal(&v(json!([1, 2, 3])), &v(json!([1, 2, 3]))));
        assert!(!deep_equal(&v(json!([1, 2, 3])), &v(json!([1, 2]))));
        assert!(!deep_equal(
            &v(json!([{"a": "a"}, {"b": "b"}])),
            &v(json!([{"a": "a"}, {"b": "c"}]))
        ));
    }

    // Special objects
    #[test]
    fn test_dates() {
        let a = Value::Date(Date::from_millis(5));
        let b = Value::Date(Date::from_millis(5));
        let c = Value::Date(Date::from_millis(6));
        assert!(deep_equal(&a, &b));
        assert!(!deep_equal(&a, &c));
        assert!(deep_equal(&Value::Date(Date::invalid()), &Value::Date(Date::invalid())));
    }

    #[test]
    fn test_patterns() {
        let a = Value::Pattern(Pattern::new("x+", "g").unwrap());
        let b = Value::Pattern(Pattern::new("x+", "g").unwrap());
        let c = Value::Pattern(Pattern::new("x+", "gi").unwrap());
        assert!(deep_equal(&a, &b));
        assert!(!deep_equal(&a, &c));
    }

    #[test]
    fn test_functions_by_identity() {
        let f = Function::new(|_| Value::Null);
        let g = Function::new(|_| Value::Null);
        assert!(deep_equal(&Value::Function(f.clone()), &Value::Function(f.clone())));
        assert!(!deep_equal(&Value::Function(f), &Value::Function(g)));
    }

    #[test]
    fn test_maps_with_composite_keys() {
        let a = Map::new();
        a.set(Record::from_entries([("k", 1)]), "one");
        a.set(Record::from_entries([("k", 2)]), "two");
        a.set("p", 0);

        let b = Map::new();
        b.set("p", 0);
        b.set(Record::from_entries([("k", 2)]), "two");
        b.set(Record::from_entries([("k", 1)]), "one");
        assert!(deep_equal(&Value::Map(a.clone()), &Value::Map(b)));

        let c = Map::new();
        c.set("p", 0);
        c.set(Record::from_entries([("k", 2)]), "one");
        c.set(Record::from_entries([("k", 1)]), "two");
        assert!(!deep_equal(&Value::Map(a), &Value::Map(c)));
    }

    #[test]
    fn test_sets() {
        let a = Set::new();
        a.add(1);
        a.add(Array::from_values([Value::from(2)]));
        let b = Set::new();
        b.add(Array::from_values([Value::from(2)]));
        b.add(1);
        assert!(deep_equal(&Value::Set(a.clone()), &Value::Set(b)));

        let c = Set::new();
        c.add(1);
        c.add(Array::from_values([Value::from(3)]));
        assert!(!deep_equal(&Value::Set(a), &Value::Set(c)));
    }

    #[test]
    fn test_cyclic_graphs() {
        let a = Record::new();
        a.set("self", a.clone());
        let b = Record::new();
        b.set("self", b.clone());
        assert!(deep_equal(&Value::Record(a.clone()), &Value::Record(b.clone())));

        a.set("tag", 1);
        b.set("tag", 2);
        assert!(!deep_equal(&Value::Record(a), &Value::Record(b)));
    }

    #[test]
    fn test_failed_trial_does_not_leak_assumptions() {
        // Two members that only differ deep inside must not be paired by a
        // failed attempt that left assumptions behind.
        let inner_a = Record::from_entries([("v", 1)]);
        let inner_b = Record::from_entries([("v", 2)]);
        let a = Set::new();
        a.add(Record::from_entries([("inner", inner_a.clone())]));
        a.add(Record::from_entries([("inner", inner_b.clone())]));
        let b = Set::new();
        b.add(Record::from_entries([("inner", inner_b)]));
        b.add(Record::from_entries([("inner", inner_a)]));
        assert!(deep_equal(&Value::Set(a), &Value::Set(b)));
    }

    #[test]
    fn test_big_object() {
        let a = v(json!({
            "prop1": "value1",
            "prop4": {
                "subProp1": "sub value1",
                "subProp2": {
                    "subSubProp1": "sub sub value1",
                    "subSubProp2": [1, 2, {"prop2": 1, "prop": 2}, 4, 5]
                }
            },
            "prop5": 1000
        }));
        let b = v(json!({
            "prop5": 1000,
            "prop1": "value1",
            "prop4": {
                "subProp2": {
                    "subSubProp1": "sub sub value1",
                    "subSubProp2": [1, 2, {"prop2": 1, "prop": 2}, 4, 5]
                },
                "subProp1": "sub value1"
            }
        }));
        assert!(deep_equal(&a, &b));
    }
}
