//! Dynamic value graph.
//!
//! A small object model with reference semantics. Composite values are shared
//! handles, so one graph can hold shared sub-graphs and cycles. `Clone` on a
//! [`Value`] copies the reference, never the node; use
//! [`deep_clone`](crate::deep_clone::deep_clone) for a structural copy.
//!
//! # Examples
//!
//! ```
//! use grabbag_util::value::{Array, Record, Value};
//!
//! let items = Array::from_values([Value::from(1), Value::from(2)]);
//! let record = Record::new();
//! record.set("items", items.clone());
//! record.set("alias", items.clone());
//!
//! // Both properties point at the same node.
//! assert_eq!(record.get("items"), record.get("alias"));
//! ```

mod json;
mod key;
mod pattern;

pub use json::{parse_json, JsonError};
pub use key::Key;
pub use pattern::{Pattern, PatternError, PatternFlags};

use chrono::{DateTime, TimeZone, Utc};
use indexmap::{IndexMap, IndexSet};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

/// Identity of a shared node: the address of its allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    fn of<T: ?Sized>(rc: &Rc<T>) -> Self {
        NodeId(Rc::as_ptr(rc) as *const () as usize)
    }
}

/// A dynamically typed value.
#[derive(Clone)]
pub enum Value {
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(Rc<str>),
    /// Opaque callable. Treated as an atomic leaf.
    Function(Function),
    /// Plain keyed record.
    Record(Record),
    /// Ordered sequence.
    Array(Array),
    /// Insertion-ordered key-value map with SameValueZero keys.
    Map(Map),
    /// Insertion-ordered unique set with SameValueZero membership.
    Set(Set),
    /// Mutable date-time instant.
    Date(Date),
    /// Text pattern.
    Pattern(Pattern),
    /// Object supplied by the embedding environment.
    Host(Host),
}

impl Value {
    /// Identity of a composite node, `None` for primitives and functions.
    pub fn node_id(&self) -> Option<NodeId> {
        match self {
            Value::Record(r) => Some(r.id()),
            Value::Array(a) => Some(a.id()),
            Value::Map(m) => Some(m.id()),
            Value::Set(s) => Some(s.id()),
            Value::Date(d) => Some(d.id()),
            Value::Pattern(p) => Some(p.id()),
            Value::Host(h) => Some(h.id()),
            _ => None,
        }
    }

    /// True for values copied as-is by a deep clone.
    pub fn is_primitive(&self) -> bool {
        self.node_id().is_none()
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Function(_) => "function",
            Value::Record(_) => "record",
            Value::Array(_) => "array",
            Value::Map(_) => "map",
            Value::Set(_) => "set",
            Value::Date(_) => "date",
            Value::Pattern(_) => "pattern",
            Value::Host(_) => "host",
        }
    }

    /// SameValueZero: like `==` but `NaN` equals `NaN`.
    pub fn same_value_zero(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => a == b || (a.is_nan() && b.is_nan()),
            _ => self == other,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Value::Record(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Array> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Map> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_set(&self) -> Option<&Set> {
        match self {
            Value::Set(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<&Date> {
        match self {
            Value::Date(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_pattern(&self) -> Option<&Pattern> {
        match self {
            Value::Pattern(p) => Some(p),
            _ => None,
        }
    }
}

/// Strict equality: primitives by value (`NaN != NaN`), everything else by
/// identity.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => a.id() == b.id(),
            _ => match (self.node_id(), other.node_id()) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            },
        }
    }
}

// Shallow on purpose: graphs may be cyclic.
impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => f.write_str("undefined"),
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => write!(f, "{n}"),
            Value::String(s) => write!(f, "{s:?}"),
            Value::Function(_) => f.write_str("[Function]"),
            Value::Record(r) => write!(f, "Record({:?})", r.keys()),
            Value::Array(a) => write!(f, "Array(len={})", a.len()),
            Value::Map(m) => write!(f, "Map(size={})", m.len()),
            Value::Set(s) => write!(f, "Set(size={})", s.len()),
            Value::Date(d) => match d.to_datetime() {
                Some(t) => write!(f, "Date({})", t.to_rfc3339()),
                None => f.write_str("Date(invalid)"),
            },
            Value::Pattern(p) => write!(f, "/{}/{}", p.source(), p.flags()),
            Value::Host(h) => write!(f, "Host({})", h.class_name()),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(Rc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(Rc::from(s))
    }
}

macro_rules! impl_from_handle {
    ($($ty:ident),*) => {
        $(
            impl From<$ty> for Value {
                fn from(handle: $ty) -> Self {
                    Value::$ty(handle)
                }
            }
        )*
    };
}

impl_from_handle!(Function, Record, Array, Map, Set, Date, Pattern, Host);

/// Opaque callable value.
#[derive(Clone)]
pub struct Function(Rc<dyn Fn(&[Value]) -> Value>);

impl Function {
    pub fn new(f: impl Fn(&[Value]) -> Value + 'static) -> Self {
        Function(Rc::new(f))
    }

    pub fn id(&self) -> NodeId {
        NodeId::of(&self.0)
    }

    pub fn call(&self, args: &[Value]) -> Value {
        (self.0)(args)
    }
}

/// A property slot of a [`Record`].
#[derive(Clone, Debug)]
pub struct Property {
    pub value: Value,
    pub enumerable: bool,
}

#[derive(Default)]
struct RecordData {
    props: IndexMap<String, Property>,
    proto: Option<Record>,
}

/// Plain keyed record.
///
/// Own properties keep insertion order. A record may inherit from a prototype
/// record fixed at construction; inherited properties are visible through
/// [`Record::get`] but are not own properties.
#[derive(Clone, Default)]
pub struct Record(Rc<RefCell<RecordData>>);

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty record inheriting from `proto`.
    pub fn with_proto(proto: Record) -> Self {
        Record(Rc::new(RefCell::new(RecordData {
            props: IndexMap::new(),
            proto: Some(proto),
        })))
    }

    pub fn from_entries<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        let record = Self::new();
        for (key, value) in entries {
            record.set(key, value);
        }
        record
    }

    pub fn id(&self) -> NodeId {
        NodeId::of(&self.0)
    }

    pub fn proto(&self) -> Option<Record> {
        self.0.borrow().proto.clone()
    }

    /// Assign an own property. New properties are enumerable; an existing
    /// property keeps its enumerability.
    pub fn set(&self, key: impl Into<String>, value: impl Into<Value>) {
        let value = value.into();
        let mut data = self.0.borrow_mut();
        match data.props.entry(key.into()) {
            indexmap::map::Entry::Occupied(mut slot) => slot.get_mut().value = value,
            indexmap::map::Entry::Vacant(slot) => {
                slot.insert(Property {
                    value,
                    enumerable: true,
                });
            }
        }
    }

    /// Define a non-enumerable own property.
    pub fn define_hidden(&self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.borrow_mut().props.insert(
            key.into(),
            Property {
                value: value.into(),
                enumerable: false,
            },
        );
    }

    pub fn get_own(&self, key: &str) -> Option<Value> {
        self.0.borrow().props.get(key).map(|p| p.value.clone())
    }

    /// Look a property up on the record, then along its prototype chain.
    pub fn get(&self, key: &str) -> Option<Value> {
        let mut current = self.clone();
        loop {
            let next = {
                let data = current.0.borrow();
                if let Some(prop) = data.props.get(key) {
                    return Some(prop.value.clone());
                }
                data.proto.clone()
            };
            current = next?;
        }
    }

    pub fn has_own(&self, key: &str) -> bool {
        self.0.borrow().props.contains_key(key)
    }

    pub fn remove(&self, key: &str) -> Option<Value> {
        self.0.borrow_mut().props.shift_remove(key).map(|p| p.value)
    }

    /// Own enumerable keys in insertion order.
    pub fn keys(&self) -> Vec<String> {
        self.0
            .borrow()
            .props
            .iter()
            .filter(|(_, p)| p.enumerable)
            .map(|(k, _)| k.clone())
            .collect()
    }

    /// Snapshot of the own enumerable properties.
    pub fn entries(&self) -> Vec<(String, Value)> {
        self.0
            .borrow()
            .props
            .iter()
            .filter(|(_, p)| p.enumerable)
            .map(|(k, p)| (k.clone(), p.value.clone()))
            .collect()
    }

    /// Number of own enumerable properties.
    pub fn len(&self) -> usize {
        self.0.borrow().props.values().filter(|p| p.enumerable).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Ordered sequence.
#[derive(Clone, Default)]
pub struct Array(Rc<RefCell<Vec<Value>>>);

impl Array {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_values(values: impl IntoIterator<Item = Value>) -> Self {
        Array(Rc::new(RefCell::new(values.into_iter().collect())))
    }

    pub fn id(&self) -> NodeId {
        NodeId::of(&self.0)
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Value> {
        self.0.borrow().get(index).cloned()
    }

    pub fn push(&self, value: impl Into<Value>) {
        self.0.borrow_mut().push(value.into());
    }

    /// Store at `index`, padding any gap with `undefined`.
    pub fn set(&self, index: usize, value: impl Into<Value>) {
        let mut items = self.0.borrow_mut();
        if index >= items.len() {
            items.resize(index + 1, Value::Undefined);
        }
        items[index] = value.into();
    }

    /// Snapshot of the elements.
    pub fn to_vec(&self) -> Vec<Value> {
        self.0.borrow().clone()
    }
}

/// Insertion-ordered map keyed by SameValueZero.
#[derive(Clone, Default)]
pub struct Map(Rc<RefCell<IndexMap<Key, Value>>>);

impl Map {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(&self) -> NodeId {
        NodeId::of(&self.0)
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    pub fn set(&self, key: impl Into<Value>, value: impl Into<Value>) {
        self.0.borrow_mut().insert(Key::new(key.into()), value.into());
    }

    pub fn get(&self, key: &Value) -> Option<Value> {
        self.0.borrow().get(&Key::new(key.clone())).cloned()
    }

    pub fn has(&self, key: &Value) -> bool {
        self.0.borrow().contains_key(&Key::new(key.clone()))
    }

    pub fn delete(&self, key: &Value) -> bool {
        self.0.borrow_mut().shift_remove(&Key::new(key.clone())).is_some()
    }

    /// Snapshot of the entries in insertion order.
    pub fn entries(&self) -> Vec<(Value, Value)> {
        self.0
            .borrow()
            .iter()
            .map(|(k, v)| (k.value().clone(), v.clone()))
            .collect()
    }
}

/// Insertion-ordered set with SameValueZero membership.
#[derive(Clone, Default)]
pub struct Set(Rc<RefCell<IndexSet<Key>>>);

impl Set {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(&self) -> NodeId {
        NodeId::of(&self.0)
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    /// Returns false when an equal element was already present.
    pub fn add(&self, value: impl Into<Value>) -> bool {
        self.0.borrow_mut().insert(Key::new(value.into()))
    }

    pub fn has(&self, value: &Value) -> bool {
        self.0.borrow().contains(&Key::new(value.clone()))
    }

    pub fn delete(&self, value: &Value) -> bool {
        self.0.borrow_mut().shift_remove(&Key::new(value.clone()))
    }

    /// Snapshot of the elements in insertion order.
    pub fn values(&self) -> Vec<Value> {
        self.0.borrow().iter().map(|k| k.value().clone()).collect()
    }
}

/// Mutable date-time instant, stored as epoch milliseconds.
///
/// `None` marks an invalid date.
#[derive(Clone)]
pub struct Date(Rc<Cell<Option<i64>>>);

impl Date {
    pub fn from_epoch(millis: Option<i64>) -> Self {
        Date(Rc::new(Cell::new(millis)))
    }

    pub fn from_millis(millis: i64) -> Self {
        Self::from_epoch(Some(millis))
    }

    pub fn from_datetime(when: DateTime<Utc>) -> Self {
        Self::from_millis(when.timestamp_millis())
    }

    pub fn invalid() -> Self {
        Self::from_epoch(None)
    }

    pub fn now() -> Self {
        Self::from_datetime(Utc::now())
    }

    pub fn id(&self) -> NodeId {
        NodeId::of(&self.0)
    }

    pub fn millis(&self) -> Option<i64> {
        self.0.get()
    }

    pub fn set_millis(&self, millis: Option<i64>) {
        self.0.set(millis);
    }

    pub fn is_valid(&self) -> bool {
        self.0.get().is_some()
    }

    /// `None` for invalid dates and instants outside chrono's range.
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        self.millis()
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
    }
}

/// An object provided by the embedding environment.
///
/// The value graph only sees its class name and its own enumerable
/// properties; any private state stays behind the trait.
pub trait HostObject {
    fn class_name(&self) -> &str;
    fn own_enumerable(&self) -> Vec<(String, Value)>;
}

#[derive(Clone)]
pub struct Host(Rc<dyn HostObject>);

impl Host {
    pub fn new(object: impl HostObject + 'static) -> Self {
        Host(Rc::new(object))
    }

    pub fn id(&self) -> NodeId {
        NodeId::of(&self.0)
    }

    pub fn class_name(&self) -> &str {
        self.0.class_name()
    }

    pub fn own_enumerable(&self) -> Vec<(String, Value)> {
        self.0.own_enumerable()
    }
}
