//! grabbag-util - value graphs and small data helpers
//!
//! The centre of this crate is [`deep_clone`], a structural copy of a
//! dynamic [`Value`] graph that keeps shared nodes shared and reproduces
//! cycles, and [`deep_equal`], the structural comparison that goes with it.
//! Around them sit a handful of array, number, string and object helpers.

pub mod array;
pub mod deep_clone;
pub mod deep_equal;
pub mod number;
pub mod object;
pub mod random;
pub mod strings;
pub mod value;

// Re-exports for convenience
pub use array::{chunk, sample, sample_with, shuffle, shuffle_with, unique};
pub use deep_clone::{deep_clone, deep_clone_with, CloneMemo};
pub use deep_equal::deep_equal;
pub use number::{average, format_number, in_range, lerp, median, random_int, random_int_with};
pub use object::{is_empty, safe_json_parse};
pub use random::RandomSource;
pub use strings::{
    capitalize, class_names, format_date, format_date_millis, format_date_str, normalize_whitespace,
};
pub use value::{
    parse_json, Array, Date, Function, Host, HostObject, JsonError, Key, Map, NodeId, Pattern,
    PatternError, PatternFlags, Property, Record, Set, Value,
};
