//! Structural deep copy of value graphs.
//!
//! Copies shape as well as content: records stay records, maps stay maps,
//! dates and patterns become new instances. Shared nodes are copied once and
//! cycles are reproduced in the copy.

mod clone;

pub use clone::{deep_clone, deep_clone_with, CloneMemo};
