//! String utilities.
//!
//! Provides small text helpers: whitespace clean-up, casing, date formatting
//! and class-name joining.

mod class_names;
mod date;
mod text;

pub use class_names::class_names;
pub use date::{format_date, format_date_millis, format_date_str};
pub use text::{capitalize, normalize_whitespace};
