//! Structural equality for value graphs.
//!
//! Provides deep comparison that terminates on cyclic graphs.

mod deep_equal;

pub use deep_equal::deep_equal;
