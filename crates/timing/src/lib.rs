//! Rate control for single-threaded event loops.
//!
//! [`Debounce`] and [`Throttle`] wrap a callback, [`DebouncedValue`] and
//! [`ThrottledValue`] wrap a value, and [`Interval`] repeats a callback. All
//! of them run on a [`Scheduler`], either the deterministic
//! [`ManualScheduler`] or the tokio-backed [`TokioScheduler`].

pub mod config;
pub mod debounce;
pub mod interval;
pub mod scheduler;
pub mod throttle;
pub mod value;

pub use config::{ConfigError, RateConfig, TimingConfig};
pub use debounce::Debounce;
pub use interval::{Interval, IntervalOptions};
pub use scheduler::{sleep, ManualScheduler, Scheduler, Task, TimerId, TokioScheduler};
pub use throttle::Throttle;
pub use value::{DebouncedValue, ThrottledValue};
