//! Timer services.
//!
//! Rate controllers never touch a clock or a runtime directly; they go
//! through a [`Scheduler`]. [`ManualScheduler`] is a virtual clock driven by
//! the caller, [`TokioScheduler`] runs timers on a tokio `LocalSet`.

mod manual;
mod runtime;

pub use manual::ManualScheduler;
pub use runtime::{sleep, TokioScheduler};

use std::time::Duration;

/// Deferred work handed to a scheduler.
pub type Task = Box<dyn FnOnce()>;

/// Handle of a scheduled task, used to cancel it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

impl TimerId {
    /// Wrap a scheduler's own timer number. Implementations outside this
    /// crate use it to hand out ids.
    pub fn from_raw(raw: u64) -> Self {
        TimerId(raw)
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

/// A single-threaded timer service.
///
/// Implementations must never run a task from inside [`schedule`] or
/// [`cancel`]; tasks only run on a later turn of the owning loop, one at a
/// time, in deadline order.
///
/// [`schedule`]: Scheduler::schedule
/// [`cancel`]: Scheduler::cancel
pub trait Scheduler {
    /// Time elapsed on this scheduler's clock.
    fn now(&self) -> Duration;

    /// Run `task` once `delay` has elapsed.
    fn schedule(&self, delay: Duration, task: Task) -> TimerId;

    /// Cancel a scheduled task. Returns false if it already ran or was
    /// cancelled.
    fn cancel(&self, id: TimerId) -> bool;
}
