use super::{Scheduler, Task, TimerId};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;
use tokio::task::{spawn_local, AbortHandle};
use tokio::time::Instant;
use tracing::trace;

/// Runs timers as local tokio tasks.
///
/// [`schedule`](Scheduler::schedule) spawns with `spawn_local`, so it must be
/// called from inside a `tokio::task::LocalSet`. Dropping the scheduler
/// aborts every timer that has not fired yet.
pub struct TokioScheduler {
    origin: Instant,
    next_id: Cell<u64>,
    timers: Rc<RefCell<HashMap<TimerId, AbortHandle>>>,
}

impl TokioScheduler {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            next_id: Cell::new(0),
            timers: Rc::new(RefCell::new(HashMap::new())),
        }
    }

    /// Number of timers waiting to fire.
    pub fn pending(&self) -> usize {
        self.timers.borrow().len()
    }
}

impl Default for TokioScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler for TokioScheduler {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn schedule(&self, delay: Duration, task: Task) -> TimerId {
        let id = TimerId::from_raw(self.next_id.get());
        self.next_id.set(id.get() + 1);

        let deadline = Instant::now() + delay;
        let timers = Rc::downgrade(&self.timers);
        let handle = spawn_local(async move {
            tokio::time::sleep_until(deadline).await;
            if let Some(timers) = timers.upgrade() {
                timers.borrow_mut().remove(&id);
            }
            task();
        });

        self.timers.borrow_mut().insert(id, handle.abort_handle());
        trace!(timer = id.get(), delay_ms = delay.as_millis() as u64, "timer spawned");
        id
    }

    fn cancel(&self, id: TimerId) -> bool {
        match self.timers.borrow_mut().remove(&id) {
            Some(handle) => {
                handle.abort();
                trace!(timer = id.get(), "timer aborted");
                true
            }
            None => false,
        }
    }
}

impl Drop for TokioScheduler {
    fn drop(&mut self) {
        for (_, handle) in self.timers.borrow_mut().drain() {
            handle.abort();
        }
    }
}

/// Resolve after `delay`.
pub async fn sleep(delay: Duration) {
    tokio::time::sleep(delay).await;
}
