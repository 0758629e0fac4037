use super::{Scheduler, Task, TimerId};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;
use tracing::trace;

#[derive(Default)]
struct Clock {
    now: Duration,
    next_id: u64,
    // Ordered by deadline, then by scheduling order.
    queue: BTreeMap<(Duration, u64), Task>,
    deadlines: HashMap<u64, Duration>,
}

/// A virtual clock that only moves when told to.
///
/// Timers fire during [`advance`](Self::advance) /
/// [`advance_to`](Self::advance_to), in deadline order, with the clock set to
/// each timer's deadline while it runs. Timers scheduled by a running task
/// fire in the same call if they fall due before the target.
///
/// # Examples
///
/// ```
/// use grabbag_timing::scheduler::{ManualScheduler, Scheduler};
/// use std::cell::Cell;
/// use std::rc::Rc;
/// use std::time::Duration;
///
/// let scheduler = ManualScheduler::new();
/// let fired = Rc::new(Cell::new(false));
/// let flag = fired.clone();
/// scheduler.schedule(Duration::from_millis(10), Box::new(move || flag.set(true)));
///
/// scheduler.advance(Duration::from_millis(9));
/// assert!(!fired.get());
/// scheduler.advance(Duration::from_millis(1));
/// assert!(fired.get());
/// ```
#[derive(Default)]
pub struct ManualScheduler {
    clock: RefCell<Clock>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the clock forward by `by`, firing every timer that falls due.
    pub fn advance(&self, by: Duration) {
        let target = self.now() + by;
        self.advance_to(target);
    }

    /// Move the clock to `target`, firing every timer due at or before it.
    /// The clock never moves backwards.
    pub fn advance_to(&self, target: Duration) {
        loop {
            let due = {
                let mut clock = self.clock.borrow_mut();
                let next = clock.queue.keys().next().copied();
                let Some((deadline, id)) = next else {
                    break;
                };
                if deadline > target {
                    break;
                }
                clock.deadlines.remove(&id);
                clock.now = clock.now.max(deadline);
                clock.queue.remove(&(deadline, id))
            };
            if let Some(task) = due {
                task();
            }
        }
        let mut clock = self.clock.borrow_mut();
        clock.now = clock.now.max(target);
    }

    /// Number of timers waiting to fire.
    pub fn pending(&self) -> usize {
        self.clock.borrow().queue.len()
    }

    pub fn next_deadline(&self) -> Option<Duration> {
        self.clock.borrow().queue.keys().next().map(|(deadline, _)| *deadline)
    }
}

impl Scheduler for ManualScheduler {
    fn now(&self) -> Duration {
        self.clock.borrow().now
    }

    fn schedule(&self, delay: Duration, task: Task) -> TimerId {
        let mut clock = self.clock.borrow_mut();
        let id = clock.next_id;
        clock.next_id += 1;
        let deadline = clock.now + delay;
        clock.queue.insert((deadline, id), task);
        clock.deadlines.insert(id, deadline);
        trace!(timer = id, deadline_ms = deadline.as_millis() as u64, "timer scheduled");
        TimerId::from_raw(id)
    }

    fn cancel(&self, id: TimerId) -> bool {
        let mut clock = self.clock.borrow_mut();
        match clock.deadlines.remove(&id.get()) {
            Some(deadline) => {
                trace!(timer = id.get(), "timer cancelled");
                clock.queue.remove(&(deadline, id.get())).is_some()
            }
            None => false,
        }
    }
}
