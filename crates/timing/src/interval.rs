//! Repeating timer that can be paused and resumed.

use crate::scheduler::{Scheduler, TimerId};
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use std::time::Duration;
use tracing::{debug, warn};

const MIN_PERIOD: Duration = Duration::from_millis(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntervalOptions {
    /// Run the callback once, synchronously, whenever the interval starts.
    pub start_immediately: bool,
    /// Start right away.
    pub active: bool,
}

impl Default for IntervalOptions {
    fn default() -> Self {
        Self {
            start_immediately: false,
            active: true,
        }
    }
}

struct State {
    active: bool,
    pending: Option<TimerId>,
}

struct Inner {
    scheduler: Rc<dyn Scheduler>,
    callback: RefCell<Rc<dyn Fn()>>,
    period: Cell<Duration>,
    start_immediately: bool,
    state: RefCell<State>,
}

impl Inner {
    fn tick(&self) {
        let callback = self.callback.borrow().clone();
        callback();
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let Some(id) = self.state.get_mut().pending.take() {
            self.scheduler.cancel(id);
        }
    }
}

fn arm(inner: &Rc<Inner>) -> TimerId {
    let weak: Weak<Inner> = Rc::downgrade(inner);
    inner.scheduler.schedule(
        inner.period.get(),
        Box::new(move || {
            if let Some(inner) = weak.upgrade() {
                on_timer(&inner);
            }
        }),
    )
}

fn on_timer(inner: &Rc<Inner>) {
    {
        let mut state = inner.state.borrow_mut();
        state.pending = None;
        if !state.active {
            return;
        }
        state.pending = Some(arm(inner));
    }
    inner.tick();
}

fn clamp_period(period: Duration) -> Duration {
    if period < MIN_PERIOD {
        warn!(period_us = period.as_micros() as u64, "interval period clamped to 1ms");
        return MIN_PERIOD;
    }
    period
}

/// Runs a callback every `period` while active.
///
/// The next tick is armed before the callback runs, so the callback may
/// deactivate the interval or change its period. Dropping the interval stops
/// it.
///
/// # Examples
///
/// ```
/// use grabbag_timing::scheduler::ManualScheduler;
/// use grabbag_timing::{Interval, IntervalOptions};
/// use std::cell::Cell;
/// use std::rc::Rc;
/// use std::time::Duration;
///
/// let scheduler = Rc::new(ManualScheduler::new());
/// let ticks = Rc::new(Cell::new(0));
/// let counter = ticks.clone();
/// let interval = Interval::new(
///     scheduler.clone(),
///     Duration::from_millis(10),
///     IntervalOptions::default(),
///     move || counter.set(counter.get() + 1),
/// );
///
/// scheduler.advance(Duration::from_millis(35));
/// assert_eq!(ticks.get(), 3);
///
/// interval.set_active(false);
/// scheduler.advance(Duration::from_millis(100));
/// assert_eq!(ticks.get(), 3);
/// ```
pub struct Interval {
    inner: Rc<Inner>,
}

impl Interval {
    pub fn new(
        scheduler: Rc<dyn Scheduler>,
        period: Duration,
        options: IntervalOptions,
        callback: impl Fn() + 'static,
    ) -> Self {
        let interval = Self {
            inner: Rc::new(Inner {
                scheduler,
                callback: RefCell::new(Rc::new(callback)),
                period: Cell::new(clamp_period(period)),
                start_immediately: options.start_immediately,
                state: RefCell::new(State {
                    active: false,
                    pending: None,
                }),
            }),
        };
        if options.active {
            interval.start();
        }
        interval
    }

    fn start(&self) {
        {
            let mut state = self.inner.state.borrow_mut();
            state.active = true;
            state.pending = Some(arm(&self.inner));
        }
        debug!(period_ms = self.inner.period.get().as_millis() as u64, "interval started");
        if self.inner.start_immediately {
            self.inner.tick();
        }
    }

    fn stop(&self) {
        let mut state = self.inner.state.borrow_mut();
        state.active = false;
        if let Some(id) = state.pending.take() {
            self.inner.scheduler.cancel(id);
        }
        debug!("interval stopped");
    }

    pub fn set_active(&self, active: bool) {
        if active == self.is_active() {
            return;
        }
        if active {
            self.start();
        } else {
            self.stop();
        }
    }

    pub fn is_active(&self) -> bool {
        self.inner.state.borrow().active
    }

    pub fn period(&self) -> Duration {
        self.inner.period.get()
    }

    /// Change the period. An active interval restarts its cycle, including
    /// the immediate tick if one was requested.
    pub fn set_period(&self, period: Duration) {
        self.inner.period.set(clamp_period(period));
        if self.is_active() {
            self.stop();
            self.start();
        }
    }

    pub fn replace_callback(&self, callback: impl Fn() + 'static) {
        *self.inner.callback.borrow_mut() = Rc::new(callback);
    }
}
