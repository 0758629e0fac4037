//! Leading + trailing throttle over a [`Scheduler`].

use crate::config::RateConfig;
use crate::scheduler::{Scheduler, TimerId};
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use std::time::Duration;
use tracing::{debug, trace};

type Callback<A> = Rc<dyn Fn(A)>;

/// Where the window after a trailing call starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WindowAnchor {
    /// When the delivered payload was submitted.
    CallTime,
    /// When the trailing call actually fired.
    FireTime,
}

struct State<A> {
    // Start of the current window.
    last: Option<Duration>,
    pending: Option<TimerId>,
    // Latest payload seen inside the window, with its call time.
    trailing: Option<(A, Duration)>,
}

struct Inner<A> {
    scheduler: Rc<dyn Scheduler>,
    callback: RefCell<Callback<A>>,
    delay: Cell<Duration>,
    anchor: WindowAnchor,
    state: RefCell<State<A>>,
}

impl<A> Inner<A> {
    fn invoke(&self, args: A) {
        let callback = self.callback.borrow().clone();
        callback(args);
    }

    fn fire(&self) {
        let payload = {
            let mut state = self.state.borrow_mut();
            state.pending = None;
            let trailing = state.trailing.take();
            if let Some((_, called_at)) = &trailing {
                state.last = Some(match self.anchor {
                    WindowAnchor::CallTime => *called_at,
                    WindowAnchor::FireTime => self.scheduler.now(),
                });
            }
            trailing
        };
        if let Some((args, _)) = payload {
            debug!("throttle trailing call fired");
            self.invoke(args);
        }
    }
}

impl<A> Drop for Inner<A> {
    fn drop(&mut self) {
        if let Some(id) = self.state.get_mut().pending.take() {
            self.scheduler.cancel(id);
            trace!("throttle dropped, trailing call cancelled");
        }
    }
}

fn arm<A: 'static>(inner: &Rc<Inner<A>>, delay: Duration) -> TimerId {
    let weak: Weak<Inner<A>> = Rc::downgrade(inner);
    inner.scheduler.schedule(
        delay,
        Box::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.fire();
            }
        }),
    )
}

/// Invokes the callback at most once per `delay` window.
///
/// The first call after a quiet window runs synchronously. Calls inside the
/// window are collapsed into one trailing call with the latest payload, fired
/// when the window closes. A trailing call opens a new window anchored at the
/// time its payload was submitted.
///
/// # Examples
///
/// ```
/// use grabbag_timing::scheduler::{ManualScheduler, Scheduler};
/// use grabbag_timing::Throttle;
/// use std::cell::RefCell;
/// use std::rc::Rc;
/// use std::time::Duration;
///
/// let scheduler = Rc::new(ManualScheduler::new());
/// let seen = Rc::new(RefCell::new(Vec::new()));
/// let sink = seen.clone();
/// let throttle = Throttle::new(scheduler.clone(), Duration::from_millis(100), move |n: u32| {
///     sink.borrow_mut().push(n)
/// });
///
/// throttle.call(1);
/// throttle.call(2);
/// throttle.call(3);
/// assert_eq!(*seen.borrow(), vec![1]);
/// scheduler.advance(Duration::from_millis(100));
/// assert_eq!(*seen.borrow(), vec![1, 3]);
/// ```
pub struct Throttle<A: 'static> {
    inner: Rc<Inner<A>>,
}

impl<A: 'static> Clone for Throttle<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<A: 'static> Throttle<A> {
    pub fn new(
        scheduler: Rc<dyn Scheduler>,
        delay: Duration,
        callback: impl Fn(A) + 'static,
    ) -> Self {
        Self::anchored(scheduler, delay, WindowAnchor::CallTime, callback)
    }

    pub(crate) fn anchored(
        scheduler: Rc<dyn Scheduler>,
        delay: Duration,
        anchor: WindowAnchor,
        callback: impl Fn(A) + 'static,
    ) -> Self {
        Self {
            inner: Rc::new(Inner {
                scheduler,
                callback: RefCell::new(Rc::new(callback)),
                delay: Cell::new(delay),
                anchor,
                state: RefCell::new(State {
                    last: None,
                    pending: None,
                    trailing: None,
                }),
            }),
        }
    }

    pub fn from_config(
        scheduler: Rc<dyn Scheduler>,
        config: &RateConfig,
        callback: impl Fn(A) + 'static,
    ) -> Self {
        Self::new(scheduler, config.delay(), callback)
    }

    /// Fire now if the window has elapsed, otherwise keep `args` as the
    /// trailing call. A trailing call still pending when a call fires
    /// immediately (after [`reset`](Self::reset)) is delivered first.
    pub fn call(&self, args: A) {
        let inner = &self.inner;
        let now = inner.scheduler.now();
        let delay = inner.delay.get();

        let mut state = inner.state.borrow_mut();
        let last = state.last;
        if let Some(id) = state.pending.take() {
            inner.scheduler.cancel(id);
        }
        match last {
            Some(start) if now.saturating_sub(start) < delay => {
                let remaining = delay - now.saturating_sub(start);
                state.trailing = Some((args, now));
                state.pending = Some(arm(inner, remaining));
                trace!(
                    remaining_ms = remaining.as_millis() as u64,
                    "throttle trailing call armed"
                );
            }
            _ => {
                let earlier = state.trailing.take();
                state.last = Some(now);
                drop(state);
                if let Some((earlier, _)) = earlier {
                    debug!("throttle delivered trailing call early");
                    inner.invoke(earlier);
                }
                debug!("throttle fired immediately");
                inner.invoke(args);
            }
        }
    }

    /// Drop the trailing call, if any. The current window stays open.
    pub fn cancel(&self) -> bool {
        let mut state = self.inner.state.borrow_mut();
        state.trailing = None;
        match state.pending.take() {
            Some(id) => {
                self.inner.scheduler.cancel(id);
                debug!("throttle cancelled");
                true
            }
            None => false,
        }
    }

    /// Deliver the trailing call now. Returns whether anything was delivered.
    pub fn flush(&self) -> bool {
        let pending = self.inner.state.borrow_mut().pending.take();
        match pending {
            Some(id) => {
                self.inner.scheduler.cancel(id);
                debug!("throttle flushed");
                self.inner.fire();
                true
            }
            None => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.inner.state.borrow().pending.is_some()
    }

    /// Forget the current window so the next call fires immediately. A
    /// pending trailing call is kept and delivered before that call.
    pub fn reset(&self) {
        self.inner.state.borrow_mut().last = None;
    }

    /// Start a window now without invoking the callback.
    pub fn open_window(&self) {
        let now = self.inner.scheduler.now();
        self.inner.state.borrow_mut().last = Some(now);
    }

    pub fn delay(&self) -> Duration {
        self.inner.delay.get()
    }

    pub fn set_delay(&self, delay: Duration) {
        self.inner.delay.set(delay);
    }

    pub fn replace_callback(&self, callback: impl Fn(A) + 'static) {
        *self.inner.callback.borrow_mut() = Rc::new(callback);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::ManualScheduler;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    type Log = Rc<RefCell<Vec<(u64, i32)>>>;

    fn setup(delay: u64) -> (Rc<ManualScheduler>, Throttle<i32>, Log) {
        let scheduler = Rc::new(ManualScheduler::new());
        let log: Log = Rc::new(RefCell::new(Vec::new()));
        let (clock, sink) = (scheduler.clone(), log.clone());
        let throttle = Throttle::new(scheduler.clone(), ms(delay), move |n| {
            sink.borrow_mut().push((clock.now().as_millis() as u64, n));
        });
        (scheduler, throttle, log)
    }

    #[test]
    fn test_leading_and_trailing() {
        let (scheduler, throttle, log) = setup(100);
        throttle.call(0);
        scheduler.advance_to(ms(50));
        throttle.call(50);
        scheduler.advance_to(ms(150));
        throttle.call(150);
        scheduler.advance_to(ms(1000));
        assert_eq!(*log.borrow(), vec![(0, 0), (100, 50), (150, 150)]);
    }

    #[test]
    fn test_last_write_wins_inside_window() {
        let (scheduler, throttle, log) = setup(100);
        throttle.call(1);
        scheduler.advance_to(ms(10));
        throttle.call(2);
        scheduler.advance_to(ms(20));
        throttle.call(3);
        assert_eq!(scheduler.pending(), 1);
        scheduler.advance_to(ms(500));
        assert_eq!(*log.borrow(), vec![(0, 1), (100, 3)]);
    }

    #[test]
    fn test_trailing_window_is_anchored_at_call_time() {
        let (scheduler, throttle, log) = setup(100);
        throttle.call(1);
        scheduler.advance_to(ms(90));
        throttle.call(2);
        scheduler.advance_to(ms(100));
        // Window now starts at 90.
        scheduler.advance_to(ms(150));
        throttle.call(3);
        scheduler.advance_to(ms(500));
        assert_eq!(*log.borrow(), vec![(0, 1), (100, 2), (190, 3)]);
    }

    #[test]
    fn test_zero_delay_fires_every_call() {
        let (scheduler, throttle, log) = setup(0);
        throttle.call(1);
        throttle.call(2);
        assert_eq!(*log.borrow(), vec![(0, 1), (0, 2)]);
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn test_cancel_and_flush() {
        let (scheduler, throttle, log) = setup(100);
        throttle.call(1);
        throttle.call(2);
        assert!(throttle.cancel());
        scheduler.advance_to(ms(200));
        assert_eq!(*log.borrow(), vec![(0, 1)]);

        throttle.call(3);
        throttle.call(4);
        assert!(throttle.flush());
        assert!(!throttle.flush());
        assert_eq!(*log.borrow(), vec![(0, 1), (200, 3), (200, 4)]);
    }

    #[test]
    fn test_reset_allows_immediate_call() {
        let (_scheduler, throttle, log) = setup(100);
        throttle.call(1);
        throttle.reset();
        throttle.call(2);
        assert_eq!(*log.borrow(), vec![(0, 1), (0, 2)]);
        assert!(!throttle.is_pending());
    }

    #[test]
    fn test_reset_keeps_pending_trailing_call() {
        let (scheduler, throttle, log) = setup(100);
        throttle.call(1);
        scheduler.advance_to(ms(10));
        throttle.call(2);
        assert!(throttle.is_pending());
        throttle.reset();
        throttle.call(3);
        assert_eq!(*log.borrow(), vec![(0, 1), (10, 2), (10, 3)]);
        assert!(!throttle.is_pending());
        scheduler.advance_to(ms(500));
        assert_eq!(log.borrow().len(), 3);
    }

    #[test]
    fn test_fire_time_anchor_spaces_trailing_windows() {
        let scheduler = Rc::new(ManualScheduler::new());
        let log: Log = Rc::new(RefCell::new(Vec::new()));
        let (clock, sink) = (scheduler.clone(), log.clone());
        let record = move |n| sink.borrow_mut().push((clock.now().as_millis() as u64, n));
        let throttle =
            Throttle::anchored(scheduler.clone(), ms(100), WindowAnchor::FireTime, record);
        throttle.call(0);
        scheduler.advance_to(ms(50));
        throttle.call(50);
        scheduler.advance_to(ms(150));
        throttle.call(150);
        scheduler.advance_to(ms(1000));
        assert_eq!(*log.borrow(), vec![(0, 0), (100, 50), (200, 150)]);
    }

    #[test]
    fn test_open_window_defers_first_call() {
        let (scheduler, throttle, log) = setup(100);
        throttle.open_window();
        scheduler.advance_to(ms(30));
        throttle.call(1);
        assert!(log.borrow().is_empty());
        assert!(throttle.is_pending());
        scheduler.advance_to(ms(100));
        assert_eq!(*log.borrow(), vec![(100, 1)]);
    }

    #[test]
    fn test_drop_cancels_trailing_call() {
        let (scheduler, throttle, log) = setup(100);
        throttle.call(1);
        throttle.call(2);
        drop(throttle);
        scheduler.advance(ms(200));
        assert_eq!(*log.borrow(), vec![(0, 1)]);
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn test_replace_callback() {
        let (scheduler, throttle, log) = setup(100);
        throttle.call(1);
        throttle.call(2);
        let other = Rc::new(RefCell::new(Vec::new()));
        let sink = other.clone();
        throttle.replace_callback(move |n| sink.borrow_mut().push(n));
        scheduler.advance(ms(100));
        assert_eq!(*log.borrow(), vec![(0, 1)]);
        assert_eq!(*other.borrow(), vec![2]);
    }
}
