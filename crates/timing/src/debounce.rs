//! Trailing-edge debounce over a [`Scheduler`].

use crate::config::RateConfig;
use crate::scheduler::{Scheduler, TimerId};
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::{Rc, Weak};
use std::time::Duration;
use tracing::{debug, trace};

type Callback<A> = Rc<dyn Fn(A)>;

struct State<A> {
    pending: Option<TimerId>,
    // Holds one payload unless the delay is zero, in which case every call
    // is kept and delivered in order.
    queued: VecDeque<A>,
    // Whether the back of `queued` is a delayed call the next call replaces.
    replace_last: bool,
}

struct Inner<A> {
    scheduler: Rc<dyn Scheduler>,
    callback: RefCell<Callback<A>>,
    delay: Cell<Duration>,
    state: RefCell<State<A>>,
}

impl<A> Inner<A> {
    fn invoke(&self, args: A) {
        let callback = self.callback.borrow().clone();
        callback(args);
    }

    fn fire(&self) {
        let batch = {
            let mut state = self.state.borrow_mut();
            state.pending = None;
            state.replace_last = false;
            std::mem::take(&mut state.queued)
        };
        if batch.is_empty() {
            return;
        }
        debug!(calls = batch.len(), "debounce fired");
        for args in batch {
            self.invoke(args);
        }
    }
}

impl<A> Drop for Inner<A> {
    fn drop(&mut self) {
        if let Some(id) = self.state.get_mut().pending.take() {
            self.scheduler.cancel(id);
            trace!("debounce dropped, pending call cancelled");
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

/// Delays calls until `delay` has passed without another call, then invokes
/// the callback with the last payload.
///
/// Cloning gives another handle to the same state. When the last handle is
/// dropped, a pending call is cancelled.
///
/// # Examples
///
/// ```
/// use grabbag_timing::scheduler::ManualScheduler;
/// use grabbag_timing::Debounce;
/// use std::cell::RefCell;
/// use std::rc::Rc;
/// use std::time::Duration;
///
/// let scheduler = Rc::new(ManualScheduler::new());
/// let seen = Rc::new(RefCell::new(Vec::new()));
/// let sink = seen.clone();
/// let debounce = Debounce::new(scheduler.clone(), Duration::from_millis(100), move |q: &str| {
///     sink.borrow_mut().push(q.to_string())
/// });
///
/// debounce.call("r");
/// debounce.call("ru");
/// debounce.call("rust");
/// scheduler.advance(Duration::from_millis(100));
/// assert_eq!(*seen.borrow(), vec!["rust"]);
/// ```
pub struct Debounce<A: 'static> {
    inner: Rc<Inner<A>>,
}

impl<A: 'static> Clone for Debounce<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<A: 'static> Debounce<A> {
    pub fn new(
        scheduler: Rc<dyn Scheduler>,
        delay: Duration,
        callback: impl Fn(A) + 'static,
    ) -> Self {
        Self {
            inner: Rc::new(Inner {
                scheduler,
                callback: RefCell::new(Rc::new(callback)),
                delay: Cell::new(delay),
                state: RefCell::new(State {
                    pending: None,
                    queued: VecDeque::new(),
                    replace_last: false,
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

    /// Record a call. The callback never runs synchronously.
    pub fn call(&self, args: A) {
        let delay = self.inner.delay.get();
        let mut state = self.inner.state.borrow_mut();
        if delay.is_zero() {
            state.queued.push_back(args);
            state.replace_last = false;
            if state.pending.is_some() {
                return;
            }
        } else {
            if let Some(id) = state.pending.take() {
                self.inner.scheduler.cancel(id);
                trace!("debounce timer re-armed");
            }
            // Calls queued while the delay was zero are never coalesced.
            if state.replace_last {
                state.queued.pop_back();
            }
            state.queued.push_back(args);
            state.replace_last = true;
        }
        state.pending = Some(arm(&self.inner, delay));
    }

    /// Drop the pending call, if any. Returns whether one was pending.
    pub fn cancel(&self) -> bool {
        let mut state = self.inner.state.borrow_mut();
        state.queued.clear();
        state.replace_last = false;
        match state.pending.take() {
            Some(id) => {
                self.inner.scheduler.cancel(id);
                debug!("debounce cancelled");
                true
            }
            None => false,
        }
    }

    /// Deliver the pending call now. Returns whether anything was delivered.
    pub fn flush(&self) -> bool {
        let pending = self.inner.state.borrow_mut().pending.take();
        match pending {
            Some(id) => {
                self.inner.scheduler.cancel(id);
                debug!("debounce flushed");
                self.inner.fire();
                true
            }
            None => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.inner.state.borrow().pending.is_some()
    }

    pub fn delay(&self) -> Duration {
        self.inner.delay.get()
    }

    /// Change the quiet period for later calls. A pending call keeps the
    /// deadline it was armed with. Calls queued under a zero delay are still
    /// delivered, together with the next delayed call.
    pub fn set_delay(&self, delay: Duration) {
        self.inner.delay.set(delay);
    }

    /// Swap the callback. A pending call is delivered to the new one.
    pub fn replace_callback(&self, callback: impl Fn(A) + 'static) {
        *self.inner.callback.borrow_mut() = Rc::new(callback);
    }
}
