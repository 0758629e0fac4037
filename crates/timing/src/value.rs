//! Value-tracking adapters: a settled value that follows a stream of updates
//! at a controlled rate.

use crate::debounce::Debounce;
use crate::scheduler::Scheduler;
use crate::throttle::{Throttle, WindowAnchor};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

// The slot hands out `Rc` snapshots, so observers and `with` closures run
// with no borrow held and may call `set` again.
type Slot<T> = Rc<RefCell<Rc<T>>>;

fn settle<T: 'static>(slot: Slot<T>, observer: impl Fn(&T) + 'static) -> impl Fn(T) + 'static {
    move |value: T| {
        let value = Rc::new(value);
        *slot.borrow_mut() = Rc::clone(&value);
        observer(&value);
    }
}

fn snapshot<T>(slot: &Slot<T>) -> Rc<T> {
    slot.borrow().clone()
}

/// A value that settles `delay` after the last [`set`](Self::set).
///
/// # Examples
///
/// ```
/// use grabbag_timing::scheduler::ManualScheduler;
/// use grabbag_timing::DebouncedValue;
/// use std::rc::Rc;
/// use std::time::Duration;
///
/// let scheduler = Rc::new(ManualScheduler::new());
/// let query = DebouncedValue::new(scheduler.clone(), String::new(), Duration::from_millis(300));
///
/// query.set("ru".to_string());
/// query.set("rust".to_string());
/// assert_eq!(query.get(), "");
///
/// scheduler.advance(Duration::from_millis(300));
/// assert_eq!(query.get(), "rust");
/// ```
pub struct DebouncedValue<T: 'static> {
    settled: Slot<T>,
    debounce: Debounce<T>,
}

impl<T: 'static> DebouncedValue<T> {
    pub fn new(scheduler: Rc<dyn Scheduler>, initial: T, delay: Duration) -> Self {
        Self::with_observer(scheduler, initial, delay, |_| {})
    }

    /// Like [`new`](Self::new), and `observer` sees every settled value.
    pub fn with_observer(
        scheduler: Rc<dyn Scheduler>,
        initial: T,
        delay: Duration,
        observer: impl Fn(&T) + 'static,
    ) -> Self {
        let settled = Rc::new(RefCell::new(Rc::new(initial)));
        let debounce = Debounce::new(scheduler, delay, settle(Rc::clone(&settled), observer));
        Self { settled, debounce }
    }

    pub fn set(&self, value: T) {
        self.debounce.call(value);
    }

    pub fn get(&self) -> T
    where
        T: Clone,
    {
        T::clone(&snapshot(&self.settled))
    }

    /// Run `f` on the settled value.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&snapshot(&self.settled))
    }

    pub fn is_pending(&self) -> bool {
        self.debounce.is_pending()
    }

    pub fn set_delay(&self, delay: Duration) {
        self.debounce.set_delay(delay);
    }
}

/// A value that follows updates at most once per `delay` window.
///
/// The initial value counts as the first update, so the window is open at
/// construction and an immediate `set` lands as a trailing update. Each
/// window starts when the value actually changes, so two changes are always
/// at least `delay` apart.
pub struct ThrottledValue<T: 'static> {
    settled: Slot<T>,
    throttle: Throttle<T>,
}

impl<T: 'static> ThrottledValue<T> {
    pub fn new(scheduler: Rc<dyn Scheduler>, initial: T, delay: Duration) -> Self {
        Self::with_observer(scheduler, initial, delay, |_| {})
    }

    pub fn with_observer(
        scheduler: Rc<dyn Scheduler>,
        initial: T,
        delay: Duration,
        observer: impl Fn(&T) + 'static,
    ) -> Self {
        let settled = Rc::new(RefCell::new(Rc::new(initial)));
        let settle = settle(Rc::clone(&settled), observer);
        let throttle = Throttle::anchored(scheduler, delay, WindowAnchor::FireTime, settle);
        throttle.open_window();
        Self { settled, throttle }
    }

    pub fn set(&self, value: T) {
        self.throttle.call(value);
    }

    pub fn get(&self) -> T
    where
        T: Clone,
    {
        T::clone(&snapshot(&self.settled))
    }

    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&snapshot(&self.settled))
    }

    pub fn is_pending(&self) -> bool {
        self.throttle.is_pending()
    }

    pub fn set_delay(&self, delay: Duration) {
        self.throttle.set_delay(delay);
    }
}
