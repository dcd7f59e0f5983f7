//! Observable value cells for the Vesta runtime.
//!
//! An [`Observable`] holds a single value and an ordered list of subscribers.
//! Every subscriber is invoked once with the current value the moment it
//! subscribes, and again on every [`Observable::set`], in subscription order.
//!
//! ```text
//!   subscribe(cb) ──► cb(current)
//!   set(v)        ──► value = v ──► cb₁(v), cb₂(v), … cbₙ(v)
//!   clear()       ──► set(T::default())
//!   destroy()     ──► subscribers dropped, further sets ignored
//! ```
//!
//! Cells are single-threaded handles: cloning an `Observable` yields another
//! handle onto the same value. Notification is synchronous and never
//! memoized; setting an equal value still notifies everyone.
//!
//! # Re-entrancy
//!
//! Subscribers receive a snapshot of the value and run against a snapshot of
//! the subscriber list, so a subscriber may call `get`, `set` or `subscribe`
//! on the same cell without tripping a borrow conflict.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

/// Handle returned by [`Observable::subscribe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub u64);

type Subscriber<T> = Rc<dyn Fn(&T)>;

struct Inner<T> {
    /// Current value
    value: RefCell<T>,
    /// Subscribers in registration order
    subscribers: RefCell<Vec<(SubscriptionId, Subscriber<T>)>>,
    /// Next subscription identifier
    next_id: Cell<u64>,
    /// Set once `destroy` has run
    destroyed: Cell<bool>,
}

/// A reactive value cell.
pub struct Observable<T> {
    inner: Rc<Inner<T>>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: Clone + Default + 'static> Default for Observable<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observable")
            .field("value", &self.inner.value.borrow())
            .field("subscribers", &self.inner.subscribers.borrow().len())
            .field("destroyed", &self.inner.destroyed.get())
            .finish()
    }
}

impl<T: Clone + Default + 'static> Observable<T> {
    /// Create a cell holding `value` with no subscribers.
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(Inner {
                value: RefCell::new(value),
                subscribers: RefCell::new(Vec::new()),
                next_id: Cell::new(1),
                destroyed: Cell::new(false),
            }),
        }
    }

    /// Get a copy of the current value.
    pub fn get(&self) -> T {
        self.inner.value.borrow().clone()
    }

    /// Run `f` against the current value without cloning it.
    ///
    /// `f` must not call `set` on the same cell.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.value.borrow())
    }

    /// Replace the value and notify every subscriber.
    ///
    /// Ignored once the cell is destroyed.
    pub fn set(&self, value: T) {
        if self.inner.destroyed.get() {
            tracing::debug!("[cell] set on a destroyed cell ignored");
            return;
        }
        *self.inner.value.borrow_mut() = value;
        self.notify();
    }

    /// Mutate the value in place, then notify.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        if self.inner.destroyed.get() {
            tracing::debug!("[cell] update on a destroyed cell ignored");
            return;
        }
        f(&mut self.inner.value.borrow_mut());
        self.notify();
    }

    /// Reset the value to the empty sentinel (`T::default()`) and notify.
    pub fn clear(&self) {
        self.set(T::default());
    }

    /// Register `callback`, invoking it immediately with the current value.
    pub fn subscribe(&self, callback: impl Fn(&T) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.inner.next_id.get());
        self.inner.next_id.set(id.0 + 1);

        let callback: Subscriber<T> = Rc::new(callback);
        if !self.inner.destroyed.get() {
            self.inner
                .subscribers
                .borrow_mut()
                .push((id, Rc::clone(&callback)));
        }

        let current = self.get();
        callback(&current);
        id
    }

    /// Remove a subscriber. Returns false if it was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.inner.subscribers.borrow_mut();
        let before = subscribers.len();
        subscribers.retain(|(sub, _)| *sub != id);
        subscribers.len() != before
    }

    /// Drop all subscribers and refuse further updates.
    pub fn destroy(&self) {
        self.inner.destroyed.set(true);
        self.inner.subscribers.borrow_mut().clear();
    }

    /// Whether `destroy` has been called.
    pub fn is_destroyed(&self) -> bool {
        self.inner.destroyed.get()
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.borrow().len()
    }

    fn notify(&self) {
        let value = self.get();
        let subscribers: Vec<Subscriber<T>> = self
            .inner
            .subscribers
            .borrow()
            .iter()
            .map(|(_, cb)| Rc::clone(cb))
            .collect();

        for subscriber in subscribers {
            subscriber(&value);
        }
    }
}
