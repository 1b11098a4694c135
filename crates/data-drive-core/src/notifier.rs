//! Publish/subscribe primitive shared by every reactive value.
//!
//! # Design
//!
//! [`Notifier<A>`] is a cheap handle over an ordered list of callbacks
//! stored in `Rc<RefCell<..>>`. Cloning the handle shares the list.
//!
//! # Invariants
//!
//! 1. Callbacks are invoked in registration order.
//! 2. [`Notifier::notify`] dispatches to a snapshot of the list taken when
//!    the call starts. Callbacks added or removed while a notification is
//!    in flight only affect later calls.
//! 3. No borrow is held while a callback runs, so a callback may freely add,
//!    remove or trigger further notifications on the same notifier.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// A registered callback. Identity (`Rc::ptr_eq`) is what [`Notifier::remove`]
/// matches on.
pub type Callback<A> = Rc<dyn Fn(&A)>;

/// An ordered list of callbacks. Clones share the same list.
pub struct Notifier<A> {
    listeners: Rc<RefCell<Vec<Callback<A>>>>,
}

impl<A> Clone for Notifier<A> {
    fn clone(&self) -> Self {
        Self {
            listeners: Rc::clone(&self.listeners),
        }
    }
}

impl<A> Default for Notifier<A> {
    fn default() -> Self {
        Self {
            listeners: Rc::new(RefCell::new(Vec::new())),
        }
    }
}

impl<A> fmt::Debug for Notifier<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notifier")
            .field("listener_count", &self.listeners.borrow().len())
            .finish()
    }
}

impl<A: 'static> Notifier<A> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback. The same callback may be registered more than
    /// once, in which case it fires once per registration.
    pub fn add(&self, listener: Callback<A>) -> &Self {
        self.listeners.borrow_mut().push(listener);
        self
    }

    /// Wrap `f` into a [`Callback`], register it and hand it back so it can
    /// later be passed to [`Notifier::remove`].
    pub fn subscribe(&self, f: impl Fn(&A) + 'static) -> Callback<A> {
        let callback: Callback<A> = Rc::new(f);
        self.add(Rc::clone(&callback));
        callback
    }

    /// Unregister the first registration of `listener`. No-op if absent.
    pub fn remove(&self, listener: &Callback<A>) -> &Self {
        let mut listeners = self.listeners.borrow_mut();
        if let Some(pos) = listeners.iter().position(|l| Rc::ptr_eq(l, listener)) {
            listeners.remove(pos);
        }
        self
    }

    /// Invoke every currently registered callback with `payload`.
    pub fn notify(&self, payload: &A) -> &Self {
        // Snapshot first so callbacks can mutate the list.
        let snapshot: Vec<Callback<A>> = self.listeners.borrow().clone();
        for listener in &snapshot {
            listener(payload);
        }
        self
    }

    pub fn len(&self) -> usize {
        self.listeners.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.borrow().is_empty()
    }

    /// Returns `true` when both handles share the same listener list.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.listeners, &other.listeners)
    }
}

/// Anything that exposes a [`Notifier`] can be listened to.
pub trait Observable<A> {
    fn notifier(&self) -> &Notifier<A>;
}

impl<A> Observable<A> for Notifier<A> {
    fn notifier(&self) -> &Notifier<A> {
        self
    }
}

/// A callback that is attached to at most one source at a time.
///
/// Calling [`Listener::listen`] again moves the callback to the new source.
/// Dropping the listener detaches it.
pub struct Listener<A: 'static> {
    source: RefCell<Option<Notifier<A>>>,
    callback: Callback<A>,
}

impl<A: 'static> Listener<A> {
    pub fn new(callback: impl Fn(&A) + 'static) -> Self {
        Self {
            source: RefCell::new(None),
            callback: Rc::new(callback),
        }
    }

    /// Attach to `source`, detaching from the previous source first.
    pub fn listen<O: Observable<A> + ?Sized>(&self, source: &O) {
        self.attach(Some(source.notifier().clone()));
    }

    /// Detach from the current source, if any.
    pub fn shutdown(&self) {
        self.attach(None);
    }

    pub fn is_listening(&self) -> bool {
        self.source.borrow().is_some()
    }

    fn attach(&self, next: Option<Notifier<A>>) {
        let prev = self.source.replace(next);
        if let Some(prev) = prev {
            prev.remove(&self.callback);
        }
        if let Some(source) = self.source.borrow().as_ref() {
            source.add(Rc::clone(&self.callback));
        }
    }
}

impl<A: 'static> Drop for Listener<A> {
    fn drop(&mut self) {
        if let Some(prev) = self.source.get_mut().take() {
            prev.remove(&self.callback);
        }
    }
}

impl<A: 'static> fmt::Debug for Listener<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listener")
            .field("listening", &self.is_listening())
            .finish()
    }
}
