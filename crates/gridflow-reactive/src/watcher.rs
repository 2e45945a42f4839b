#![forbid(unsafe_code)]

//! Side-effect callbacks fired when named properties change.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::store::{Change, Store, WeakStore};
use crate::subscription::Subscription;
use crate::value::Value;

struct WatcherInner {
    store: WeakStore,
    names: Vec<String>,
    callback: Box<dyn Fn(&Change)>,
    immediate: Cell<bool>,
    subscription: RefCell<Option<Subscription>>,
}

/// Watches one or more properties of a [`Store`].
///
/// The callback fires once per matching change event, so a watcher on
/// `["a", "b"]` fires twice for a batch that changed both. It retains no value
/// of its own.
///
/// The store only holds a weak reference, so dropping the last handle stops
/// the callback.
#[must_use = "dropping the last Watcher handle stops the callback"]
#[derive(Clone)]
pub struct Watcher {
    inner: Rc<WatcherInner>,
}

impl Watcher {
    pub fn new<N: Into<String>>(
        store: &Store,
        names: impl IntoIterator<Item = N>,
        callback: impl Fn(&Change) + 'static,
    ) -> Self {
        Self {
            inner: Rc::new(WatcherInner {
                store: store.downgrade(),
                names: names.into_iter().map(Into::into).collect(),
                callback: Box::new(callback),
                immediate: Cell::new(false),
                subscription: RefCell::new(None),
            }),
        }
    }

    /// Fire once on activation with `(current, undefined)` for each watched
    /// name.
    #[must_use]
    pub fn immediate(self, immediate: bool) -> Self {
        self.inner.immediate.set(immediate);
        self
    }

    pub fn activate(&self) {
        if self.is_active() {
            return;
        }
        let Some(store) = self.inner.store.upgrade() else {
            return;
        };

        if self.inner.immediate.get() {
            for name in &self.inner.names {
                (self.inner.callback)(&Change {
                    name: name.clone(),
                    value: store.get(name),
                    old: Value::undefined(),
                    batch: None,
                });
            }
        }

        let weak = Rc::downgrade(&self.inner);
        let subscription = store.subscribe(move |change| {
            if let Some(inner) = weak.upgrade() {
                if inner.names.iter().any(|n| *n == change.name) {
                    (inner.callback)(change);
                }
            }
        });
        *self.inner.subscription.borrow_mut() = Some(subscription);
    }

    /// Stop watching. Idempotent.
    pub fn deactivate(&self) {
        let subscription = self.inner.subscription.borrow_mut().take();
        drop(subscription);
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.inner.subscription.borrow().is_some()
    }

    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.inner.names
    }
}

impl fmt::Debug for Watcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Watcher")
            .field("names", &self.inner.names)
            .field("active", &self.is_active())
            .finish()
    }
}
