#![forbid(unsafe_code)]

//! Named-property observable store with explicit batching.
//!
//! # Design
//!
//! [`Store`] is a handle to shared, reference-counted state: an open map from
//! property name to [`Value`], an ordered listener list, and the batch
//! bookkeeping (`pending`, `batch_depth`). Cloning a `Store` yields another
//! handle to the **same** state.
//!
//! Every assignment emits a [`Change`]. Outside a batch the change is
//! delivered synchronously, depth-first, to every listener in subscription
//! order before `set` returns. Inside a batch the value is assigned
//! immediately (reads see the latest write) but delivery is deferred to the
//! outermost batch exit.
//!
//! # Invariants
//!
//! 1. Outside a batch, each `set` produces exactly one notification whose
//!    `old` is the value immediately prior to that call.
//! 2. Within a batch, N writes to one name produce exactly one notification at
//!    flush, with `old` = the pre-batch value and `value` = the value current
//!    at flush time.
//! 3. A flush notifies names in the order they were first written during the
//!    batch, and every change of one flush carries the same [`BatchId`].
//! 4. Nested batches flush only when the outermost one exits.
//! 5. `pending` is detached before delivery starts, so a listener writing
//!    during a flush produces an immediate, non-batched notification rather
//!    than joining the flush in progress.
//!
//! # Failure Modes
//!
//! - **Listener error**: delivery continues to the remaining listeners and the
//!   first error is returned from `set` / `batch`.
//! - **Batch closure error or panic**: already-recorded pending changes are
//!   flushed before the error (or panic) propagates.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use ahash::AHashMap;

use crate::batch::BatchScope;
use crate::error::{ReactiveError, Result};
use crate::subscription::Subscription;
use crate::value::{Property, Value};

/// Identifier of a registered store listener.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Identifier shared by every change delivered from one batch flush.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BatchId(u64);

/// A property change notification.
#[derive(Clone, Debug, PartialEq)]
pub struct Change {
    pub name: String,
    pub value: Value,
    pub old: Value,
    /// `Some` when the change is delivered by a batch flush.
    pub batch: Option<BatchId>,
}

type Listener = dyn Fn(&Change) -> Result<()>;

struct StoreInner {
    values: AHashMap<String, Value>,
    /// `(name, pre-batch old value)` in first-write order.
    pending: Vec<(String, Value)>,
    pending_index: AHashMap<String, usize>,
    batch_depth: usize,
    listeners: Vec<(ListenerId, Rc<Listener>)>,
    next_listener: u64,
    next_batch: u64,
}

/// Shared, observable map of named properties.
#[derive(Clone)]
pub struct Store {
    inner: Rc<RefCell<StoreInner>>,
}

/// Non-owning handle to a [`Store`], used by listeners so they never keep
/// their own store alive.
#[derive(Clone)]
pub struct WeakStore {
    inner: Weak<RefCell<StoreInner>>,
}

impl WeakStore {
    #[must_use]
    pub fn upgrade(&self) -> Option<Store> {
        self.inner.upgrade().map(|inner| Store { inner })
    }
}

impl Store {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(StoreInner {
                values: AHashMap::new(),
                pending: Vec::new(),
                pending_index: AHashMap::new(),
                batch_depth: 0,
                listeners: Vec::new(),
                next_listener: 0,
                next_batch: 0,
            })),
        }
    }

    /// Seed a property during construction. No notification is emitted.
    #[must_use]
    pub fn with<T: Property>(self, name: impl Into<String>, value: T) -> Self {
        self.inner
            .borrow_mut()
            .values
            .insert(name.into(), Value::new(value));
        self
    }

    #[must_use]
    pub fn downgrade(&self) -> WeakStore {
        WeakStore {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Whether two handles refer to the same store.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Current value of `name`, undefined when absent.
    #[must_use]
    pub fn get(&self, name: &str) -> Value {
        self.inner
            .borrow()
            .values
            .get(name)
            .cloned()
            .unwrap_or_default()
    }

    /// Current value of `name` cloned out as `T`.
    #[must_use]
    pub fn get_as<T: Property + Clone>(&self, name: &str) -> Option<T> {
        self.get(name).get::<T>()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.inner.borrow().values.contains_key(name)
    }

    /// Property names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.inner.borrow().values.keys().cloned().collect();
        names.sort_unstable();
        names
    }

    /// All `(name, value)` pairs, sorted by name.
    #[must_use]
    pub fn snapshot(&self) -> Vec<(String, Value)> {
        let mut entries: Vec<(String, Value)> = self
            .inner
            .borrow()
            .values
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();
        entries.sort_unstable_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    /// Assign `value` to `name`. See [`set_value`](Self::set_value).
    pub fn set<T: Property>(&self, name: &str, value: T) -> Result<()> {
        self.set_value(name, Value::new(value))
    }

    /// Assign `value` to `name` and notify.
    ///
    /// Outside a batch every listener runs before this returns; inside a batch
    /// the change is recorded for the flush.
    pub fn set_value(&self, name: &str, value: Value) -> Result<()> {
        let change = {
            let mut inner = self.inner.borrow_mut();
            let old = inner
                .values
                .insert(name.to_owned(), value.clone())
                .unwrap_or_default();
            if inner.batch_depth > 0 {
                if !inner.pending_index.contains_key(name) {
                    let slot = inner.pending.len();
                    inner.pending.push((name.to_owned(), old));
                    inner.pending_index.insert(name.to_owned(), slot);
                }
                return Ok(());
            }
            Change {
                name: name.to_owned(),
                value,
                old,
                batch: None,
            }
        };
        self.emit(&change)
    }

    /// Run `f` with notifications deferred, then flush.
    ///
    /// The flush happens before `f`'s error is returned, so no recorded write
    /// goes un-notified. If `f` succeeds, the first listener error raised by
    /// the flush is returned instead.
    pub fn batch<R, E>(
        &self,
        f: impl FnOnce() -> std::result::Result<R, E>,
    ) -> std::result::Result<R, E>
    where
        E: From<ReactiveError>,
    {
        let scope = self.begin_batch();
        let result = f();
        let flushed = scope.end();
        let value = result?;
        flushed?;
        Ok(value)
    }

    /// Open a batch. Notifications are deferred until the returned scope (and
    /// every enclosing one) ends.
    pub fn begin_batch(&self) -> BatchScope {
        self.inner.borrow_mut().batch_depth += 1;
        BatchScope::new(self.clone())
    }

    /// Whether a batch is open.
    #[must_use]
    pub fn is_batching(&self) -> bool {
        self.inner.borrow().batch_depth > 0
    }

    #[must_use]
    pub fn batch_depth(&self) -> usize {
        self.inner.borrow().batch_depth
    }

    /// Close one batch level; at depth zero, deliver the pending changes.
    pub(crate) fn end_batch(&self) -> Result<()> {
        let (batch, pending) = {
            let mut inner = self.inner.borrow_mut();
            inner.batch_depth = inner.batch_depth.saturating_sub(1);
            if inner.batch_depth > 0 || inner.pending.is_empty() {
                return Ok(());
            }
            let batch = BatchId(inner.next_batch);
            inner.next_batch += 1;
            inner.pending_index.clear();
            (batch, std::mem::take(&mut inner.pending))
        };

        tracing::trace!(batch = batch.0, changes = pending.len(), "store batch flush");

        let mut first_err = None;
        for (name, old) in pending {
            let value = self.get(&name);
            let change = Change {
                name,
                value,
                old,
                batch: Some(batch),
            };
            if let Err(err) = self.emit(&change) {
                first_err.get_or_insert(err);
            }
        }
        first_err.map_or(Ok(()), Err)
    }

    /// Register a fallible listener. Its error is propagated to the caller of
    /// the triggering `set` / `batch`.
    pub fn on(&self, listener: impl Fn(&Change) -> Result<()> + 'static) -> ListenerId {
        let mut inner = self.inner.borrow_mut();
        let id = ListenerId(inner.next_listener);
        inner.next_listener += 1;
        inner.listeners.push((id, Rc::new(listener)));
        id
    }

    /// Remove a listener. Returns whether it was registered.
    pub fn off(&self, id: ListenerId) -> bool {
        let mut inner = self.inner.borrow_mut();
        let before = inner.listeners.len();
        inner.listeners.retain(|(lid, _)| *lid != id);
        inner.listeners.len() != before
    }

    /// Register an infallible listener, detached when the guard drops.
    pub fn subscribe(&self, listener: impl Fn(&Change) + 'static) -> Subscription {
        self.subscribe_with(move |change| {
            listener(change);
            Ok(())
        })
    }

    /// Register a fallible listener, detached when the guard drops.
    pub fn subscribe_with(
        &self,
        listener: impl Fn(&Change) -> Result<()> + 'static,
    ) -> Subscription {
        let id = self.on(listener);
        let weak = self.downgrade();
        Subscription::new(move || {
            if let Some(store) = weak.upgrade() {
                store.off(id);
            }
        })
    }

    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.inner.borrow().listeners.len()
    }

    fn is_registered(&self, id: ListenerId) -> bool {
        self.inner
            .borrow()
            .listeners
            .iter()
            .any(|(lid, _)| *lid == id)
    }

    fn emit(&self, change: &Change) -> Result<()> {
        // Snapshot so listeners may subscribe/unsubscribe while we deliver.
        let listeners: Vec<(ListenerId, Rc<Listener>)> = self
            .inner
            .borrow()
            .listeners
            .iter()
            .map(|(id, listener)| (*id, Rc::clone(listener)))
            .collect();

        let mut first_err = None;
        for (id, listener) in listeners {
            // Skip listeners detached by an earlier listener in this delivery.
            if !self.is_registered(id) {
                continue;
            }
            if let Err(err) = listener(change) {
                first_err.get_or_insert(err);
            }
        }
        first_err.map_or(Ok(()), Err)
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Store")
            .field("properties", &inner.values.len())
            .field("batch_depth", &inner.batch_depth)
            .field("pending", &inner.pending.len())
            .field("listeners", &inner.listeners.len())
            .finish()
    }
}

impl fmt::Debug for WeakStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakStore")
            .field("alive", &(self.inner.strong_count() > 0))
            .finish()
    }
}
