#![forbid(unsafe_code)]

//! Derived properties that recompute when their dependencies change.
//!
//! # Design
//!
//! A [`ComputedProperty`] owns a compute function over an ordered list of
//! dependency names on one [`Store`], and writes its result to a target
//! property of the same store. Unlike a lazily pulled cache, the result is
//! pushed: the target is a plain store property, so watchers, binders and
//! other computed properties can depend on it by name.
//!
//! # Invariants
//!
//! 1. Activation computes once and assigns unconditionally, so the first
//!    notification always happens.
//! 2. After any change to a dependency, the target equals
//!    `compute(current dependency values)`.
//! 3. The target is written (and notifies) only when `equals(new, last)` is
//!    false. The default comparison is strict [`Value`] equality.
//! 4. Changes delivered by one batch flush share a [`BatchId`]; every
//!    dependency already holds its post-batch value when the first of them is
//!    delivered, so the computed recomputes once per flush and ignores the
//!    rest.
//!
//! # Failure Modes
//!
//! - **Compute error**: returned as [`ReactiveError::Compute`] to the caller
//!   of the triggering `set` / `batch` / `activate`. The last good value is
//!   kept and the subscription stays in place.
//! - **Store dropped**: the property becomes inert; `activate` is a no-op.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::error::{ComputeError, ReactiveError, Result};
use crate::store::{BatchId, Change, Store, WeakStore};
use crate::subscription::Subscription;
use crate::value::Value;

type ComputeFn = dyn Fn(&[Value]) -> std::result::Result<Value, ComputeError>;
type EqualsFn = dyn Fn(&Value, &Value) -> bool;

struct ComputedState {
    last: Value,
    last_batch: Option<BatchId>,
    equals: Option<Rc<EqualsFn>>,
    subscription: Option<Subscription>,
    recomputes: u64,
}

struct ComputedInner {
    store: WeakStore,
    target: String,
    dependencies: Vec<String>,
    compute: Box<ComputeFn>,
    state: RefCell<ComputedState>,
}

/// A store property derived from other properties of the same store.
///
/// Cloning creates another handle to the **same** computed property. The
/// store only holds a weak reference, so dropping the last handle detaches
/// the property; hand it to a [`BindingManager`](crate::BindingManager) to
/// keep it alive without holding it yourself.
#[must_use = "dropping the last ComputedProperty handle stops recomputation"]
#[derive(Clone)]
pub struct ComputedProperty {
    inner: Rc<ComputedInner>,
}

impl ComputedProperty {
    /// Create an inactive computed property. Call [`activate`](Self::activate)
    /// to compute the first value and start tracking.
    pub fn new<N: Into<String>>(
        store: &Store,
        target: impl Into<String>,
        dependencies: impl IntoIterator<Item = N>,
        compute: impl Fn(&[Value]) -> std::result::Result<Value, ComputeError> + 'static,
    ) -> Self {
        Self {
            inner: Rc::new(ComputedInner {
                store: store.downgrade(),
                target: target.into(),
                dependencies: dependencies.into_iter().map(Into::into).collect(),
                compute: Box::new(compute),
                state: RefCell::new(ComputedState {
                    last: Value::undefined(),
                    last_batch: None,
                    equals: None,
                    subscription: None,
                    recomputes: 0,
                }),
            }),
        }
    }

    /// Replace the redundancy check used to suppress writes.
    #[must_use]
    pub fn with_equals(self, equals: impl Fn(&Value, &Value) -> bool + 'static) -> Self {
        self.inner.state.borrow_mut().equals = Some(Rc::new(equals));
        self
    }

    /// Compute, assign unconditionally, and subscribe to the store.
    ///
    /// Calling `activate` on an active property is a no-op.
    pub fn activate(&self) -> Result<()> {
        if self.is_active() {
            return Ok(());
        }
        let Some(store) = self.inner.store.upgrade() else {
            return Ok(());
        };

        let value = self.inner.evaluate(&store)?;
        self.inner.state.borrow_mut().last = value.clone();
        let assigned = store.set_value(&self.inner.target, value);

        let weak: Weak<ComputedInner> = Rc::downgrade(&self.inner);
        let subscription = store.subscribe_with(move |change| match weak.upgrade() {
            Some(inner) => inner.on_change(change),
            None => Ok(()),
        });
        self.inner.state.borrow_mut().subscription = Some(subscription);

        tracing::debug!(
            property = %self.inner.target,
            dependencies = self.inner.dependencies.len(),
            "computed property activated"
        );
        assigned
    }

    /// Stop tracking. Idempotent.
    pub fn deactivate(&self) {
        let subscription = self.inner.state.borrow_mut().subscription.take();
        drop(subscription);
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.inner.state.borrow().subscription.is_some()
    }

    /// Recompute now, as if a dependency had changed outside a batch.
    pub fn refresh(&self) -> Result<()> {
        self.inner.recompute()
    }

    /// Last successfully computed value.
    #[must_use]
    pub fn value(&self) -> Value {
        self.inner.state.borrow().last.clone()
    }

    #[must_use]
    pub fn target(&self) -> &str {
        &self.inner.target
    }

    #[must_use]
    pub fn dependencies(&self) -> &[String] {
        &self.inner.dependencies
    }

    /// Number of times the compute function has succeeded, activation
    /// included.
    #[must_use]
    pub fn recompute_count(&self) -> u64 {
        self.inner.state.borrow().recomputes
    }
}

impl ComputedInner {
    fn evaluate(&self, store: &Store) -> Result<Value> {
        let values: Vec<Value> = self.dependencies.iter().map(|d| store.get(d)).collect();
        let value = (self.compute)(&values).map_err(|source| ReactiveError::Compute {
            target: self.target.clone(),
            source,
        })?;
        self.state.borrow_mut().recomputes += 1;
        Ok(value)
    }

    fn on_change(&self, change: &Change) -> Result<()> {
        if !self.dependencies.iter().any(|d| *d == change.name) {
            return Ok(());
        }
        if let Some(batch) = change.batch {
            let mut state = self.state.borrow_mut();
            if state.last_batch == Some(batch) {
                return Ok(());
            }
            state.last_batch = Some(batch);
        }
        self.recompute()
    }

    fn recompute(&self) -> Result<()> {
        let Some(store) = self.store.upgrade() else {
            return Ok(());
        };
        let value = self.evaluate(&store)?;

        let (last, equals) = {
            let state = self.state.borrow();
            (state.last.clone(), state.equals.clone())
        };
        let unchanged = match equals {
            Some(equals) => equals(&value, &last),
            None => value == last,
        };
        tracing::debug!(property = %self.target, changed = !unchanged, "computed recompute");
        if unchanged {
            return Ok(());
        }

        self.state.borrow_mut().last = value.clone();
        store.set_value(&self.target, value)
    }
}

impl fmt::Debug for ComputedProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.borrow();
        f.debug_struct("ComputedProperty")
            .field("target", &self.inner.target)
            .field("dependencies", &self.inner.dependencies)
            .field("last", &state.last)
            .field("active", &state.subscription.is_some())
            .field("recomputes", &state.recomputes)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn sum(store: &Store) -> ComputedProperty {
        ComputedProperty::new(store, "sum", ["x", "y"], |deps| {
            let x = deps[0].get::<i32>().unwrap_or(0);
            let y = deps[1].get::<i32>().unwrap_or(0);
            Ok(Value::new(x + y))
        })
    }

    #[test]
    fn activation_assigns_and_notifies() {
        let store = Store::new().with("x", 1).with("y", 2);
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        let _sub = store.subscribe(move |c| {
            if c.name == "sum" {
                h.set(h.get() + 1);
            }
        });

        let computed = sum(&store);
        assert!(!computed.is_active());
        computed.activate().unwrap();

        assert!(computed.is_active());
        assert_eq!(store.get_as::<i32>("sum"), Some(3));
        assert_eq!(hits.get(), 1);
        assert_eq!(computed.value(), Value::new(3));
    }

    #[test]
    fn recomputes_on_dependency_change() {
        let store = Store::new().with("x", 1).with("y", 2);
        let computed = sum(&store);
        computed.activate().unwrap();

        store.set("x", 10).unwrap();
        assert_eq!(store.get_as::<i32>("sum"), Some(12));
        store.set("unrelated", 0).unwrap();
        assert_eq!(computed.recompute_count(), 2);
    }

    #[test]
    fn recomputes_once_per_flush() {
        let store = Store::new().with("x", 1).with("y", 2);
        let computed = sum(&store);
        computed.activate().unwrap();

        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = Rc::clone(&seen);
        let _sub = store.subscribe(move |c| {
            if c.name == "sum" {
                s.borrow_mut().push(c.value.get::<i32>());
            }
        });

        store
            .batch(|| {
                store.set("x", 5)?;
                store.set("y", 7)?;
                store.set("x", 6)
            })
            .unwrap();

        assert_eq!(computed.recompute_count(), 2);
        assert_eq!(*seen.borrow(), vec![Some(13)], "no intermediate value observed");
    }

    #[test]
    fn equal_result_is_not_written() {
        let store = Store::new().with("x", 1).with("y", 2);
        let computed = sum(&store);
        computed.activate().unwrap();

        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        let _sub = store.subscribe(move |c| {
            if c.name == "sum" {
                h.set(h.get() + 1);
            }
        });

        store
            .batch(|| {
                store.set("x", 2)?;
                store.set("y", 1)
            })
            .unwrap();
        assert_eq!(hits.get(), 0);
    }

    #[test]
    fn custom_equals_suppresses_writes() {
        let store = Store::new().with("x", 1.0_f64);
        let rounded = ComputedProperty::new(&store, "rounded", ["x"], |deps| {
            Ok(Value::new(deps[0].get::<f64>().unwrap_or_default()))
        })
        .with_equals(|a, b| {
            let a = a.get::<f64>().unwrap_or_default();
            let b = b.get::<f64>().unwrap_or_default();
            (a - b).abs() < 0.5
        });
        rounded.activate().unwrap();

        store.set("x", 1.2_f64).unwrap();
        assert_eq!(store.get_as::<f64>("rounded"), Some(1.0));
        store.set("x", 2.0_f64).unwrap();
        assert_eq!(store.get_as::<f64>("rounded"), Some(2.0));
    }

    #[test]
    fn compute_error_keeps_last_value() {
        let store = Store::new().with("x", 1);
        let computed = ComputedProperty::new(&store, "half", ["x"], |deps| {
            let x = deps[0].get::<i32>().unwrap_or(0);
            if x % 2 != 0 && x > 1 {
                return Err(ComputeError::new("odd"));
            }
            Ok(Value::new(x / 2))
        });
        computed.activate().unwrap();
        store.set("x", 4).unwrap();
        assert_eq!(store.get_as::<i32>("half"), Some(2));

        let err = store.set("x", 3).unwrap_err();
        assert_eq!(err.target(), "half");
        assert_eq!(store.get_as::<i32>("half"), Some(2));
        assert_eq!(computed.value(), Value::new(2));
        assert!(computed.is_active(), "listener stays attached");

        store.set("x", 8).unwrap();
        assert_eq!(store.get_as::<i32>("half"), Some(4));
    }

    #[test]
    fn activation_error_does_not_subscribe() {
        let store = Store::new();
        let computed =
            ComputedProperty::new(&store, "bad", ["x"], |_| Err(ComputeError::new("nope")));
        assert!(computed.activate().is_err());
        assert!(!computed.is_active());
        assert!(!store.contains("bad"));
    }

    #[test]
    fn undefined_dependency_passes_through() {
        let store = Store::new();
        let computed = ComputedProperty::new(&store, "defined", ["missing"], |deps| {
            Ok(Value::new(deps[0].is_defined()))
        });
        computed.activate().unwrap();
        assert_eq!(store.get_as::<bool>("defined"), Some(false));
    }

    #[test]
    fn chained_computed_properties() {
        let store = Store::new().with("x", 1).with("y", 1);
        let total = sum(&store);
        total.activate().unwrap();
        let doubled = ComputedProperty::new(&store, "doubled", ["sum"], |deps| {
            Ok(Value::new(deps[0].get::<i32>().unwrap_or(0) * 2))
        });
        doubled.activate().unwrap();

        store.batch(|| store.set("x", 4)).unwrap();
        assert_eq!(store.get_as::<i32>("doubled"), Some(10));
    }

    #[test]
    fn deactivate_is_idempotent_and_stops_tracking() {
        let store = Store::new().with("x", 1).with("y", 2);
        let computed = sum(&store);
        computed.activate().unwrap();
        assert_eq!(store.listener_count(), 1);

        computed.deactivate();
        computed.deactivate();
        assert_eq!(store.listener_count(), 0);

        store.set("x", 100).unwrap();
        assert_eq!(store.get_as::<i32>("sum"), Some(3));
    }

    #[test]
    fn clone_keeps_tracking_and_last_drop_detaches() {
        let store = Store::new().with("x", 1).with("y", 2);
        let computed = sum(&store);
        computed.activate().unwrap();
        let held = computed.clone();
        drop(computed);

        store.set("x", 10).unwrap();
        assert_eq!(store.get_as::<i32>("sum"), Some(12));

        drop(held);
        assert_eq!(store.listener_count(), 0);
        store.set("x", 20).unwrap();
        assert_eq!(store.get_as::<i32>("sum"), Some(12));
    }

    #[test]
    fn refresh_recomputes_on_demand() {
        let store = Store::new().with("x", 1).with("y", 2);
        let computed = sum(&store);
        computed.activate().unwrap();
        computed.refresh().unwrap();
        assert_eq!(computed.recompute_count(), 2);
    }

    #[test]
    fn debug_format() {
        let store = Store::new().with("x", 1).with("y", 2);
        let computed = sum(&store);
        computed.activate().unwrap();
        let dbg = format!("{computed:?}");
        assert!(dbg.contains("ComputedProperty"));
        assert!(dbg.contains("sum"));
    }
}
