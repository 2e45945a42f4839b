#![forbid(unsafe_code)]

//! Property bindings between two stores.
//!
//! A [`ModelBinder`] couples properties of a source [`Store`] to properties of
//! a target store, optionally through transforms, optionally gated by a
//! condition, and optionally in both directions.
//!
//! ```ignore
//! let form = Store::new().with("celsius", 20.0);
//! let view = Store::new();
//!
//! let binder = ModelBinder::new(&form, &view)
//!     .map(
//!         "celsius",
//!         PropertyMapping::to("fahrenheit")
//!             .transform(|v| Value::new(v.get::<f64>().unwrap_or(0.0) * 1.8 + 32.0))
//!             .reverse(|v| Value::new((v.get::<f64>().unwrap_or(32.0) - 32.0) / 1.8)),
//!     )
//!     .bidirectional(true);
//! binder.activate()?;
//! ```
//!
//! # Invariants
//!
//! 1. After activation and after every source change that passes the
//!    mapping's condition, `target[t] == transform(source[s])`.
//! 2. With `bidirectional(true)` and a `reverse` transform, target changes
//!    write `reverse(target[t])` back to `source[s]`.
//! 3. Each handler only writes to the *other* store, and a re-entrancy guard
//!    drops the echo of a write this binder is performing, so a binder never
//!    oscillates. A write into a store that is batching is remembered, and
//!    the matching change delivered at flush is dropped the same way.
//! 4. `deactivate()` removes both handlers and is idempotent.
//!
//! A condition returning `false` is a normal skip: no write, no event, no
//! error. Conditions gate the forward direction only.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::error::Result;
use crate::store::{Change, Store, WeakStore};
use crate::subscription::Subscription;
use crate::value::Value;

type Transform = Rc<dyn Fn(&Value) -> Value>;
type Condition = Rc<dyn Fn(&Value) -> bool>;

/// How one source property maps onto the target store.
#[derive(Clone)]
pub struct PropertyMapping {
    target: String,
    transform: Option<Transform>,
    reverse: Option<Transform>,
    condition: Option<Condition>,
}

impl PropertyMapping {
    /// Map onto `target` unchanged.
    #[must_use]
    pub fn to(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            transform: None,
            reverse: None,
            condition: None,
        }
    }

    /// Transform applied on the way to the target.
    #[must_use]
    pub fn transform(mut self, f: impl Fn(&Value) -> Value + 'static) -> Self {
        self.transform = Some(Rc::new(f));
        self
    }

    /// Inverse transform applied on the way back to the source. Only used by
    /// bidirectional binders.
    #[must_use]
    pub fn reverse(mut self, f: impl Fn(&Value) -> Value + 'static) -> Self {
        self.reverse = Some(Rc::new(f));
        self
    }

    /// Skip forward syncs for source values where `f` returns false.
    #[must_use]
    pub fn when(mut self, f: impl Fn(&Value) -> bool + 'static) -> Self {
        self.condition = Some(Rc::new(f));
        self
    }

    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }

    fn allows(&self, value: &Value) -> bool {
        self.condition.as_ref().is_none_or(|cond| cond(value))
    }

    fn forward(&self, value: &Value) -> Value {
        match &self.transform {
            Some(f) => f(value),
            None => value.clone(),
        }
    }
}

impl fmt::Debug for PropertyMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyMapping")
            .field("target", &self.target)
            .field("transform", &self.transform.is_some())
            .field("reverse", &self.reverse.is_some())
            .field("condition", &self.condition.is_some())
            .finish()
    }
}

struct BinderInner {
    source: WeakStore,
    target: WeakStore,
    mappings: RefCell<Vec<(String, PropertyMapping)>>,
    bidirectional: Cell<bool>,
    syncing: Cell<bool>,
    /// Deferred writes into the target, as `(property, value)`.
    forward_echoes: RefCell<Vec<(String, Value)>>,
    /// Deferred writes into the source.
    backward_echoes: RefCell<Vec<(String, Value)>>,
    subscriptions: RefCell<Vec<Subscription>>,
}

/// Couples properties of two stores.
///
/// Cloning yields another handle to the same binder. Both stores only hold
/// weak references, so dropping the last handle detaches the binder.
#[must_use = "dropping the last ModelBinder handle detaches both directions"]
#[derive(Clone)]
pub struct ModelBinder {
    inner: Rc<BinderInner>,
}

impl ModelBinder {
    pub fn new(source: &Store, target: &Store) -> Self {
        Self {
            inner: Rc::new(BinderInner {
                source: source.downgrade(),
                target: target.downgrade(),
                mappings: RefCell::new(Vec::new()),
                bidirectional: Cell::new(false),
                syncing: Cell::new(false),
                forward_echoes: RefCell::new(Vec::new()),
                backward_echoes: RefCell::new(Vec::new()),
                subscriptions: RefCell::new(Vec::new()),
            }),
        }
    }

    /// Add a mapping from `source_property`.
    #[must_use]
    pub fn map(self, source_property: impl Into<String>, mapping: PropertyMapping) -> Self {
        self.inner
            .mappings
            .borrow_mut()
            .push((source_property.into(), mapping));
        self
    }

    #[must_use]
    pub fn bidirectional(self, bidirectional: bool) -> Self {
        self.inner.bidirectional.set(bidirectional);
        self
    }

    /// Sync every mapping once, then subscribe the forward handler (and the
    /// backward handler when bidirectional with at least one `reverse`).
    pub fn activate(&self) -> Result<()> {
        if self.is_active() {
            return Ok(());
        }
        let (Some(source), Some(target)) =
            (self.inner.source.upgrade(), self.inner.target.upgrade())
        else {
            return Ok(());
        };

        let mappings = self.inner.mappings.borrow().clone();
        let mut first_err = None;
        for (source_property, mapping) in &mappings {
            let value = source.get(source_property);
            if !mapping.allows(&value) {
                continue;
            }
            if let Err(err) = self.inner.write_forward(&target, mapping, &value) {
                first_err.get_or_insert(err);
            }
        }

        let mut subscriptions = Vec::with_capacity(2);
        let weak = Rc::downgrade(&self.inner);
        subscriptions.push(source.subscribe_with(move |change| match weak.upgrade() {
            Some(inner) => inner.on_source_change(change),
            None => Ok(()),
        }));

        let has_reverse = mappings.iter().any(|(_, m)| m.reverse.is_some());
        if self.inner.bidirectional.get() && has_reverse {
            let weak = Rc::downgrade(&self.inner);
            subscriptions.push(target.subscribe_with(move |change| match weak.upgrade() {
                Some(inner) => inner.on_target_change(change),
                None => Ok(()),
            }));
        }
        *self.inner.subscriptions.borrow_mut() = subscriptions;

        tracing::debug!(
            mappings = mappings.len(),
            bidirectional = self.inner.bidirectional.get(),
            "model binder activated"
        );
        first_err.map_or(Ok(()), Err)
    }

    /// Remove both handlers. Idempotent.
    pub fn deactivate(&self) {
        let subscriptions = std::mem::take(&mut *self.inner.subscriptions.borrow_mut());
        drop(subscriptions);
        self.inner.forward_echoes.borrow_mut().clear();
        self.inner.backward_echoes.borrow_mut().clear();
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.inner.subscriptions.borrow().is_empty()
    }

    #[must_use]
    pub fn is_bidirectional(&self) -> bool {
        self.inner.bidirectional.get()
    }
}

impl BinderInner {
    /// Write to the other store with the echo guard raised. When that store
    /// is batching, its notification arrives after the guard is lowered, so
    /// the write is recorded in `echoes` instead.
    fn write(
        &self,
        store: &Store,
        name: &str,
        value: Value,
        echoes: Option<&RefCell<Vec<(String, Value)>>>,
    ) -> Result<()> {
        if let Some(echoes) = echoes.filter(|_| store.is_batching()) {
            echoes.borrow_mut().push((name.to_owned(), value.clone()));
        }
        self.syncing.set(true);
        let result = store.set_value(name, value);
        self.syncing.set(false);
        result
    }

    fn write_forward(
        &self,
        target: &Store,
        mapping: &PropertyMapping,
        value: &Value,
    ) -> Result<()> {
        // Only a subscribed backward handler can observe the echo.
        let tracked = self.bidirectional.get() && mapping.reverse.is_some();
        let echoes = tracked.then_some(&self.forward_echoes);
        self.write(target, &mapping.target, mapping.forward(value), echoes)
    }

    /// Whether `change` is the delivery of a recorded deferred write. Every
    /// record for that property is consumed.
    fn is_echo(echoes: &RefCell<Vec<(String, Value)>>, change: &Change) -> bool {
        let mut echoes = echoes.borrow_mut();
        if !echoes.iter().any(|(name, _)| *name == change.name) {
            return false;
        }
        let hit = echoes
            .iter()
            .any(|(name, value)| *name == change.name && *value == change.value);
        echoes.retain(|(name, _)| *name != change.name);
        hit
    }

    fn on_source_change(&self, change: &Change) -> Result<()> {
        if self.syncing.get() || Self::is_echo(&self.backward_echoes, change) {
            return Ok(());
        }
        let Some(target) = self.target.upgrade() else {
            return Ok(());
        };
        let matching: Vec<PropertyMapping> = self
            .mappings
            .borrow()
            .iter()
            .filter(|(source_property, _)| *source_property == change.name)
            .map(|(_, mapping)| mapping.clone())
            .collect();

        let mut first_err = None;
        for mapping in matching {
            if !mapping.allows(&change.value) {
                continue;
            }
            if let Err(err) = self.write_forward(&target, &mapping, &change.value) {
                first_err.get_or_insert(err);
            }
        }
        first_err.map_or(Ok(()), Err)
    }

    fn on_target_change(&self, change: &Change) -> Result<()> {
        if self.syncing.get() || Self::is_echo(&self.forward_echoes, change) {
            return Ok(());
        }
        let Some(source) = self.source.upgrade() else {
            return Ok(());
        };
        let matching: Vec<(String, Transform)> = self
            .mappings
            .borrow()
            .iter()
            .filter(|(_, mapping)| mapping.target == change.name)
            .filter_map(|(source_property, mapping)| {
                mapping
                    .reverse
                    .clone()
                    .map(|reverse| (source_property.clone(), reverse))
            })
            .collect();

        let mut first_err = None;
        for (source_property, reverse) in matching {
            let value = reverse(&change.value);
            let echoes = Some(&self.backward_echoes);
            if let Err(err) = self.write(&source, &source_property, value, echoes) {
                first_err.get_or_insert(err);
            }
        }
        first_err.map_or(Ok(()), Err)
    }
}

impl fmt::Debug for ModelBinder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelBinder")
            .field("mappings", &*self.inner.mappings.borrow())
            .field("bidirectional", &self.inner.bidirectional.get())
            .field("active", &self.is_active())
            .finish()
    }
}
