#![forbid(unsafe_code)]

//! Lifecycle management for one consumer's reactive primitives.
//!
//! A [`BindingManager`] creates binders, computed properties, watchers and
//! reactive collections on behalf of a consumer (a widget, a grid), keeps a
//! handle to each, and tears them all down together.
//!
//! ```ignore
//! let mut bindings = BindingManager::new();
//! bindings.create_computed(&store, "total", ["price", "qty"], |deps| { /* .. */ })?;
//! bindings.watch(&store, ["total"], |change| println!("{:?}", change.value));
//!
//! // Detaches everything; also happens on drop.
//! bindings.cleanup();
//! ```
//!
//! # Invariants
//!
//! 1. Every primitive returned by a `create_*` / `add_*` method is already
//!    active.
//! 2. `cleanup()` deactivates in reverse registration order and leaves the
//!    manager empty and reusable.
//! 3. After `cleanup()` (or drop) no callback registered through this manager
//!    fires again.

use std::fmt;
use std::hash::Hash;

use crate::binder::{ModelBinder, PropertyMapping};
use crate::collection::{CollectionSource, ReactiveCollection};
use crate::computed::ComputedProperty;
use crate::error::{ComputeError, Result};
use crate::store::{Change, Store};
use crate::subscription::Subscription;
use crate::value::Value;
use crate::watcher::Watcher;

/// Something that can be torn down by a [`BindingManager`].
pub trait Teardown {
    fn teardown(&self);
}

impl Teardown for ModelBinder {
    fn teardown(&self) {
        self.deactivate();
    }
}

impl Teardown for ComputedProperty {
    fn teardown(&self) {
        self.deactivate();
    }
}

impl Teardown for Watcher {
    fn teardown(&self) {
        self.deactivate();
    }
}

impl<T, K> Teardown for ReactiveCollection<T, K>
where
    T: Clone + 'static,
    K: Hash + Eq + 'static,
{
    fn teardown(&self) {
        self.destroy();
    }
}

enum Handle {
    Binder(ModelBinder),
    Computed(ComputedProperty),
    Watcher(Watcher),
    Collection(Box<dyn Teardown>),
    Subscription(Subscription),
}

impl Handle {
    fn release(self) {
        match self {
            Self::Binder(binder) => binder.deactivate(),
            Self::Computed(computed) => computed.deactivate(),
            Self::Watcher(watcher) => watcher.deactivate(),
            Self::Collection(collection) => collection.teardown(),
            Self::Subscription(subscription) => subscription.unsubscribe(),
        }
    }
}

/// Per-kind handle counts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HandleCounts {
    pub binders: usize,
    pub computed: usize,
    pub watchers: usize,
    pub collections: usize,
    pub subscriptions: usize,
}

/// Owns the reactive primitives of one consumer.
#[derive(Default)]
pub struct BindingManager {
    handles: Vec<Handle>,
}

impl BindingManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind properties of `source` to `target`, activate, and retain.
    pub fn bind<N: Into<String>>(
        &mut self,
        source: &Store,
        target: &Store,
        mappings: impl IntoIterator<Item = (N, PropertyMapping)>,
        bidirectional: bool,
    ) -> Result<ModelBinder> {
        let binder = mappings
            .into_iter()
            .fold(ModelBinder::new(source, target), |binder, (name, mapping)| {
                binder.map(name, mapping)
            })
            .bidirectional(bidirectional);
        self.add_binder(binder)
    }

    /// Activate and retain a binder built elsewhere.
    pub fn add_binder(&mut self, binder: ModelBinder) -> Result<ModelBinder> {
        let activated = binder.activate();
        self.handles.push(Handle::Binder(binder.clone()));
        activated.map(|()| binder)
    }

    /// Create a computed property, activate, and retain.
    pub fn create_computed<N: Into<String>>(
        &mut self,
        store: &Store,
        target: impl Into<String>,
        dependencies: impl IntoIterator<Item = N>,
        compute: impl Fn(&[Value]) -> std::result::Result<Value, ComputeError> + 'static,
    ) -> Result<ComputedProperty> {
        self.add_computed(ComputedProperty::new(store, target, dependencies, compute))
    }

    /// Activate and retain a computed property built elsewhere (e.g. one with
    /// a custom equality).
    ///
    /// A computed property whose first evaluation fails is not retained.
    pub fn add_computed(&mut self, computed: ComputedProperty) -> Result<ComputedProperty> {
        computed.activate()?;
        self.handles.push(Handle::Computed(computed.clone()));
        Ok(computed)
    }

    /// Create a watcher, activate, and retain.
    pub fn watch<N: Into<String>>(
        &mut self,
        store: &Store,
        names: impl IntoIterator<Item = N>,
        callback: impl Fn(&Change) + 'static,
    ) -> Watcher {
        self.add_watcher(Watcher::new(store, names, callback))
    }

    /// Activate and retain a watcher built elsewhere.
    pub fn add_watcher(&mut self, watcher: Watcher) -> Watcher {
        watcher.activate();
        self.handles.push(Handle::Watcher(watcher.clone()));
        watcher
    }

    /// Create a reactive collection and retain it.
    pub fn create_reactive_collection<T, K>(
        &mut self,
        source: impl Into<CollectionSource<T>>,
        key: impl Fn(&T) -> K + 'static,
    ) -> ReactiveCollection<T, K>
    where
        T: Clone + 'static,
        K: Hash + Eq + 'static,
    {
        self.add_collection(ReactiveCollection::new(source, key))
    }

    /// Retain a collection built elsewhere.
    pub fn add_collection<T, K>(
        &mut self,
        collection: ReactiveCollection<T, K>,
    ) -> ReactiveCollection<T, K>
    where
        T: Clone + 'static,
        K: Hash + Eq + 'static,
    {
        self.handles
            .push(Handle::Collection(Box::new(collection.clone())));
        collection
    }

    /// Retain a raw subscription until cleanup.
    pub fn hold(&mut self, subscription: Subscription) {
        self.handles.push(Handle::Subscription(subscription));
    }

    /// Deactivate everything, most recent first, and forget it.
    pub fn cleanup(&mut self) {
        let released = self.handles.len();
        while let Some(handle) = self.handles.pop() {
            handle.release();
        }
        if released > 0 {
            tracing::debug!(released, "binding manager cleanup");
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    #[must_use]
    pub fn counts(&self) -> HandleCounts {
        let mut counts = HandleCounts::default();
        for handle in &self.handles {
            match handle {
                Handle::Binder(_) => counts.binders += 1,
                Handle::Computed(_) => counts.computed += 1,
                Handle::Watcher(_) => counts.watchers += 1,
                Handle::Collection(_) => counts.collections += 1,
                Handle::Subscription(_) => counts.subscriptions += 1,
            }
        }
        counts
    }
}

impl Drop for BindingManager {
    fn drop(&mut self) {
        self.cleanup();
    }
}

impl fmt::Debug for BindingManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindingManager")
            .field("counts", &self.counts())
            .finish()
    }
}
