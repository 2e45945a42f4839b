#![forbid(unsafe_code)]

//! Reactive state for gridflow.
//!
//! This crate provides the change-propagation primitives a data grid is built
//! from:
//!
//! - [`Store`]: an open map of named [`Value`]s that notifies listeners on
//!   every assignment, with nested batching ([`Store::batch`],
//!   [`BatchScope`]).
//! - [`ComputedProperty`]: a store property derived from other properties of
//!   the same store, recomputed at most once per flush.
//! - [`Watcher`]: a callback on one or more property names.
//! - [`ModelBinder`]: one- or two-way property sync between two stores with
//!   transforms and conditions.
//! - [`ObservableList`] and [`ReactiveCollection`]: an evented list and a
//!   filtered view of it that emits positional insert/remove diffs.
//! - [`BindingManager`]: owns the primitives of one consumer and tears them
//!   down together.
//!
//! # Architecture
//!
//! Everything is single-threaded: shared state lives in `Rc<RefCell<..>>` and
//! delivery is synchronous and depth-first. Listeners are detached through
//! owned [`Subscription`] handles.
//!
//! Each flush tags its notifications with one [`BatchId`]; computed
//! properties use it to skip the redundant notifications of a flush once they
//! have recomputed against the final values.
//!
//! # Invariants
//!
//! 1. Outside a batch every assignment produces exactly one notification,
//!    even when the value did not change.
//! 2. Inside a batch values are assigned immediately; the outermost batch
//!    exit emits one notification per distinct name with the pre-batch old
//!    value, in first-write order.
//! 3. Listeners are notified in registration order.
//! 4. A detached listener is never called again, including later in the
//!    notification cycle that detached it.

pub mod batch;
pub mod binder;
pub mod collection;
pub mod computed;
mod emitter;
pub mod error;
pub mod list;
pub mod manager;
pub mod store;
pub mod subscription;
pub mod value;
pub mod watcher;

pub use batch::BatchScope;
pub use binder::{ModelBinder, PropertyMapping};
pub use collection::{CollectionEvent, CollectionSource, ReactiveCollection};
pub use computed::ComputedProperty;
pub use error::{ComputeError, ReactiveError, Result};
pub use list::{ListEvent, ObservableList};
pub use manager::{BindingManager, HandleCounts, Teardown};
pub use store::{BatchId, Change, ListenerId, Store, WeakStore};
pub use subscription::Subscription;
pub use value::{Property, Value};
pub use watcher::Watcher;
