#![forbid(unsafe_code)]

//! Filtered list views that emit positional diffs.
//!
//! # Design
//!
//! A [`ReactiveCollection`] wraps a source and an optional filter predicate
//! and keeps `items = filter ? source.filter(..) : source.clone()`. Instead of
//! forcing consumers to re-render the whole list on every change, it emits
//! granular [`CollectionEvent`]s.
//!
//! Item identity comes from an explicit key-extraction function, so rows
//! without reference identity still diff correctly.
//!
//! # Diff algorithm
//!
//! Used by [`set_filter`](ReactiveCollection::set_filter),
//! [`set_source`](ReactiveCollection::set_source),
//! [`refresh`](ReactiveCollection::refresh) and
//! [`ListEvent::Changed`]:
//!
//! 1. Filter the source into `new_items`; build key sets of old and new.
//! 2. For every old item whose key is absent from the new set, emit
//!    `Remove { position: old index }`, in descending index order.
//! 3. Replace `items` with `new_items`.
//! 4. For every new item whose key is absent from the old set, emit
//!    `Insert { position: new index }`, in ascending index order.
//!
//! Items present on both sides produce no event even if they moved; call
//! [`reset`](ReactiveCollection::reset) when order matters to the consumer.
//!
//! Keys are expected to be unique. When either side of a diff holds two
//! items with one key, positions are ambiguous and the pass emits a single
//! `Reset` with the new items instead.
//!
//! Structural `Insert` / `Remove` events from an [`ObservableList`] take a
//! targeted path: the source is re-filtered and the single item is located
//! in the result. That is O(n) per event.
//!
//! # Invariants
//!
//! 1. After any processed mutation `items` equals the filtered source.
//! 2. One diff pass never emits both an insert and a remove for one key.
//!    Replaying the events of a pass onto the previous items reproduces
//!    `items`, up to the order of items present on both sides.
//! 3. A missing source ([`CollectionSource::Empty`]) reads as an empty list.

use std::cell::RefCell;
use std::fmt;
use std::hash::Hash;
use std::rc::{Rc, Weak};

use ahash::AHashSet;

use crate::emitter::Emitter;
use crate::list::{ListEvent, ObservableList};
use crate::subscription::Subscription;

/// Where a collection reads its items from.
pub enum CollectionSource<T> {
    /// No usable source: treated as an empty list.
    Empty,
    /// A plain snapshot. Call [`ReactiveCollection::refresh`] after replacing
    /// it through [`ReactiveCollection::set_source`].
    Items(Vec<T>),
    /// An evented list the collection follows automatically.
    List(ObservableList<T>),
}

impl<T: Clone + 'static> CollectionSource<T> {
    fn snapshot(&self) -> Vec<T> {
        match self {
            Self::Empty => Vec::new(),
            Self::Items(items) => items.clone(),
            Self::List(list) => list.to_vec(),
        }
    }
}

impl<T> Default for CollectionSource<T> {
    fn default() -> Self {
        Self::Empty
    }
}

impl<T> From<Vec<T>> for CollectionSource<T> {
    fn from(items: Vec<T>) -> Self {
        Self::Items(items)
    }
}

impl<T> From<ObservableList<T>> for CollectionSource<T> {
    fn from(list: ObservableList<T>) -> Self {
        Self::List(list)
    }
}

impl<T> From<Option<Vec<T>>> for CollectionSource<T> {
    fn from(items: Option<Vec<T>>) -> Self {
        items.map_or(Self::Empty, Self::Items)
    }
}

impl<T> fmt::Debug for CollectionSource<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("Empty"),
            Self::Items(items) => write!(f, "Items(len={})", items.len()),
            Self::List(_) => f.write_str("List"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum CollectionEvent<T> {
    Insert { position: usize, item: T },
    Remove { position: usize, item: T },
    Reset { items: Vec<T> },
}

type Filter<T> = Rc<dyn Fn(&T) -> bool>;

struct CollectionState<T> {
    source: CollectionSource<T>,
    filter: Option<Filter<T>>,
    items: Vec<T>,
    source_subscription: Option<Subscription>,
}

struct CollectionInner<T, K> {
    key: Box<dyn Fn(&T) -> K>,
    state: RefCell<CollectionState<T>>,
    events: Emitter<CollectionEvent<T>>,
}

/// A filtered, diffing view over a list source.
///
/// Cloning yields another handle to the same collection.
pub struct ReactiveCollection<T, K> {
    inner: Rc<CollectionInner<T, K>>,
}

impl<T, K> Clone for ReactiveCollection<T, K> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T, K> ReactiveCollection<T, K>
where
    T: Clone + 'static,
    K: Hash + Eq + 'static,
{
    /// Build a collection over `source`, identifying items with `key`.
    ///
    /// The initial contents are built without emitting events.
    pub fn new(source: impl Into<CollectionSource<T>>, key: impl Fn(&T) -> K + 'static) -> Self {
        let collection = Self {
            inner: Rc::new(CollectionInner {
                key: Box::new(key),
                state: RefCell::new(CollectionState {
                    source: CollectionSource::Empty,
                    filter: None,
                    items: Vec::new(),
                    source_subscription: None,
                }),
                events: Emitter::new(),
            }),
        };
        collection.attach(source.into());
        collection.inner.rebuild();
        collection
    }

    /// Install the initial filter. Like construction, emits nothing.
    #[must_use]
    pub fn with_filter(self, filter: impl Fn(&T) -> bool + 'static) -> Self {
        self.inner.state.borrow_mut().filter = Some(Rc::new(filter));
        self.inner.rebuild();
        self
    }

    /// Replace the filter and diff.
    pub fn set_filter(&self, filter: impl Fn(&T) -> bool + 'static) {
        self.inner.state.borrow_mut().filter = Some(Rc::new(filter));
        self.inner.rebuild_with_diff();
    }

    /// Remove the filter and diff.
    pub fn clear_filter(&self) {
        self.inner.state.borrow_mut().filter = None;
        self.inner.rebuild_with_diff();
    }

    #[must_use]
    pub fn has_filter(&self) -> bool {
        self.inner.state.borrow().filter.is_some()
    }

    /// Replace the source and diff.
    pub fn set_source(&self, source: impl Into<CollectionSource<T>>) {
        self.attach(source.into());
        self.inner.rebuild_with_diff();
    }

    /// Re-read the source and diff. Use after mutating a source that cannot
    /// announce its own changes.
    pub fn refresh(&self) {
        self.inner.rebuild_with_diff();
    }

    /// Rebuild from scratch and emit a single `Reset`.
    pub fn reset(&self) {
        self.inner.rebuild();
        let items = self.items();
        tracing::trace!(items = items.len(), "reactive collection reset");
        self.inner.events.emit(&CollectionEvent::Reset { items });
    }

    /// Detach from the source and drop local state and listeners.
    pub fn destroy(&self) {
        let subscription = {
            let mut state = self.inner.state.borrow_mut();
            state.source = CollectionSource::Empty;
            state.filter = None;
            state.items.clear();
            state.source_subscription.take()
        };
        drop(subscription);
        self.inner.events.clear();
    }

    /// Whether the collection is following an evented source.
    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.inner.state.borrow().source_subscription.is_some()
    }

    #[must_use]
    pub fn items(&self) -> Vec<T> {
        self.inner.state.borrow().items.clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.state.borrow().items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.state.borrow().items.is_empty()
    }

    #[must_use]
    pub fn get(&self, position: usize) -> Option<T> {
        self.inner.state.borrow().items.get(position).cloned()
    }

    /// Position of the first item with `key`.
    #[must_use]
    pub fn position_of(&self, key: &K) -> Option<usize> {
        let state = self.inner.state.borrow();
        state
            .items
            .iter()
            .position(|item| (self.inner.key)(item) == *key)
    }

    /// Listen for insert / remove / reset events.
    pub fn subscribe(&self, callback: impl Fn(&CollectionEvent<T>) + 'static) -> Subscription {
        self.inner.events.subscribe(callback)
    }

    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.inner.events.len()
    }

    fn attach(&self, source: CollectionSource<T>) {
        let subscription = match &source {
            CollectionSource::List(list) => {
                let weak: Weak<CollectionInner<T, K>> = Rc::downgrade(&self.inner);
                Some(list.subscribe(move |event| {
                    if let Some(inner) = weak.upgrade() {
                        inner.on_source_event(event);
                    }
                }))
            }
            CollectionSource::Empty | CollectionSource::Items(_) => None,
        };
        let previous = {
            let mut state = self.inner.state.borrow_mut();
            state.source = source;
            std::mem::replace(&mut state.source_subscription, subscription)
        };
        drop(previous);
    }
}

impl<T, K> CollectionInner<T, K>
where
    T: Clone + 'static,
    K: Hash + Eq + 'static,
{
    fn filtered(&self) -> Vec<T> {
        let (snapshot, filter) = {
            let state = self.state.borrow();
            (state.source.snapshot(), state.filter.clone())
        };
        match filter {
            Some(filter) => snapshot.into_iter().filter(|item| filter(item)).collect(),
            None => snapshot,
        }
    }

    fn passes(&self, item: &T) -> bool {
        let filter = self.state.borrow().filter.clone();
        filter.is_none_or(|filter| filter(item))
    }

    fn rebuild(&self) {
        let items = self.filtered();
        self.state.borrow_mut().items = items;
    }

    fn rebuild_with_diff(&self) {
        let new_items = self.filtered();
        let old_items = self.state.borrow().items.clone();

        let old_keys: AHashSet<K> = old_items.iter().map(|item| (self.key)(item)).collect();
        let new_keys: AHashSet<K> = new_items.iter().map(|item| (self.key)(item)).collect();
        if old_keys.len() != old_items.len() || new_keys.len() != new_items.len() {
            tracing::trace!(items = new_items.len(), "duplicate keys, diff replaced by reset");
            self.replace_with_reset(new_items);
            return;
        }

        let removals: Vec<CollectionEvent<T>> = old_items
            .iter()
            .enumerate()
            .rev()
            .filter(|(_, item)| !new_keys.contains(&(self.key)(item)))
            .map(|(position, item)| CollectionEvent::Remove {
                position,
                item: item.clone(),
            })
            .collect();
        let insertions: Vec<CollectionEvent<T>> = new_items
            .iter()
            .enumerate()
            .filter(|(_, item)| !old_keys.contains(&(self.key)(item)))
            .map(|(position, item)| CollectionEvent::Insert {
                position,
                item: item.clone(),
            })
            .collect();

        tracing::trace!(
            removed = removals.len(),
            inserted = insertions.len(),
            items = new_items.len(),
            "reactive collection diff"
        );

        for event in &removals {
            self.events.emit(event);
        }
        self.state.borrow_mut().items = new_items;
        for event in &insertions {
            self.events.emit(event);
        }
    }

    fn replace_with_reset(&self, items: Vec<T>) {
        self.state.borrow_mut().items = items.clone();
        self.events.emit(&CollectionEvent::Reset { items });
    }

    fn count_key(&self, items: &[T], key: &K) -> usize {
        items.iter().filter(|it| (self.key)(it) == *key).count()
    }

    fn on_source_event(&self, event: &ListEvent<T>) {
        match event {
            ListEvent::Insert { item, .. } => self.apply_insert(item),
            ListEvent::Remove { item, .. } => self.apply_remove(item),
            ListEvent::Changed => self.rebuild_with_diff(),
        }
    }

    fn apply_insert(&self, item: &T) {
        if !self.passes(item) {
            return;
        }
        let key = (self.key)(item);
        let new_items = self.filtered();
        if self.count_key(&new_items, &key) > 1 {
            self.replace_with_reset(new_items);
            return;
        }
        let Some(position) = new_items.iter().position(|it| (self.key)(it) == key) else {
            self.rebuild_with_diff();
            return;
        };
        self.state.borrow_mut().items = new_items;
        self.events.emit(&CollectionEvent::Insert {
            position,
            item: item.clone(),
        });
    }

    fn apply_remove(&self, item: &T) {
        let key = (self.key)(item);
        let (position, duplicated) = {
            let state = self.state.borrow();
            (
                state.items.iter().position(|it| (self.key)(it) == key),
                self.count_key(&state.items, &key) > 1,
            )
        };
        let Some(position) = position else {
            return;
        };
        let new_items = self.filtered();
        if duplicated {
            self.replace_with_reset(new_items);
            return;
        }
        self.state.borrow_mut().items = new_items;
        self.events.emit(&CollectionEvent::Remove {
            position,
            item: item.clone(),
        });
    }
}

impl<T: fmt::Debug, K> fmt::Debug for ReactiveCollection<T, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.borrow();
        f.debug_struct("ReactiveCollection")
            .field("source", &state.source)
            .field("filtered", &state.filter.is_some())
            .field("items", &state.items)
            .finish()
    }
}
