#![forbid(unsafe_code)]

//! An evented list: a shared `Vec` that announces structural changes.
//!
//! [`ObservableList`] is the source a
//! [`ReactiveCollection`](crate::ReactiveCollection) can follow item by item.
//! `push`, `insert` and `remove` emit targeted [`ListEvent::Insert`] /
//! [`ListEvent::Remove`] events carrying the item; every other mutation emits
//! [`ListEvent::Changed`]. Events are delivered after the mutation is applied.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::emitter::Emitter;
use crate::subscription::Subscription;

#[derive(Clone, Debug, PartialEq)]
pub enum ListEvent<T> {
    Insert { index: usize, item: T },
    Remove { index: usize, item: T },
    /// Anything that is not a single insert or remove.
    Changed,
}

/// Shared, evented list. Cloning yields another handle to the same list.
pub struct ObservableList<T> {
    items: Rc<RefCell<Vec<T>>>,
    events: Emitter<ListEvent<T>>,
}

impl<T: Clone + 'static> ObservableList<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::from_vec(Vec::new())
    }

    #[must_use]
    pub fn from_vec(items: Vec<T>) -> Self {
        Self {
            items: Rc::new(RefCell::new(items)),
            events: Emitter::new(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.borrow().is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<T> {
        self.items.borrow().get(index).cloned()
    }

    #[must_use]
    pub fn to_vec(&self) -> Vec<T> {
        self.items.borrow().clone()
    }

    pub fn push(&self, item: T) {
        let index = {
            let mut items = self.items.borrow_mut();
            items.push(item.clone());
            items.len() - 1
        };
        self.events.emit(&ListEvent::Insert { index, item });
    }

    /// Insert at `index`, clamped to the list length.
    pub fn insert(&self, index: usize, item: T) {
        let index = {
            let mut items = self.items.borrow_mut();
            let index = index.min(items.len());
            items.insert(index, item.clone());
            index
        };
        self.events.emit(&ListEvent::Insert { index, item });
    }

    /// Remove the item at `index`. Out-of-range indices are a no-op.
    pub fn remove(&self, index: usize) -> Option<T> {
        let item = {
            let mut items = self.items.borrow_mut();
            if index >= items.len() {
                return None;
            }
            items.remove(index)
        };
        self.events.emit(&ListEvent::Remove {
            index,
            item: item.clone(),
        });
        Some(item)
    }

    /// Replace the item at `index`. Returns false when out of range.
    pub fn set(&self, index: usize, item: T) -> bool {
        {
            let mut items = self.items.borrow_mut();
            let Some(slot) = items.get_mut(index) else {
                return false;
            };
            *slot = item;
        }
        self.events.emit(&ListEvent::Changed);
        true
    }

    /// Replace the whole contents.
    pub fn replace(&self, items: Vec<T>) {
        *self.items.borrow_mut() = items;
        self.events.emit(&ListEvent::Changed);
    }

    /// Apply an arbitrary in-place mutation and announce it as `Changed`.
    pub fn update(&self, f: impl FnOnce(&mut Vec<T>)) {
        f(&mut self.items.borrow_mut());
        self.events.emit(&ListEvent::Changed);
    }

    pub fn clear(&self) {
        self.replace(Vec::new());
    }

    pub fn subscribe(&self, callback: impl Fn(&ListEvent<T>) + 'static) -> Subscription {
        self.events.subscribe(callback)
    }

    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.events.len()
    }
}

impl<T: Clone + 'static> Default for ObservableList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for ObservableList<T> {
    fn clone(&self) -> Self {
        Self {
            items: Rc::clone(&self.items),
            events: self.events.clone(),
        }
    }
}

impl<T: Clone + 'static> From<Vec<T>> for ObservableList<T> {
    fn from(items: Vec<T>) -> Self {
        Self::from_vec(items)
    }
}

impl<T: fmt::Debug> fmt::Debug for ObservableList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObservableList")
            .field("items", &*self.items.borrow())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(list: &ObservableList<i32>) -> (Rc<RefCell<Vec<ListEvent<i32>>>>, Subscription) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let l = Rc::clone(&log);
        let sub = list.subscribe(move |e| l.borrow_mut().push(e.clone()));
        (log, sub)
    }

    #[test]
    fn structural_events_carry_items() {
        let list = ObservableList::from_vec(vec![1, 2]);
        let (log, _sub) = record(&list);

        list.push(3);
        list.insert(0, 0);
        assert_eq!(list.remove(1), Some(1));
        assert_eq!(list.remove(10), None);

        assert_eq!(
            *log.borrow(),
            vec![
                ListEvent::Insert { index: 2, item: 3 },
                ListEvent::Insert { index: 0, item: 0 },
                ListEvent::Remove { index: 1, item: 1 },
            ]
        );
        assert_eq!(list.to_vec(), vec![0, 2, 3]);
    }

    #[test]
    fn bulk_mutations_emit_changed() {
        let list = ObservableList::from_vec(vec![1, 2, 3]);
        let (log, _sub) = record(&list);

        assert!(list.set(0, 10));
        assert!(!list.set(9, 10));
        list.update(|items| items.retain(|v| *v != 2));
        list.clear();

        assert_eq!(*log.borrow(), vec![ListEvent::Changed; 3]);
        assert!(list.is_empty());
    }

    #[test]
    fn insert_index_is_clamped() {
        let list = ObservableList::from_vec(vec![1]);
        let (log, _sub) = record(&list);
        list.insert(99, 2);
        assert_eq!(log.borrow()[0], ListEvent::Insert { index: 1, item: 2 });
    }

    #[test]
    fn clones_share_contents() {
        let a = ObservableList::from_vec(vec![1]);
        let b = a.clone();
        b.push(2);
        assert_eq!(a.len(), 2);
        assert_eq!(a.get(1), Some(2));
    }
}
