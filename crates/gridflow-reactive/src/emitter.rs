#![forbid(unsafe_code)]

//! Ordered, infallible event fan-out shared by lists and collections.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::subscription::Subscription;

type Callback<E> = Rc<dyn Fn(&E)>;

struct EmitterInner<E> {
    listeners: RefCell<Vec<(u64, Callback<E>)>>,
    next_id: Cell<u64>,
}

/// Delivers events to listeners in subscription order.
pub(crate) struct Emitter<E> {
    inner: Rc<EmitterInner<E>>,
}

impl<E: 'static> Emitter<E> {
    pub(crate) fn new() -> Self {
        Self {
            inner: Rc::new(EmitterInner {
                listeners: RefCell::new(Vec::new()),
                next_id: Cell::new(0),
            }),
        }
    }

    pub(crate) fn subscribe(&self, callback: impl Fn(&E) + 'static) -> Subscription {
        let id = self.inner.next_id.get();
        self.inner.next_id.set(id + 1);
        self.inner
            .listeners
            .borrow_mut()
            .push((id, Rc::new(callback)));

        let weak = Rc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.listeners.borrow_mut().retain(|(lid, _)| *lid != id);
            }
        })
    }

    pub(crate) fn emit(&self, event: &E) {
        let snapshot: Vec<(u64, Callback<E>)> = self
            .inner
            .listeners
            .borrow()
            .iter()
            .map(|(id, cb)| (*id, Rc::clone(cb)))
            .collect();
        for (id, callback) in snapshot {
            let attached = self.inner.listeners.borrow().iter().any(|(lid, _)| *lid == id);
            if attached {
                callback(event);
            }
        }
    }

    pub(crate) fn clear(&self) {
        self.inner.listeners.borrow_mut().clear();
    }

    pub(crate) fn len(&self) -> usize {
        self.inner.listeners.borrow().len()
    }
}

impl<E> Clone for Emitter<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}
