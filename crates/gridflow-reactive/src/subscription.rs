#![forbid(unsafe_code)]

//! RAII listener handles.

use std::fmt;

/// Guard that detaches a listener when dropped.
///
/// Every `subscribe` in this crate returns one of these. The guard only holds
/// a weak reference to the event source, so a subscription never keeps its
/// source alive and outliving the source is harmless.
#[must_use = "dropping a Subscription detaches the listener immediately"]
pub struct Subscription {
    detach: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub(crate) fn new(detach: impl FnOnce() + 'static) -> Self {
        Self {
            detach: Some(Box::new(detach)),
        }
    }

    /// A subscription that is not attached to anything.
    pub fn inert() -> Self {
        Self { detach: None }
    }

    /// Detach now. Equivalent to dropping the guard.
    pub fn unsubscribe(mut self) {
        self.release();
    }

    /// Whether the listener is still attached through this guard.
    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.detach.is_some()
    }

    fn release(&mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("attached", &self.is_attached())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn drop_runs_detach_once() {
        let count = Rc::new(Cell::new(0));
        let c = Rc::clone(&count);
        let sub = Subscription::new(move || c.set(c.get() + 1));
        assert!(sub.is_attached());
        drop(sub);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn unsubscribe_runs_detach_once() {
        let count = Rc::new(Cell::new(0));
        let c = Rc::clone(&count);
        Subscription::new(move || c.set(c.get() + 1)).unsubscribe();
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn inert_is_detached() {
        let sub = Subscription::inert();
        assert!(!sub.is_attached());
    }
}
