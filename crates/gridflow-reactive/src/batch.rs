#![forbid(unsafe_code)]

//! RAII batch scopes.
//!
//! A [`BatchScope`] defers a [`Store`]'s notifications until it ends. Scopes
//! nest: only the outermost one flushes. Ending explicitly with
//! [`BatchScope::end`] surfaces listener errors; a scope that is merely
//! dropped (including during a panic) still flushes and logs any error.

use crate::error::Result;
use crate::store::Store;

/// Guard for one batch level on a store.
#[must_use = "dropping a BatchScope ends the batch immediately"]
pub struct BatchScope {
    store: Store,
    ended: bool,
}

impl BatchScope {
    pub(crate) fn new(store: Store) -> Self {
        Self {
            store,
            ended: false,
        }
    }

    /// End this batch level, flushing if it is the outermost, and return the
    /// first listener error raised by the flush.
    pub fn end(mut self) -> Result<()> {
        self.ended = true;
        self.store.end_batch()
    }

    /// The store this scope batches.
    #[must_use]
    pub fn store(&self) -> &Store {
        &self.store
    }
}

impl Drop for BatchScope {
    fn drop(&mut self) {
        if self.ended {
            return;
        }
        if let Err(err) = self.store.end_batch() {
            tracing::warn!(error = %err, "batch flush failed in dropped scope");
        }
    }
}

impl std::fmt::Debug for BatchScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchScope")
            .field("depth", &self.store.batch_depth())
            .field("ended", &self.ended)
            .finish()
    }
}
