//! Row filters.
//!
//! A [`Filters`] set maps field keys to a [`Filter`]; a row passes when every
//! filter accepts the row's cell for that key.
//!
//! - [`Filter::Predicate`] receives the cell, or `None` when the row has no
//!   such field.
//! - [`Filter::Contains`] is a case-sensitive substring test against the
//!   cell's display form. A missing cell reads as the empty string, so it
//!   only matches an empty needle.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::record::{Cell, Record};

type Predicate = Rc<dyn Fn(Option<&Cell>) -> bool>;

#[derive(Clone)]
pub enum Filter {
    Predicate(Predicate),
    Contains(String),
}

impl Filter {
    #[must_use]
    pub fn predicate(f: impl Fn(Option<&Cell>) -> bool + 'static) -> Self {
        Self::Predicate(Rc::new(f))
    }

    #[must_use]
    pub fn contains(needle: impl Into<String>) -> Self {
        Self::Contains(needle.into())
    }

    #[must_use]
    pub fn matches(&self, cell: Option<&Cell>) -> bool {
        match self {
            Self::Predicate(f) => f(cell),
            Self::Contains(needle) => match cell {
                Some(Cell::Text(text)) => text.contains(needle.as_str()),
                Some(cell) => cell.to_string().contains(needle.as_str()),
                None => needle.is_empty(),
            },
        }
    }
}

/// Predicates compare by identity.
impl PartialEq for Filter {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Predicate(a), Self::Predicate(b)) => Rc::ptr_eq(a, b),
            (Self::Contains(a), Self::Contains(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Debug for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Predicate(_) => f.write_str("Predicate(..)"),
            Self::Contains(needle) => f.debug_tuple("Contains").field(needle).finish(),
        }
    }
}

/// Per-field filters, all of which must pass.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Filters {
    by_key: BTreeMap<String, Filter>,
}

impl Filters {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, key: impl Into<String>, filter: Filter) -> Self {
        self.by_key.insert(key.into(), filter);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, filter: Filter) -> Option<Filter> {
        self.by_key.insert(key.into(), filter)
    }

    pub fn remove(&mut self, key: &str) -> Option<Filter> {
        self.by_key.remove(key)
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Filter> {
        self.by_key.get(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }

    /// Whether `record` passes every filter.
    #[must_use]
    pub fn matches(&self, record: &Record) -> bool {
        self.by_key
            .iter()
            .all(|(key, filter)| filter.matches(record.get(key)))
    }
}

impl<K: Into<String>> FromIterator<(K, Filter)> for Filters {
    fn from_iter<I: IntoIterator<Item = (K, Filter)>>(iter: I) -> Self {
        Self {
            by_key: iter.into_iter().map(|(k, f)| (k.into(), f)).collect(),
        }
    }
}
