//! Column definitions.

use std::fmt;
use std::rc::Rc;

use crate::record::{Cell, Record};

type Accessor = Rc<dyn Fn(&Record) -> Option<Cell>>;

/// A grid column.
///
/// The column reads its cell from the record field named `key` unless an
/// accessor is installed.
#[derive(Clone)]
pub struct Column {
    pub key: String,
    pub label: String,
    pub sortable: bool,
    accessor: Option<Accessor>,
}

impl Column {
    /// A sortable column whose label is its key.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            label: key.clone(),
            key,
            sortable: true,
            accessor: None,
        }
    }

    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    #[must_use]
    pub fn sortable(mut self, sortable: bool) -> Self {
        self.sortable = sortable;
        self
    }

    /// Derive the cell from the whole record instead of one field.
    #[must_use]
    pub fn accessor(mut self, accessor: impl Fn(&Record) -> Option<Cell> + 'static) -> Self {
        self.accessor = Some(Rc::new(accessor));
        self
    }

    #[must_use]
    pub fn has_accessor(&self) -> bool {
        self.accessor.is_some()
    }

    /// The cell this column shows for `record`.
    #[must_use]
    pub fn cell(&self, record: &Record) -> Option<Cell> {
        match &self.accessor {
            Some(accessor) => accessor(record),
            None => record.get(&self.key).cloned(),
        }
    }
}

/// Accessors compare by identity.
impl PartialEq for Column {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
            && self.label == other.label
            && self.sortable == other.sortable
            && match (&self.accessor, &other.accessor) {
                (None, None) => true,
                (Some(a), Some(b)) => Rc::ptr_eq(a, b),
                _ => false,
            }
    }
}

impl fmt::Debug for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Column")
            .field("key", &self.key)
            .field("label", &self.label)
            .field("sortable", &self.sortable)
            .field("accessor", &self.accessor.is_some())
            .finish()
    }
}
