//! The grid's reactive state.
//!
//! A [`GridModel`] is a [`Store`] holding the grid inputs plus three computed
//! properties that run the filter → sort → paginate pipeline:
//!
//! | Property | Depends on |
//! |----------|------------|
//! | `visible_rows` | `rows`, `filters`, `sort_state`, `page`, `page_size`, `columns` |
//! | `total_rows` | `rows`, `filters` |
//! | `total_pages` | `total_rows`, `page_size` |
//!
//! `visible_rows` compares by row handle, so recomputing to the same rows
//! does not notify.
//!
//! Input setters batch their writes, so a filter change that also resets the
//! page recomputes each derived property once.

use std::fmt;

use gridflow_reactive::{BindingManager, ComputeError, ComputedProperty, Store, Value};

use crate::column::Column;
use crate::error::Result;
use crate::filter::{Filter, Filters};
use crate::pipeline::{
    compute_filtered_rows, compute_total_pages, compute_visible_rows, rows_shallow_eq,
};
use crate::record::Row;
use crate::sort::{SortDirection, SortState};

/// Store property names used by the grid.
pub mod props {
    pub const ROWS: &str = "rows";
    pub const COLUMNS: &str = "columns";
    pub const FILTERS: &str = "filters";
    pub const SORT_STATE: &str = "sort_state";
    pub const PAGE: &str = "page";
    pub const PAGE_SIZE: &str = "page_size";
    pub const VISIBLE_ROWS: &str = "visible_rows";
    pub const TOTAL_ROWS: &str = "total_rows";
    pub const TOTAL_PAGES: &str = "total_pages";
}

use props::{
    COLUMNS, FILTERS, PAGE, PAGE_SIZE, ROWS, SORT_STATE, TOTAL_PAGES, TOTAL_ROWS, VISIBLE_ROWS,
};

/// Initial grid inputs.
#[derive(Clone, Debug, PartialEq)]
pub struct GridState {
    pub rows: Vec<Row>,
    pub columns: Vec<Column>,
    pub filters: Option<Filters>,
    pub sort_state: Option<SortState>,
    /// 1-based.
    pub page: usize,
    pub page_size: Option<usize>,
}

impl Default for GridState {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            columns: Vec::new(),
            filters: None,
            sort_state: None,
            page: 1,
            page_size: None,
        }
    }
}

impl GridState {
    #[must_use]
    pub fn new(rows: Vec<Row>, columns: Vec<Column>) -> Self {
        Self {
            rows,
            columns,
            ..Self::default()
        }
    }
}

// Typed reads of dependency values. A property of the wrong type reads as
// its empty form.

fn rows_of(value: &Value) -> &[Row] {
    value
        .downcast_ref::<Vec<Row>>()
        .map(Vec::as_slice)
        .unwrap_or_default()
}

fn columns_of(value: &Value) -> &[Column] {
    value
        .downcast_ref::<Vec<Column>>()
        .map(Vec::as_slice)
        .unwrap_or_default()
}

fn filters_of(value: &Value) -> Option<&Filters> {
    value
        .downcast_ref::<Option<Filters>>()
        .and_then(Option::as_ref)
        .or_else(|| value.downcast_ref::<Filters>())
}

fn sort_of(value: &Value) -> Option<&SortState> {
    value
        .downcast_ref::<Option<SortState>>()
        .and_then(Option::as_ref)
        .or_else(|| value.downcast_ref::<SortState>())
}

fn page_of(value: &Value) -> usize {
    value.get::<usize>().unwrap_or(1)
}

fn page_size_of(value: &Value) -> Option<usize> {
    value
        .get::<Option<usize>>()
        .unwrap_or_else(|| value.get::<usize>())
}

fn visible_rows(deps: &[Value]) -> std::result::Result<Value, ComputeError> {
    let rows = rows_of(&deps[0]);
    let _span = tracing::debug_span!("grid.visible_rows", rows = rows.len()).entered();
    Ok(Value::new(compute_visible_rows(
        rows,
        filters_of(&deps[1]),
        sort_of(&deps[2]),
        columns_of(&deps[5]),
        page_of(&deps[3]),
        page_size_of(&deps[4]),
    )))
}

fn total_rows(deps: &[Value]) -> std::result::Result<Value, ComputeError> {
    let rows = rows_of(&deps[0]);
    let _span = tracing::debug_span!("grid.total_rows", rows = rows.len()).entered();
    Ok(Value::new(compute_filtered_rows(rows, filters_of(&deps[1])).len()))
}

fn total_pages(deps: &[Value]) -> std::result::Result<Value, ComputeError> {
    let total = deps[0].get::<usize>().unwrap_or(0);
    Ok(Value::new(compute_total_pages(total, page_size_of(&deps[1]))))
}

fn same_rows(a: &Value, b: &Value) -> bool {
    match (a.downcast_ref::<Vec<Row>>(), b.downcast_ref::<Vec<Row>>()) {
        (Some(a), Some(b)) => rows_shallow_eq(a, b),
        _ => a == b,
    }
}

/// Reactive grid state with the pipeline installed.
pub struct GridModel {
    store: Store,
    bindings: BindingManager,
}

impl GridModel {
    pub fn new(state: GridState) -> Result<Self> {
        let store = Store::new()
            .with(ROWS, state.rows)
            .with(COLUMNS, state.columns)
            .with(FILTERS, state.filters)
            .with(SORT_STATE, state.sort_state)
            .with(PAGE, state.page.max(1))
            .with(PAGE_SIZE, state.page_size);

        let mut bindings = BindingManager::new();
        let _ = bindings.add_computed(
            ComputedProperty::new(
                &store,
                VISIBLE_ROWS,
                [ROWS, FILTERS, SORT_STATE, PAGE, PAGE_SIZE, COLUMNS],
                visible_rows,
            )
            .with_equals(same_rows),
        )?;
        let _ = bindings.create_computed(&store, TOTAL_ROWS, [ROWS, FILTERS], total_rows)?;
        let _ =
            bindings.create_computed(&store, TOTAL_PAGES, [TOTAL_ROWS, PAGE_SIZE], total_pages)?;

        Ok(Self { store, bindings })
    }

    /// The backing store, for watchers and binders.
    #[must_use]
    pub fn store(&self) -> &Store {
        &self.store
    }

    #[must_use]
    pub fn rows(&self) -> Vec<Row> {
        rows_of(&self.store.get(ROWS)).to_vec()
    }

    #[must_use]
    pub fn columns(&self) -> Vec<Column> {
        columns_of(&self.store.get(COLUMNS)).to_vec()
    }

    #[must_use]
    pub fn filters(&self) -> Option<Filters> {
        filters_of(&self.store.get(FILTERS)).cloned()
    }

    #[must_use]
    pub fn sort_state(&self) -> Option<SortState> {
        sort_of(&self.store.get(SORT_STATE)).cloned()
    }

    #[must_use]
    pub fn page(&self) -> usize {
        page_of(&self.store.get(PAGE))
    }

    #[must_use]
    pub fn page_size(&self) -> Option<usize> {
        page_size_of(&self.store.get(PAGE_SIZE))
    }

    #[must_use]
    pub fn visible_rows(&self) -> Vec<Row> {
        rows_of(&self.store.get(VISIBLE_ROWS)).to_vec()
    }

    #[must_use]
    pub fn total_rows(&self) -> usize {
        self.store.get_as::<usize>(TOTAL_ROWS).unwrap_or(0)
    }

    #[must_use]
    pub fn total_pages(&self) -> usize {
        self.store.get_as::<usize>(TOTAL_PAGES).unwrap_or(1)
    }

    /// Run several input changes as one batch.
    pub fn batch<R>(&self, f: impl FnOnce(&Self) -> Result<R>) -> Result<R> {
        self.store.batch(|| f(self))
    }

    pub fn set_rows(&self, rows: Vec<Row>) -> Result<()> {
        Ok(self.store.set(ROWS, rows)?)
    }

    pub fn set_columns(&self, columns: Vec<Column>) -> Result<()> {
        Ok(self.store.set(COLUMNS, columns)?)
    }

    /// Replace the filters and go back to page 1.
    pub fn set_filters(&self, filters: Option<Filters>) -> Result<()> {
        self.batch(|model| {
            model.store.set(FILTERS, filters)?;
            model.store.set(PAGE, 1usize)?;
            Ok(())
        })
    }

    /// Set the filter for one field.
    pub fn set_filter(&self, key: impl Into<String>, filter: Filter) -> Result<()> {
        let filters = self.filters().unwrap_or_default().with(key, filter);
        self.set_filters(Some(filters))
    }

    /// Drop the filter for one field. Returns whether there was one.
    pub fn clear_filter(&self, key: &str) -> Result<bool> {
        let Some(mut filters) = self.filters() else {
            return Ok(false);
        };
        if filters.remove(key).is_none() {
            return Ok(false);
        }
        self.set_filters((!filters.is_empty()).then_some(filters))?;
        Ok(true)
    }

    pub fn set_sort(&self, sort_state: Option<SortState>) -> Result<()> {
        Ok(self.store.set(SORT_STATE, sort_state)?)
    }

    /// Cycle the sort on `key`: ascending, descending, unsorted.
    ///
    /// Returns `false` without changing anything when `key` names no sortable
    /// column.
    pub fn toggle_sort(&self, key: &str) -> Result<bool> {
        let sortable = self
            .columns()
            .iter()
            .any(|column| column.key == key && column.sortable);
        if !sortable {
            return Ok(false);
        }
        let next = match self.sort_state() {
            Some(current) if current.key == key => match current.direction {
                SortDirection::Asc => Some(SortState::desc(key)),
                SortDirection::Desc => None,
            },
            _ => Some(SortState::asc(key)),
        };
        self.set_sort(next)?;
        Ok(true)
    }

    /// Go to `page`, clamped to `1..=total_pages`. Returns the page applied.
    pub fn set_page(&self, page: usize) -> Result<usize> {
        let page = page.clamp(1, self.total_pages());
        self.store.set(PAGE, page)?;
        Ok(page)
    }

    pub fn next_page(&self) -> Result<usize> {
        self.set_page(self.page().saturating_add(1))
    }

    pub fn prev_page(&self) -> Result<usize> {
        self.set_page(self.page().saturating_sub(1))
    }

    /// Change the page size and go back to page 1.
    pub fn set_page_size(&self, page_size: Option<usize>) -> Result<()> {
        self.batch(|model| {
            model.store.set(PAGE_SIZE, page_size)?;
            model.store.set(PAGE, 1usize)?;
            Ok(())
        })
    }

    /// Detach the pipeline. Derived properties keep their last values.
    pub fn destroy(&mut self) {
        self.bindings.cleanup();
    }
}

impl fmt::Debug for GridModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GridModel")
            .field("rows", &rows_of(&self.store.get(ROWS)).len())
            .field("visible_rows", &rows_of(&self.store.get(VISIBLE_ROWS)).len())
            .field("page", &self.page())
            .field("total_pages", &self.total_pages())
            .field("sort_state", &self.sort_state())
            .field("bindings", &self.bindings)
            .finish()
    }
}
