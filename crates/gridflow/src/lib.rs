#![forbid(unsafe_code)]

//! gridflow public facade.
//!
//! Re-exports the reactive core and, with the default `grid` feature, the
//! data grid layer. Most consumers only need the [`prelude`].
//!
//! ```ignore
//! use gridflow::prelude::*;
//!
//! let rows: Vec<Row> = vec![Record::new().with("name", "Ada").into_row()];
//! let state = GridState::new(rows, vec![Column::new("name")]);
//! let grid = DataGrid::new(state, GridConfig::default())?;
//! grid.on_render(|slice| println!("{}..{}", slice.start_index, slice.end_index));
//! ```

pub use gridflow_reactive as reactive;

#[cfg(feature = "grid")]
pub use gridflow_grid as grid;

pub use gridflow_reactive::{
    BatchScope, BindingManager, Change, CollectionEvent, CollectionSource, ComputeError,
    ComputedProperty, ListEvent, ModelBinder, ObservableList, PropertyMapping, ReactiveCollection,
    ReactiveError, Store, Subscription, Value, Watcher,
};

#[cfg(feature = "grid")]
pub use gridflow_grid::{
    Cell, Column, DataGrid, Filter, Filters, GridConfig, GridError, GridModel, GridState, Record,
    RenderMode, RenderSlice, Row, SortDirection, SortState, VirtualRenderer, Virtualization,
    WindowMetrics, WindowRange,
};

pub mod prelude {
    //! The common types in one import.

    pub use gridflow_reactive::{
        BindingManager, Change, CollectionEvent, ComputeError, ComputedProperty, ModelBinder,
        ObservableList, PropertyMapping, ReactiveCollection, Store, Subscription, Value, Watcher,
    };

    #[cfg(feature = "grid")]
    pub use gridflow_grid::{
        Cell, Column, DataGrid, Filter, Filters, GridConfig, GridModel, GridState, Record,
        RenderSlice, Row, SortDirection, SortState, Virtualization,
    };
}
