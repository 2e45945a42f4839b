#![forbid(unsafe_code)]

//! Data grid core for gridflow.
//!
//! - [`pipeline`]: pure filter → sort → paginate functions over shared rows.
//! - [`GridModel`]: the pipeline installed as computed properties on a
//!   reactive store, so `visible_rows`, `total_rows` and `total_pages` stay
//!   current as inputs change.
//! - [`WindowMetrics`] and [`VirtualRenderer`]: fixed-row-height window math
//!   and the renderer that decides when a new [`RenderSlice`] is needed.
//! - [`DataGrid`]: a model and a renderer wired together behind a render
//!   callback and the two inputs a surface reports (scroll offset and
//!   viewport height).
//!
//! # Feature Flags
//!
//! - `config`: load [`GridConfig`] from TOML or JSON.

pub mod column;
pub mod config;
pub mod data_grid;
pub mod error;
pub mod filter;
pub mod model;
pub mod pipeline;
pub mod record;
pub mod renderer;
pub mod sort;
pub mod window;

pub use column::Column;
pub use config::{GridConfig, Virtualization};
pub use data_grid::DataGrid;
pub use error::{GridError, Result};
pub use filter::{Filter, Filters};
pub use model::{GridModel, GridState, props};
pub use pipeline::{
    compute_filtered_rows, compute_paged_rows, compute_sorted_rows, compute_total_pages,
    compute_visible_rows, rows_shallow_eq,
};
pub use record::{Cell, Record, Row};
pub use renderer::{IndexedRow, Phase, RenderMode, RenderSlice, VirtualRenderer};
pub use sort::{SortDirection, SortState};
pub use window::{Positioning, WindowMetrics, WindowRange};
