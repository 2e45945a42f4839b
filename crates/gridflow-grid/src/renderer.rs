//! Virtualized windowed renderer.
//!
//! [`VirtualRenderer`] turns the grid's visible rows plus viewport geometry
//! into [`RenderSlice`]s: the rows to materialize with their absolute indices
//! and the spacer geometry that keeps the scroll extent right.
//!
//! # State Machine
//!
//! ```text
//!            scroll()              reset() / set_rows(new rows)
//!   Idle ─────────────▶ Windowed ──────────────────────────────▶ Idle
//! ```
//!
//! While `Idle` the window is anchored at index 0 regardless of any stored
//! offset. The first `scroll()` moves to `Windowed`. Replacing the rows with
//! different handles clears the offset, since it was measured against the
//! old rows; the surface is expected to scroll back to the top.
//!
//! # Invariants
//!
//! 1. A slice is produced only when the range differs from the last rendered
//!    one or the rows changed (by handle identity).
//! 2. Every slice satisfies `start_index <= end_index <= rows.len()` and
//!    carries exactly `end_index - start_index` rows.
//! 3. In [`RenderMode::Standard`] slices cover every row and have no
//!    positioning.

use std::fmt;

use crate::pipeline::rows_shallow_eq;
use crate::record::Row;
use crate::window::{Positioning, WindowMetrics, WindowRange};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum RenderMode {
    /// Materialize only the overscanned window.
    #[default]
    Virtual,
    /// Materialize every row.
    Standard,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Phase {
    #[default]
    Idle,
    Windowed,
}

/// A row with its absolute index in the visible rows.
#[derive(Clone, Debug, PartialEq)]
pub struct IndexedRow {
    pub index: usize,
    pub row: Row,
}

/// What the surface should show.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderSlice {
    pub start_index: usize,
    pub end_index: usize,
    pub rows: Vec<IndexedRow>,
    /// `None` for standard (non-virtual) renders.
    pub positioning: Option<Positioning>,
}

impl RenderSlice {
    #[must_use]
    pub fn range(&self) -> WindowRange {
        WindowRange {
            start: self.start_index,
            end: self.end_index,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Windowed renderer over a list of visible rows.
pub struct VirtualRenderer {
    metrics: WindowMetrics,
    mode: RenderMode,
    phase: Phase,
    rows: Vec<Row>,
    last: Option<(RenderMode, WindowRange)>,
    renders: u64,
}

impl VirtualRenderer {
    #[must_use]
    pub fn new(metrics: WindowMetrics) -> Self {
        Self {
            metrics,
            mode: RenderMode::Virtual,
            phase: Phase::Idle,
            rows: Vec::new(),
            last: None,
            renders: 0,
        }
    }

    #[must_use]
    pub fn metrics(&self) -> WindowMetrics {
        self.metrics
    }

    #[must_use]
    pub fn mode(&self) -> RenderMode {
        self.mode
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Number of slices produced so far.
    #[must_use]
    pub fn render_count(&self) -> u64 {
        self.renders
    }

    /// The range the current state maps to.
    #[must_use]
    pub fn range(&self) -> WindowRange {
        let total = self.rows.len();
        match (self.mode, self.phase) {
            (RenderMode::Standard, _) => WindowRange { start: 0, end: total },
            (RenderMode::Virtual, Phase::Idle) => {
                self.metrics.with_scroll_top(0.0).range(total)
            }
            (RenderMode::Virtual, Phase::Windowed) => self.metrics.range(total),
        }
    }

    /// Replace the rows. Renders unless the new rows are the same handles;
    /// different rows also return the renderer to `Idle`.
    pub fn set_rows(&mut self, rows: Vec<Row>) -> Option<RenderSlice> {
        let changed = !rows_shallow_eq(&self.rows, &rows);
        if changed {
            self.metrics.scroll_top = 0.0;
            self.phase = Phase::Idle;
        }
        self.rows = rows;
        self.update(changed)
    }

    /// Replace the rows and pick the mode in one step, rendering at most once.
    pub fn set_rows_with_mode(&mut self, rows: Vec<Row>, mode: RenderMode) -> Option<RenderSlice> {
        if self.mode != mode {
            tracing::debug!(?mode, rows = rows.len(), "render mode switched");
            self.mode = mode;
        }
        self.set_rows(rows)
    }

    /// Record a scroll offset from the surface.
    pub fn scroll(&mut self, scroll_top: f64) -> Option<RenderSlice> {
        self.metrics.scroll_top = scroll_top;
        self.phase = Phase::Windowed;
        self.update(false)
    }

    /// Record a new viewport height from the surface.
    pub fn resize(&mut self, viewport_height: f64) -> Option<RenderSlice> {
        self.metrics.viewport_height = viewport_height;
        self.update(false)
    }

    /// Switch between windowed and full rendering.
    pub fn set_mode(&mut self, mode: RenderMode) -> Option<RenderSlice> {
        if self.mode == mode {
            return None;
        }
        tracing::debug!(?mode, rows = self.rows.len(), "render mode switched");
        self.mode = mode;
        self.update(false)
    }

    /// Back to `Idle`: scroll offset cleared and the next update renders.
    pub fn reset(&mut self) {
        self.metrics.scroll_top = 0.0;
        self.phase = Phase::Idle;
        self.last = None;
    }

    /// Produce a slice for the current state unconditionally.
    pub fn render(&mut self) -> RenderSlice {
        let range = self.range();
        let total = self.rows.len();
        let rows = self.rows[range.start..range.end]
            .iter()
            .enumerate()
            .map(|(offset, row)| IndexedRow {
                index: range.start + offset,
                row: Row::clone(row),
            })
            .collect();
        let positioning = match self.mode {
            RenderMode::Virtual => Some(self.metrics.positioning(range, total)),
            RenderMode::Standard => None,
        };

        self.last = Some((self.mode, range));
        self.renders += 1;
        tracing::trace!(
            start = range.start,
            end = range.end,
            total,
            "virtual renderer slice"
        );

        RenderSlice {
            start_index: range.start,
            end_index: range.end,
            rows,
            positioning,
        }
    }

    fn update(&mut self, rows_changed: bool) -> Option<RenderSlice> {
        let range = self.range();
        if !rows_changed && self.last == Some((self.mode, range)) {
            return None;
        }
        Some(self.render())
    }
}

impl fmt::Debug for VirtualRenderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VirtualRenderer")
            .field("metrics", &self.metrics)
            .field("mode", &self.mode)
            .field("phase", &self.phase)
            .field("rows", &self.rows.len())
            .field("last", &self.last)
            .field("renders", &self.renders)
            .finish()
    }
}
