//! Virtual window math.
//!
//! Given fixed-height rows, a viewport and a scroll offset, [`WindowMetrics`]
//! computes the overscanned index range worth materializing:
//!
//! ```text
//! start = max(0, floor(scroll_top / row_height) - buffer)
//! count = ceil(viewport_height / row_height) + 2 * buffer
//! end   = min(total, start + count)
//! ```
//!
//! # Invariants
//!
//! 1. `0 <= start <= end <= total` for every input, including negative or
//!    NaN scroll offsets (read as 0) and zero totals.
//! 2. A row height that is not a positive finite number yields an empty
//!    window instead of dividing by zero.
//! 3. The spacer heights plus the materialized rows always add up to
//!    `total * row_height`.

/// Default overscan, in rows, on each side of the viewport.
pub const DEFAULT_BUFFER: usize = 5;

/// Geometry the surface reports plus the grid's row model.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WindowMetrics {
    /// Fixed row height in pixels.
    pub row_height: f64,
    /// Extra rows rendered above and below the viewport.
    pub buffer: usize,
    pub viewport_height: f64,
    pub scroll_top: f64,
}

/// Half-open range `[start, end)` of absolute row indices.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct WindowRange {
    pub start: usize,
    pub end: usize,
}

/// Spacer geometry for a windowed render.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Positioning {
    /// Height of the space above the first materialized row.
    pub top: f64,
    /// Height of the space below the last materialized row.
    pub bottom: f64,
    /// Height of the full, unvirtualized list.
    pub total_height: f64,
}

impl WindowMetrics {
    #[must_use]
    pub fn new(row_height: f64, viewport_height: f64) -> Self {
        Self {
            row_height,
            buffer: DEFAULT_BUFFER,
            viewport_height,
            scroll_top: 0.0,
        }
    }

    #[must_use]
    pub fn with_buffer(mut self, buffer: usize) -> Self {
        self.buffer = buffer;
        self
    }

    #[must_use]
    pub fn with_scroll_top(mut self, scroll_top: f64) -> Self {
        self.scroll_top = scroll_top;
        self
    }

    fn has_usable_row_height(&self) -> bool {
        self.row_height.is_finite() && self.row_height > 0.0
    }

    /// Rows needed to cover the viewport, before overscan.
    #[must_use]
    pub fn rows_per_viewport(&self) -> usize {
        if !self.has_usable_row_height() {
            return 0;
        }
        // Float-to-int casts saturate; NaN becomes 0.
        (self.viewport_height.max(0.0) / self.row_height).ceil() as usize
    }

    /// The range to materialize for `total` rows.
    #[must_use]
    pub fn range(&self, total: usize) -> WindowRange {
        if total == 0 || !self.has_usable_row_height() {
            return WindowRange::EMPTY;
        }
        let scroll_top = self.scroll_top.max(0.0);
        // An offset past the end still shows the last viewport of rows.
        let first_visible = ((scroll_top / self.row_height).floor() as usize)
            .min(total.saturating_sub(self.rows_per_viewport()));
        let start = first_visible.saturating_sub(self.buffer).min(total);
        let count = self
            .rows_per_viewport()
            .saturating_add(self.buffer.saturating_mul(2));
        let end = start.saturating_add(count).min(total);
        WindowRange { start, end }
    }

    /// Spacer heights around `range` within `total` rows.
    #[must_use]
    pub fn positioning(&self, range: WindowRange, total: usize) -> Positioning {
        if !self.has_usable_row_height() {
            return Positioning::default();
        }
        let height = |rows: usize| rows as f64 * self.row_height;
        Positioning {
            top: height(range.start),
            bottom: height(total.saturating_sub(range.end)),
            total_height: height(total),
        }
    }
}

impl WindowRange {
    pub const EMPTY: Self = Self { start: 0, end: 0 };

    #[must_use]
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    #[must_use]
    pub fn contains(&self, index: usize) -> bool {
        (self.start..self.end).contains(&index)
    }
}
