//! The data grid controller.
//!
//! [`DataGrid`] wires a [`GridModel`] to a [`VirtualRenderer`]: whenever
//! `visible_rows` changes, or the surface reports a new scroll offset or
//! viewport height, the renderer decides whether a new [`RenderSlice`] is
//! needed and hands it to the render callback.
//!
//! ```ignore
//! let grid = DataGrid::new(GridState::new(rows, columns), GridConfig::default())?;
//! grid.on_render(|slice| surface.show(slice));
//! grid.resize(600.0);
//! grid.scroll(1_200.0);
//! grid.model().set_filter("name", Filter::contains("Ada"))?;
//! ```

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use gridflow_reactive::BindingManager;

use crate::config::{GridConfig, Virtualization};
use crate::error::Result;
use crate::model::{GridModel, GridState, props};
use crate::record::Row;
use crate::renderer::{RenderMode, RenderSlice, VirtualRenderer};
use crate::window::WindowMetrics;

type RenderCallback = Rc<dyn Fn(&RenderSlice)>;

struct GridView {
    renderer: VirtualRenderer,
    virtualization: Virtualization,
    on_render: Option<RenderCallback>,
    last_slice: Option<RenderSlice>,
}

impl GridView {
    /// Apply `step` to the renderer and deliver the slice it yields, if any.
    ///
    /// The callback runs after the view borrow is released so it may call
    /// back into the grid.
    fn drive(
        view: &RefCell<GridView>,
        step: impl FnOnce(&mut VirtualRenderer, Virtualization) -> Option<RenderSlice>,
    ) {
        let delivery = {
            let mut guard = view.borrow_mut();
            let view = &mut *guard;
            let Some(slice) = step(&mut view.renderer, view.virtualization) else {
                return;
            };
            view.last_slice = Some(slice.clone());
            view.on_render.clone().map(|callback| (callback, slice))
        };
        if let Some((callback, slice)) = delivery {
            callback(&slice);
        }
    }

    fn show_rows(view: &RefCell<GridView>, rows: Vec<Row>) {
        Self::drive(view, |renderer, virtualization| {
            let mode = virtualization.mode_for(rows.len());
            renderer.set_rows_with_mode(rows, mode)
        });
    }
}

/// A grid model plus its windowed renderer.
pub struct DataGrid {
    model: GridModel,
    view: Rc<RefCell<GridView>>,
    bindings: BindingManager,
    config: GridConfig,
}

impl DataGrid {
    /// Build the model, render the first window and start following
    /// `visible_rows`.
    ///
    /// `config.page_size` applies when `state` has no page size of its own.
    pub fn new(mut state: GridState, config: GridConfig) -> Result<Self> {
        config.validate()?;
        state.page_size = state.page_size.or(config.page_size);

        let model = GridModel::new(state)?;
        let metrics = WindowMetrics::new(config.row_height, 0.0).with_buffer(config.buffer);
        let view = Rc::new(RefCell::new(GridView {
            renderer: VirtualRenderer::new(metrics),
            virtualization: config.virtualization,
            on_render: None,
            last_slice: None,
        }));
        GridView::show_rows(&view, model.visible_rows());

        let mut bindings = BindingManager::new();
        let weak: Weak<RefCell<GridView>> = Rc::downgrade(&view);
        let _ = bindings.watch(model.store(), [props::VISIBLE_ROWS], move |change| {
            let Some(view) = weak.upgrade() else {
                return;
            };
            let rows = change.value.get::<Vec<Row>>().unwrap_or_default();
            GridView::show_rows(&view, rows);
        });

        tracing::debug!(
            rows = model.total_rows(),
            row_height = config.row_height,
            virtualization = ?config.virtualization,
            "data grid created"
        );

        Ok(Self {
            model,
            view,
            bindings,
            config,
        })
    }

    #[must_use]
    pub fn model(&self) -> &GridModel {
        &self.model
    }

    #[must_use]
    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    /// Install the render callback. It receives the current slice right
    /// away and every later one.
    pub fn on_render(&self, callback: impl Fn(&RenderSlice) + 'static) {
        let callback: RenderCallback = Rc::new(callback);
        let current = {
            let mut view = self.view.borrow_mut();
            view.on_render = Some(Rc::clone(&callback));
            view.last_slice.clone()
        };
        if let Some(slice) = current {
            callback(&slice);
        }
    }

    /// Scroll offset reported by the surface.
    pub fn scroll(&self, scroll_top: f64) {
        GridView::drive(&self.view, |renderer, _| renderer.scroll(scroll_top));
    }

    /// Viewport height reported by the surface.
    pub fn resize(&self, viewport_height: f64) {
        GridView::drive(&self.view, |renderer, _| renderer.resize(viewport_height));
    }

    /// Jump back to the top and re-render.
    pub fn reset_scroll(&self) {
        GridView::drive(&self.view, |renderer, _| {
            renderer.reset();
            Some(renderer.render())
        });
    }

    /// Change the virtualization policy; re-renders if the mode flips.
    pub fn set_virtualization(&mut self, virtualization: Virtualization) {
        self.config.virtualization = virtualization;
        self.view.borrow_mut().virtualization = virtualization;
        GridView::drive(&self.view, |renderer, virtualization| {
            let mode = virtualization.mode_for(renderer.rows().len());
            renderer.set_mode(mode)
        });
    }

    #[must_use]
    pub fn render_mode(&self) -> RenderMode {
        self.view.borrow().renderer.mode()
    }

    /// The last slice produced.
    #[must_use]
    pub fn current_slice(&self) -> Option<RenderSlice> {
        self.view.borrow().last_slice.clone()
    }

    #[must_use]
    pub fn render_count(&self) -> u64 {
        self.view.borrow().renderer.render_count()
    }

    /// Stop following the model and drop the render callback.
    pub fn destroy(&mut self) {
        self.bindings.cleanup();
        self.model.destroy();
        self.view.borrow_mut().on_render = None;
    }
}

impl fmt::Debug for DataGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let view = self.view.borrow();
        f.debug_struct("DataGrid")
            .field("model", &self.model)
            .field("renderer", &view.renderer)
            .field("virtualization", &view.virtualization)
            .finish()
    }
}
