//! Grid configuration.
//!
//! [`GridConfig`] carries the knobs a [`DataGrid`](crate::DataGrid) needs up
//! front: row geometry, overscan, default page size and when to virtualize.
//!
//! With the `config` feature the config can be loaded from TOML or JSON.
//! Missing fields take their defaults:
//!
//! ```toml
//! row_height = 28.0
//! buffer = 8
//! page_size = 50
//!
//! [virtualization]
//! mode = "auto"
//! threshold = 200
//! ```

#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};

use crate::error::{GridError, Result};
use crate::renderer::RenderMode;
use crate::window::DEFAULT_BUFFER;

/// Default row height in pixels.
pub const DEFAULT_ROW_HEIGHT: f64 = 36.0;

/// Default row count above which `Auto` virtualizes.
pub const DEFAULT_VIRTUALIZATION_THRESHOLD: usize = 100;

/// When the data grid renders through the virtual window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(tag = "mode", rename_all = "snake_case"))]
pub enum Virtualization {
    Always,
    Never,
    /// Virtualize when there are more than `threshold` visible rows.
    Auto { threshold: usize },
}

impl Default for Virtualization {
    fn default() -> Self {
        Self::Auto {
            threshold: DEFAULT_VIRTUALIZATION_THRESHOLD,
        }
    }
}

impl Virtualization {
    /// The render mode for `rows` visible rows.
    #[must_use]
    pub fn mode_for(self, rows: usize) -> RenderMode {
        match self {
            Self::Always => RenderMode::Virtual,
            Self::Never => RenderMode::Standard,
            Self::Auto { threshold } if rows > threshold => RenderMode::Virtual,
            Self::Auto { .. } => RenderMode::Standard,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct GridConfig {
    pub row_height: f64,
    pub buffer: usize,
    /// Page size applied when the initial grid state has none.
    pub page_size: Option<usize>,
    pub virtualization: Virtualization,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            row_height: DEFAULT_ROW_HEIGHT,
            buffer: DEFAULT_BUFFER,
            page_size: None,
            virtualization: Virtualization::default(),
        }
    }
}

impl GridConfig {
    /// Reject values the window math cannot use.
    pub fn validate(&self) -> Result<()> {
        if !(self.row_height.is_finite() && self.row_height > 0.0) {
            return Err(GridError::InvalidConfig {
                field: "row_height",
                reason: format!("must be a positive number, got {}", self.row_height),
            });
        }
        if self.page_size == Some(0) {
            return Err(GridError::InvalidConfig {
                field: "page_size",
                reason: "must be at least 1 when set".to_owned(),
            });
        }
        Ok(())
    }

    /// Parse and validate a TOML document.
    #[cfg(feature = "config")]
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a JSON document.
    #[cfg(feature = "config")]
    pub fn from_json_str(source: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(source)?;
        config.validate()?;
        Ok(config)
    }
}
