//! Error types for the grid layer.

use gridflow_reactive::ReactiveError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, GridError>;

#[derive(Debug, Error)]
pub enum GridError {
    /// A derived grid property (or a consumer listener) failed.
    #[error(transparent)]
    Reactive(#[from] ReactiveError),

    /// A configuration value is out of range.
    #[error("invalid grid config: {field} {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    #[cfg(feature = "config")]
    #[error("failed to parse TOML grid config: {0}")]
    ConfigToml(#[from] toml::de::Error),

    #[cfg(feature = "config")]
    #[error("failed to parse JSON grid config: {0}")]
    ConfigJson(#[from] serde_json::Error),
}
