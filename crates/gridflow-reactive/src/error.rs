//! Error types for the reactive core.
//!
//! Errors only originate from consumer-supplied functions (compute closures).
//! The store's own bookkeeping never fails: missing properties read as
//! undefined and detached listeners are skipped.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ReactiveError>;

/// Failure reported by a consumer compute function.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct ComputeError {
    message: String,
}

impl ComputeError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ReactiveError {
    /// A computed property's compute function failed. The property keeps its
    /// last good value.
    #[error("computing `{target}` failed: {source}")]
    Compute {
        target: String,
        #[source]
        source: ComputeError,
    },
}

impl ReactiveError {
    /// Name of the property whose derivation failed.
    #[must_use]
    pub fn target(&self) -> &str {
        match self {
            Self::Compute { target, .. } => target,
        }
    }
}
