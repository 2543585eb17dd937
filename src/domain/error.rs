// ============================================================
// Layer 3 — Pipeline Error Kinds
// ============================================================
// Every fatal condition the core can raise. All of them
// propagate to the top of the pipeline unmodified; nothing in
// the core retries or recovers.
//
// The CLI and application layers use anyhow, so a
// PipelineError converts into anyhow::Error through `?`.
//
// Reference: Rust Book §9 (Recoverable Errors with Result)
//            thiserror crate documentation

use std::path::PathBuf;
use thiserror::Error;

/// Result alias used throughout the core.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Hyperparameters or paths that cannot produce a valid run.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// The loaded model and the dataset disagree on the category count.
    #[error("dimension mismatch: model has {model} categories but dataset has {dataset}")]
    DimensionMismatch { model: usize, dataset: usize },

    #[error("cannot access '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Persisted data that is unreadable or disagrees with its own header.
    #[error("malformed data in '{}': {reason}", path.display())]
    Deserialization { path: PathBuf, reason: String },

    /// The optimizer could not produce an iterate.
    #[error("solver failed at iteration {iteration}: {reason}")]
    Solver { iteration: usize, reason: String },

    /// A point handed to or returned by the optimizer does not fit the
    /// parameter layout.
    #[error("unusable iterate: {0}")]
    UnusableIterate(String),
}

impl PipelineError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }

    pub fn deserialization(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::Deserialization {
            path:   path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn configuration(reason: impl Into<String>) -> Self {
        Self::Configuration(reason.into())
    }
}
