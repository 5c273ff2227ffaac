//! Error types for the publishing pipeline.
//!
//! Only [`StoreError`] can abort a run. Generation and asset errors are
//! per-item values that the pipeline records and moves past; publish
//! failures are not errors at all but [`crate::contract::PublishOutcome`]
//! variants.

use std::path::PathBuf;

/// Record store failures. Both are fatal to the run.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backing file is missing, unparseable or lacks the keyword column.
    #[error("record store {path:?} is unreadable: {reason}")]
    Unreadable { path: PathBuf, reason: String },

    /// The ledger could not be written back.
    #[error("failed to persist record store {path:?}: {reason}")]
    PersistFailure { path: PathBuf, reason: String },
}

impl StoreError {
    pub fn unreadable(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::Unreadable {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn persist(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::PersistFailure {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

/// The content generator produced nothing usable for an item.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("generation request failed: {0}")]
    Request(String),

    #[error("generator returned an empty result")]
    Empty,

    #[error("generated body has {actual} characters, floor is {floor}")]
    TooShort { actual: usize, floor: usize },
}

/// An asset could not be generated or stored.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("asset generation failed: {0}")]
    Request(String),

    #[error("asset generator returned no bytes")]
    Empty,

    #[error("failed to store asset at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Run-level failure returned by [`crate::pipeline::run_pass`].
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Store(#[from] StoreError),
}
