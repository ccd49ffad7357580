//! Failure taxonomy for the pipeline.
//!
//! Adapters report failures as `anyhow::Error`; components translate them
//! into one of these variants so the driver can decide what is fatal.

use thiserror::Error;

/// Errors raised by pipeline components
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Invalid feed item: {0}")]
    InvalidItem(String),

    #[error("Ledger unavailable: {0}")]
    LedgerUnavailable(String),

    #[error("Summarization failed: {0}")]
    SummarizationFailed(String),

    #[error("Speech synthesis failed: {0}")]
    SynthesisFailed(String),

    #[error("Storage write failed for '{key}': {reason}")]
    StorageWriteFailed { key: String, reason: String },

    #[error("Catalog rebuild failed: {0}")]
    CatalogRebuildFailed(String),

    #[error("Feed fetch failed: {0}")]
    FeedFetchFailed(String),
}

impl PipelineError {
    /// Build a variant message from an adapter error, keeping its context chain
    pub(crate) fn describe(error: &anyhow::Error) -> String {
        format!("{:#}", error)
    }

    /// Whether this error aborts the whole run rather than one item or step
    pub fn is_run_fatal(&self) -> bool {
        matches!(self, Self::FeedFetchFailed(_))
    }
}
