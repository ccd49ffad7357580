//! Domain types for the newsvoice pipeline.
//!
//! This module contains the core data structures:
//! - FeedItem: an entry read from the news feed
//! - LedgerRecord: what the dedup ledger remembers per fingerprint
//! - PipelineError: the failure taxonomy shared by every component
//! - RunReport: the outcome of one pipeline run

pub mod error;
pub mod item;
pub mod report;

// Re-export commonly used types
pub use error::PipelineError;
pub use item::{FeedItem, LedgerRecord};
pub use report::{CatalogOutcome, ItemOutcome, ItemStage, ItemStatus, RunReport};
