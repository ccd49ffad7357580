//! newsvoice - narrated audio from news feeds
//!
//! Each run pulls the newest items from a news feed, skips the ones already
//! narrated, turns the rest into short spoken clips, stores the audio under
//! a key derived from the item's permalink, and republishes a JSON catalog
//! of everything in storage.
//!
//! # Guarantees
//!
//! - An item is narrated at most once: its fingerprint enters the ledger only
//!   after its audio is stored.
//! - A failed item is retried on the next run.
//! - The catalog is rebuilt from the storage listing on every run, so it
//!   never drifts from what is actually stored.
//!
//! # Modules
//!
//! - `adapters`: Collaborator traits and their implementations (RSS, fabric,
//!   speech over HTTP, filesystem store, SQLite ledger)
//! - `core`: Pipeline components and the run driver
//! - `domain`: Feed items, ledger records, run reports, errors
//! - `config`: YAML + environment configuration
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # One run (cron-friendly)
//! newsvoice
//!
//! # Republish the catalog without touching the feed
//! newsvoice catalog
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;

// Re-export main types at crate root for convenience
pub use core::{CatalogBuilder, CatalogEntry, Orchestrator, RunSettings};
pub use domain::{FeedItem, PipelineError, RunReport};
