//! Core pipeline logic.
//!
//! This module contains:
//! - Fingerprint: stable item identifiers
//! - DedupLedger: skip-on-rerun bookkeeping
//! - NarrationComposer: summary to narration script
//! - AudioSynthesizer: script to stored audio artifact
//! - CatalogBuilder: storage listing to published manifest
//! - Orchestrator: one end-to-end run

pub mod catalog;
pub mod composer;
pub mod fingerprint;
pub mod ledger;
pub mod orchestrator;
pub mod synthesizer;

// Re-export commonly used types
pub use catalog::{build_catalog, CatalogBuilder, CatalogEntry, CatalogSettings};
pub use composer::NarrationComposer;
pub use fingerprint::{fingerprint, ItemFingerprint, AUDIO_SUFFIX};
pub use ledger::DedupLedger;
pub use orchestrator::{Orchestrator, RunSettings, DEFAULT_BATCH_SIZE};
pub use synthesizer::AudioSynthesizer;
