//! Dedup ledger.
//!
//! Remembers which fingerprints have been fully processed. Presence of a
//! record means the item's audio is already in storage, so the driver only
//! marks an item after the artifact write has succeeded.

use std::sync::Arc;

use tracing::debug;

use super::fingerprint::ItemFingerprint;
use crate::adapters::LedgerStore;
use crate::domain::{LedgerRecord, PipelineError};

/// Ledger of processed feed items
pub struct DedupLedger {
    store: Arc<dyn LedgerStore>,
}

impl DedupLedger {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// Check whether `fingerprint` has been processed
    pub async fn has_processed(
        &self,
        fingerprint: &ItemFingerprint,
    ) -> Result<bool, PipelineError> {
        self.store
            .exists(fingerprint.as_str())
            .await
            .map_err(|e| PipelineError::LedgerUnavailable(PipelineError::describe(&e)))
    }

    /// Record `fingerprint` as processed (insert or replace)
    pub async fn mark_processed(
        &self,
        fingerprint: &ItemFingerprint,
        title: &str,
    ) -> Result<(), PipelineError> {
        self.store
            .put(fingerprint.as_str(), &LedgerRecord::new(title))
            .await
            .map_err(|e| PipelineError::LedgerUnavailable(PipelineError::describe(&e)))?;

        debug!(%fingerprint, "Marked as processed");
        Ok(())
    }
}
