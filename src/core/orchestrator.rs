//! Pipeline driver.
//!
//! One run walks `Fetching -> ForEachItem{Checking, Composing, Synthesizing,
//! Recording} -> RebuildingCatalog -> Done`, strictly in sequence. Only a
//! feed fetch failure aborts the run; every other failure is contained to
//! the item (or, for the catalog, to that step) and logged.
//!
//! An item is marked in the ledger only after its audio is stored, so a
//! crash or failure anywhere before that leaves it eligible for the next run.

use std::sync::Arc;

use tracing::{error, info, instrument, warn};

use super::catalog::CatalogBuilder;
use super::composer::NarrationComposer;
use super::fingerprint::{fingerprint, ItemFingerprint};
use super::ledger::DedupLedger;
use super::synthesizer::AudioSynthesizer;
use crate::adapters::FeedSource;
use crate::domain::{
    CatalogOutcome, FeedItem, ItemOutcome, ItemStage, ItemStatus, PipelineError, RunReport,
};

/// Default number of feed items handled per run
pub const DEFAULT_BATCH_SIZE: usize = 3;

/// Per-run knobs.
///
/// The artifact key prefix is not here: audio is written under the prefix
/// the catalog lists, taken from the catalog builder's settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSettings {
    /// Items taken from the head of the feed
    pub batch_size: usize,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

/// Composes the pipeline components into one run
pub struct Orchestrator {
    feed: Arc<dyn FeedSource>,
    ledger: DedupLedger,
    composer: NarrationComposer,
    synthesizer: AudioSynthesizer,
    catalog: CatalogBuilder,
    settings: RunSettings,
}

impl Orchestrator {
    pub fn new(
        feed: Arc<dyn FeedSource>,
        ledger: DedupLedger,
        composer: NarrationComposer,
        synthesizer: AudioSynthesizer,
        catalog: CatalogBuilder,
        settings: RunSettings,
    ) -> Self {
        Self {
            feed,
            ledger,
            composer,
            synthesizer,
            catalog,
            settings,
        }
    }

    /// Execute one run.
    ///
    /// Returns `FeedFetchFailed` if the feed cannot be read; otherwise a
    /// report of every handled item and the catalog outcome.
    #[instrument(skip(self), fields(feed = %self.feed.name()))]
    pub async fn run_once(&self) -> Result<RunReport, PipelineError> {
        let mut report = RunReport::new();
        info!(run_id = %report.id, "Starting run");

        let items = self.feed.fetch().await.map_err(|e| {
            let err = PipelineError::FeedFetchFailed(PipelineError::describe(&e));
            error!(run_id = %report.id, error = %err, "Run aborted");
            err
        })?;

        info!(
            available = items.len(),
            batch = self.settings.batch_size,
            "Fetched feed"
        );

        for item in items.into_iter().take(self.settings.batch_size) {
            let outcome = self.process_item(&item).await;
            report.record(outcome);
        }

        let catalog = match self.catalog.rebuild().await {
            Ok(entries) => CatalogOutcome::Published { entries },
            Err(e) => {
                error!(error = %e, "Catalog rebuild failed; keeping previous manifest");
                CatalogOutcome::Failed {
                    error: e.to_string(),
                }
            }
        };
        report.finish(catalog);

        info!(
            run_id = %report.id,
            narrated = report.narrated(),
            skipped = report.skipped(),
            failed = report.failed(),
            catalog_published = report.catalog_published(),
            "Run completed"
        );
        Ok(report)
    }

    /// Rebuild and publish the catalog without touching the feed
    pub async fn rebuild_catalog(&self) -> Result<usize, PipelineError> {
        self.catalog.rebuild().await
    }

    async fn process_item(&self, item: &FeedItem) -> ItemOutcome {
        // Checking
        let fp = match fingerprint(item) {
            Ok(fp) => fp,
            Err(e) => return failed(item, None, ItemStage::Checking, e),
        };

        match self.ledger.has_processed(&fp).await {
            Ok(true) => {
                info!(fingerprint = %fp, "Skipping, already processed: {}", item.title);
                return ItemOutcome::new(
                    item.title.clone(),
                    Some(fp.to_string()),
                    ItemStatus::AlreadyProcessed,
                );
            }
            Ok(false) => {}
            Err(e) => return failed(item, Some(&fp), ItemStage::Checking, e),
        }

        info!(fingerprint = %fp, "Processing: {}", item.title);

        // Composing
        let script = match self.composer.compose(&item.title, &item.summary).await {
            Ok(script) => script,
            Err(e) => return failed(item, Some(&fp), ItemStage::Composing, e),
        };

        // Synthesizing
        let key = fp.artifact_key(&self.catalog.settings().artifact_prefix);
        if let Err(e) = self.synthesizer.synthesize_and_store(&script, &key).await {
            return failed(item, Some(&fp), ItemStage::Synthesizing, e);
        }

        // Recording
        if let Err(e) = self.ledger.mark_processed(&fp, &item.title).await {
            return failed(item, Some(&fp), ItemStage::Recording, e);
        }

        ItemOutcome::new(
            item.title.clone(),
            Some(fp.to_string()),
            ItemStatus::Narrated { key },
        )
    }
}

/// Log a contained item failure and build its outcome
fn failed(
    item: &FeedItem,
    fp: Option<&ItemFingerprint>,
    stage: ItemStage,
    error: PipelineError,
) -> ItemOutcome {
    warn!(
        fingerprint = fp.map(|f| f.as_str()).unwrap_or("-"),
        %stage,
        error = %error,
        "Item failed, will retry next run: {}",
        item.title
    );

    ItemOutcome::new(
        item.title.clone(),
        fp.map(|f| f.to_string()),
        ItemStatus::Failed {
            stage,
            error: error.to_string(),
        },
    )
}
