//! Outcome of a single pipeline run.
//!
//! A RunReport is built up as the driver walks the batch and is returned to
//! the caller once the catalog step has been attempted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Summary of one pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Unique identifier for this run
    pub id: Uuid,

    /// When the run started
    pub started_at: DateTime<Utc>,

    /// When the run finished (set after the catalog step)
    pub completed_at: Option<DateTime<Utc>>,

    /// One outcome per handled feed item, in feed order
    pub items: Vec<ItemOutcome>,

    /// Result of the catalog rebuild, if it has been attempted
    pub catalog: Option<CatalogOutcome>,
}

impl RunReport {
    /// Start a new report
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            completed_at: None,
            items: Vec::new(),
            catalog: None,
        }
    }

    /// Record the outcome of one item
    pub fn record(&mut self, outcome: ItemOutcome) {
        self.items.push(outcome);
    }

    /// Record the catalog outcome and close the report
    pub fn finish(&mut self, catalog: CatalogOutcome) {
        self.catalog = Some(catalog);
        self.completed_at = Some(Utc::now());
    }

    /// Items that produced a new artifact
    pub fn narrated(&self) -> usize {
        self.count(|s| matches!(s, ItemStatus::Narrated { .. }))
    }

    /// Items skipped because the ledger already knew them
    pub fn skipped(&self) -> usize {
        self.count(|s| matches!(s, ItemStatus::AlreadyProcessed))
    }

    /// Items that failed at some stage
    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, ItemStatus::Failed { .. }))
    }

    /// Whether the catalog was published this run
    pub fn catalog_published(&self) -> bool {
        matches!(self.catalog, Some(CatalogOutcome::Published { .. }))
    }

    fn count(&self, predicate: impl Fn(&ItemStatus) -> bool) -> usize {
        self.items.iter().filter(|i| predicate(&i.status)).count()
    }
}

impl Default for RunReport {
    fn default() -> Self {
        Self::new()
    }
}

/// What happened to one feed item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemOutcome {
    /// Headline of the item
    pub title: String,

    /// Fingerprint, absent when the item had no usable permalink
    pub fingerprint: Option<String>,

    /// Final status
    pub status: ItemStatus,
}

impl ItemOutcome {
    pub fn new(title: impl Into<String>, fingerprint: Option<String>, status: ItemStatus) -> Self {
        Self {
            title: title.into(),
            fingerprint,
            status,
        }
    }
}

/// Final status of a feed item within a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum ItemStatus {
    /// Audio stored under `key` and recorded in the ledger
    Narrated { key: String },

    /// Ledger already had the fingerprint
    AlreadyProcessed,

    /// Aborted at `stage`; not recorded, so it is retried next run
    Failed { stage: ItemStage, error: String },
}

/// Per-item stage of the driver state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStage {
    Checking,
    Composing,
    Synthesizing,
    Recording,
}

impl std::fmt::Display for ItemStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ItemStage::Checking => write!(f, "checking"),
            ItemStage::Composing => write!(f, "composing"),
            ItemStage::Synthesizing => write!(f, "synthesizing"),
            ItemStage::Recording => write!(f, "recording"),
        }
    }
}

/// Result of the catalog step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum CatalogOutcome {
    /// Manifest overwritten with `entries` entries
    Published { entries: usize },

    /// Rebuild failed; the previous manifest stays in place
    Failed { error: String },
}
