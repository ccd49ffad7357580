//! Feed items and ledger records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single entry read from the news feed.
///
/// Items are read-only once fetched. The permalink is optional because
/// feeds in the wild omit it; such items are rejected at fingerprinting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedItem {
    /// Permalink of the article
    pub link: Option<String>,

    /// Headline
    pub title: String,

    /// Raw summary, may contain HTML markup
    pub summary: String,
}

impl FeedItem {
    /// Create a feed item with a permalink
    pub fn new(
        link: impl Into<String>,
        title: impl Into<String>,
        summary: impl Into<String>,
    ) -> Self {
        Self {
            link: Some(link.into()),
            title: title.into(),
            summary: summary.into(),
        }
    }

    /// Create a feed item that carries no permalink
    pub fn without_link(title: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            link: None,
            title: title.into(),
            summary: summary.into(),
        }
    }
}

/// What the ledger stores for a processed fingerprint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerRecord {
    /// Original headline of the item
    pub title: String,

    /// When the item was recorded as processed
    pub processed_at: DateTime<Utc>,
}

impl LedgerRecord {
    /// Create a record stamped with the current time
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            processed_at: Utc::now(),
        }
    }
}
