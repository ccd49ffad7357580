//! Adapter interfaces for external systems.
//!
//! Every collaborator the pipeline talks to (feed, summarizer, speech engine,
//! object store, ledger store) sits behind one of these traits. Concrete
//! adapters are built once by the binary and handed to the components as
//! `Arc<dyn Trait>`, so tests can swap in fakes.

pub mod excerpt;
pub mod fabric;
pub mod feed;
pub mod fs_store;
pub mod memory;
pub mod speech;
pub mod sqlite_ledger;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{FeedItem, LedgerRecord};

pub use excerpt::ExcerptSummarizer;
pub use fabric::FabricSummarizer;
pub use feed::RssFeed;
pub use fs_store::FsObjectStore;
pub use memory::{MemoryLedger, MemoryObjectStore};
pub use speech::HttpSpeechClient;
pub use sqlite_ledger::SqliteLedger;

/// Source of feed items
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Human-readable source name
    fn name(&self) -> &str;

    /// Fetch all items currently in the feed, in feed order
    async fn fetch(&self) -> Result<Vec<FeedItem>>;
}

/// Opaque text-to-text summarization collaborator
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Human-readable summarizer name
    fn name(&self) -> &str;

    /// Turn arbitrary (possibly marked-up) text into a short narration
    async fn summarize(&self, text: &str) -> Result<String>;
}

/// Opaque text-to-audio collaborator
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Human-readable engine name
    fn name(&self) -> &str;

    /// Render `text` to an encoded audio stream
    async fn synthesize(&self, text: &str, voice: &VoiceSettings) -> Result<Vec<u8>>;
}

/// Durable object storage
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Write an object. Readers see either the old object or the complete new one.
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<()>;

    /// List every object whose key starts with `prefix`
    async fn list(&self, prefix: &str) -> Result<Vec<StoredObject>>;
}

/// Key-value storage backing the dedup ledger
#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<LedgerRecord>>;

    /// Whether a record exists under `key`, without decoding it
    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.get(key).await?.is_some())
    }

    /// Insert or replace the record under `key`
    async fn put(&self, key: &str, record: &LedgerRecord) -> Result<()>;
}

/// An object as reported by a storage listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredObject {
    /// Object key
    pub key: String,

    /// Storage-reported modification time
    pub last_modified: DateTime<Utc>,
}

impl StoredObject {
    pub fn new(key: impl Into<String>, last_modified: DateTime<Utc>) -> Self {
        Self {
            key: key.into(),
            last_modified,
        }
    }
}

/// Fixed voice configuration passed to the speech collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceSettings {
    /// Engine/model identifier (e.g. "tts-1")
    pub model: String,

    /// Voice identifier
    pub voice: String,

    /// Output encoding; the artifact suffix assumes "mp3"
    pub format: String,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            model: "tts-1".to_string(),
            voice: "alloy".to_string(),
            format: "mp3".to_string(),
        }
    }
}
