//! Pipeline Integration Tests
//!
//! End-to-end runs of the orchestrator against in-memory stores and
//! scripted collaborators.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use newsvoice::adapters::{
    FeedSource, LedgerStore, MemoryLedger, MemoryObjectStore, ObjectStore, SpeechSynthesizer,
    StoredObject, Summarizer, VoiceSettings,
};
use newsvoice::core::{
    fingerprint, AudioSynthesizer, CatalogBuilder, CatalogEntry, CatalogSettings, DedupLedger,
    NarrationComposer, Orchestrator, RunSettings,
};
use newsvoice::domain::{
    CatalogOutcome, FeedItem, ItemStage, ItemStatus, LedgerRecord, PipelineError,
};

const MANIFEST_KEY: &str = "catalog.json";
const BASE_URL: &str = "https://cdn.test";

struct StaticFeed(Vec<FeedItem>);

#[async_trait]
impl FeedSource for StaticFeed {
    fn name(&self) -> &str {
        "static"
    }

    async fn fetch(&self) -> Result<Vec<FeedItem>> {
        Ok(self.0.clone())
    }
}

struct UnreachableFeed;

#[async_trait]
impl FeedSource for UnreachableFeed {
    fn name(&self) -> &str {
        "unreachable"
    }

    async fn fetch(&self) -> Result<Vec<FeedItem>> {
        anyhow::bail!("dns error: no such host")
    }
}

/// Prefixes the summary; refuses summaries containing "FAIL_SUMMARY"
struct ScriptedSummarizer;

#[async_trait]
impl Summarizer for ScriptedSummarizer {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn summarize(&self, text: &str) -> Result<String> {
        if text.contains("FAIL_SUMMARY") {
            anyhow::bail!("model overloaded");
        }
        Ok(format!("Haber: {}", text))
    }
}

/// Echoes the script as audio bytes; refuses scripts containing "FAIL_SPEECH"
#[derive(Default)]
struct ScriptedSpeech {
    calls: AtomicUsize,
}

#[async_trait]
impl SpeechSynthesizer for ScriptedSpeech {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn synthesize(&self, text: &str, _voice: &VoiceSettings) -> Result<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if text.contains("FAIL_SPEECH") {
            anyhow::bail!("speech engine returned 503");
        }
        Ok(text.as_bytes().to_vec())
    }
}

/// Reads fine, refuses writes
#[derive(Default)]
struct ReadOnlyLedger {
    inner: MemoryLedger,
}

#[async_trait]
impl LedgerStore for ReadOnlyLedger {
    async fn get(&self, key: &str) -> Result<Option<LedgerRecord>> {
        self.inner.get(key).await
    }

    async fn put(&self, _key: &str, _record: &LedgerRecord) -> Result<()> {
        anyhow::bail!("attempt to write a readonly database")
    }
}

struct UnreachableLedger;

#[async_trait]
impl LedgerStore for UnreachableLedger {
    async fn get(&self, _key: &str) -> Result<Option<LedgerRecord>> {
        anyhow::bail!("database is locked")
    }

    async fn put(&self, _key: &str, _record: &LedgerRecord) -> Result<()> {
        anyhow::bail!("database is locked")
    }
}

/// Delegates to a memory store, but rejects audio writes or listings on demand
struct FlakyStore {
    inner: MemoryObjectStore,
    reject_audio: bool,
    reject_list: bool,
}

#[async_trait]
impl ObjectStore for FlakyStore {
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<()> {
        if self.reject_audio && key.ends_with(".mp3") {
            anyhow::bail!("access denied");
        }
        self.inner.put(key, bytes, content_type).await
    }

    async fn list(&self, prefix: &str) -> Result<Vec<StoredObject>> {
        if self.reject_list {
            anyhow::bail!("list permission missing");
        }
        self.inner.list(prefix).await
    }
}

struct Harness {
    ledger: Arc<MemoryLedger>,
    store: Arc<MemoryObjectStore>,
    speech: Arc<ScriptedSpeech>,
}

impl Harness {
    fn new() -> Self {
        Self {
            ledger: Arc::new(MemoryLedger::new()),
            store: Arc::new(MemoryObjectStore::new()),
            speech: Arc::new(ScriptedSpeech::default()),
        }
    }

    fn orchestrator(&self, feed: Arc<dyn FeedSource>) -> Orchestrator {
        build(
            feed,
            self.ledger.clone(),
            self.speech.clone(),
            self.store.clone(),
        )
    }

    fn mark(&self, item: &FeedItem) {
        let fp = fingerprint(item).unwrap();
        self.ledger
            .insert(fp.as_str(), LedgerRecord::new(item.title.clone()));
    }

    fn is_marked(&self, item: &FeedItem) -> bool {
        self.ledger.contains(fingerprint(item).unwrap().as_str())
    }

    fn manifest(&self) -> Vec<CatalogEntry> {
        let body = self.store.get(MANIFEST_KEY).expect("manifest published");
        serde_json::from_slice(&body).unwrap()
    }
}

fn build(
    feed: Arc<dyn FeedSource>,
    ledger: Arc<dyn LedgerStore>,
    speech: Arc<dyn SpeechSynthesizer>,
    store: Arc<dyn ObjectStore>,
) -> Orchestrator {
    build_with_prefix(feed, ledger, speech, store, "")
}

fn build_with_prefix(
    feed: Arc<dyn FeedSource>,
    ledger: Arc<dyn LedgerStore>,
    speech: Arc<dyn SpeechSynthesizer>,
    store: Arc<dyn ObjectStore>,
    prefix: &str,
) -> Orchestrator {
    Orchestrator::new(
        feed,
        DedupLedger::new(ledger),
        NarrationComposer::new(Arc::new(ScriptedSummarizer)),
        AudioSynthesizer::new(speech, store.clone(), VoiceSettings::default()),
        CatalogBuilder::new(
            store.clone(),
            store,
            CatalogSettings {
                artifact_prefix: prefix.to_string(),
                manifest_key: MANIFEST_KEY.to_string(),
                public_base_url: BASE_URL.to_string(),
            },
        ),
        RunSettings::default(),
    )
}

fn news(n: usize) -> FeedItem {
    FeedItem::new(
        format!("https://news.test/haber-{}", n),
        format!("Haber {}", n),
        format!("<p>Gelişme {}.</p>", n),
    )
}

fn artifact_key(item: &FeedItem) -> String {
    fingerprint(item).unwrap().artifact_key("")
}

#[tokio::test]
async fn test_three_new_items_are_narrated_and_cataloged() {
    let harness = Harness::new();
    let items = vec![news(1), news(2), news(3)];
    let orchestrator = harness.orchestrator(Arc::new(StaticFeed(items.clone())));

    let report = orchestrator.run_once().await.unwrap();

    assert_eq!(report.narrated(), 3);
    assert_eq!(report.skipped(), 0);
    assert_eq!(report.failed(), 0);
    assert!(report.catalog_published());
    assert!(report.completed_at.is_some());

    for item in &items {
        assert!(harness.is_marked(item));
        let audio = String::from_utf8(harness.store.get(&artifact_key(item)).unwrap()).unwrap();
        assert_eq!(
            audio,
            format!(
                "Haberin başlığı: {}. Detaylar şöyle: Haber: {}",
                item.title, item.summary
            )
        );
    }

    let manifest = harness.manifest();
    assert_eq!(manifest.len(), 3);
    // Written last, listed first
    assert_eq!(
        manifest[0].url,
        format!("{}/{}", BASE_URL, artifact_key(&items[2]))
    );
}

#[tokio::test]
async fn test_only_batch_size_items_are_taken() {
    let harness = Harness::new();
    let items: Vec<FeedItem> = (1..=5).map(news).collect();
    let orchestrator = harness.orchestrator(Arc::new(StaticFeed(items.clone())));

    let report = orchestrator.run_once().await.unwrap();

    assert_eq!(report.items.len(), 3);
    assert!(!harness.is_marked(&items[3]));
    assert!(!harness.is_marked(&items[4]));
}

#[tokio::test]
async fn test_already_processed_items_are_skipped() {
    let harness = Harness::new();
    let items = vec![news(1), news(2), news(3)];
    harness.mark(&items[0]);
    harness.mark(&items[2]);
    let orchestrator = harness.orchestrator(Arc::new(StaticFeed(items.clone())));

    let report = orchestrator.run_once().await.unwrap();

    assert_eq!(report.narrated(), 1);
    assert_eq!(report.skipped(), 2);
    assert_eq!(harness.speech.calls.load(Ordering::SeqCst), 1);
    assert!(matches!(report.items[0].status, ItemStatus::AlreadyProcessed));
    assert!(matches!(report.items[1].status, ItemStatus::Narrated { .. }));
    assert_eq!(harness.manifest().len(), 1);
}

#[tokio::test]
async fn test_synthesis_failure_is_contained_and_retried() {
    let harness = Harness::new();
    let broken = FeedItem::new(
        "https://news.test/bozuk",
        "Bozuk haber",
        "FAIL_SPEECH içerik",
    );
    let items = vec![news(1), broken.clone(), news(3)];
    let orchestrator = harness.orchestrator(Arc::new(StaticFeed(items)));

    let report = orchestrator.run_once().await.unwrap();

    assert_eq!(report.narrated(), 2);
    assert_eq!(report.failed(), 1);
    match &report.items[1].status {
        ItemStatus::Failed { stage, error } => {
            assert_eq!(*stage, ItemStage::Synthesizing);
            assert!(error.contains("503"));
        }
        other => panic!("expected failure, got {:?}", other),
    }
    assert!(!harness.is_marked(&broken));
    assert!(harness.store.get(&artifact_key(&broken)).is_none());
    assert_eq!(harness.manifest().len(), 2);

    // Next run retries only the failed item
    let retry = harness.orchestrator(Arc::new(StaticFeed(vec![news(1), broken, news(3)])));
    let report = retry.run_once().await.unwrap();
    assert_eq!(report.skipped(), 2);
    assert_eq!(report.failed(), 1);
    assert_eq!(harness.speech.calls.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn test_second_run_is_idempotent() {
    let harness = Harness::new();
    let items = vec![news(1), news(2), news(3)];

    let first = harness.orchestrator(Arc::new(StaticFeed(items.clone())));
    first.run_once().await.unwrap();
    let manifest_after_first = harness.manifest();
    let objects_after_first = harness.store.len();

    let second = harness.orchestrator(Arc::new(StaticFeed(items)));
    let report = second.run_once().await.unwrap();

    assert_eq!(report.narrated(), 0);
    assert_eq!(report.skipped(), 3);
    assert_eq!(harness.speech.calls.load(Ordering::SeqCst), 3);
    assert_eq!(harness.store.len(), objects_after_first);
    assert_eq!(harness.manifest(), manifest_after_first);
}

#[tokio::test]
async fn test_feed_fetch_failure_aborts_run() {
    let harness = Harness::new();
    let orchestrator = harness.orchestrator(Arc::new(UnreachableFeed));

    let err = orchestrator.run_once().await.unwrap_err();

    assert!(matches!(err, PipelineError::FeedFetchFailed(_)));
    assert!(err.is_run_fatal());
    assert!(err.to_string().contains("no such host"));
    assert_eq!(harness.speech.calls.load(Ordering::SeqCst), 0);
    assert!(harness.ledger.is_empty());
    assert!(harness.store.is_empty());
}

#[tokio::test]
async fn test_summarizer_failure_leaves_item_unmarked() {
    let harness = Harness::new();
    let item = FeedItem::new("https://news.test/uzun", "Uzun haber", "FAIL_SUMMARY");
    let orchestrator = harness.orchestrator(Arc::new(StaticFeed(vec![item.clone(), news(2)])));

    let report = orchestrator.run_once().await.unwrap();

    assert!(matches!(
        report.items[0].status,
        ItemStatus::Failed {
            stage: ItemStage::Composing,
            ..
        }
    ));
    assert!(!harness.is_marked(&item));
    assert!(harness.is_marked(&news(2)));
}

#[tokio::test]
async fn test_item_without_link_is_rejected() {
    let harness = Harness::new();
    let orphan = FeedItem::without_link("Bağlantısız", "İçerik");
    let orchestrator = harness.orchestrator(Arc::new(StaticFeed(vec![orphan, news(2)])));

    let report = orchestrator.run_once().await.unwrap();

    assert!(report.items[0].fingerprint.is_none());
    assert!(matches!(
        report.items[0].status,
        ItemStatus::Failed {
            stage: ItemStage::Checking,
            ..
        }
    ));
    assert_eq!(report.narrated(), 1);
}

#[tokio::test]
async fn test_unavailable_ledger_processes_nothing() {
    let store = Arc::new(MemoryObjectStore::new());
    let speech = Arc::new(ScriptedSpeech::default());
    let orchestrator = build(
        Arc::new(StaticFeed(vec![news(1), news(2)])),
        Arc::new(UnreachableLedger),
        speech.clone(),
        store.clone(),
    );

    let report = orchestrator.run_once().await.unwrap();

    assert_eq!(report.failed(), 2);
    assert_eq!(speech.calls.load(Ordering::SeqCst), 0);
    // The catalog is still republished from storage
    assert!(report.catalog_published());
    assert_eq!(store.get(MANIFEST_KEY).unwrap(), b"[]");
}

#[tokio::test]
async fn test_storage_failure_leaves_item_unmarked() {
    let ledger = Arc::new(MemoryLedger::new());
    let store = Arc::new(FlakyStore {
        inner: MemoryObjectStore::new(),
        reject_audio: true,
        reject_list: false,
    });
    let item = news(1);
    let orchestrator = build(
        Arc::new(StaticFeed(vec![item.clone()])),
        ledger.clone(),
        Arc::new(ScriptedSpeech::default()),
        store.clone(),
    );

    let report = orchestrator.run_once().await.unwrap();

    match &report.items[0].status {
        ItemStatus::Failed { stage, error } => {
            assert_eq!(*stage, ItemStage::Synthesizing);
            assert!(error.contains("access denied"));
        }
        other => panic!("expected failure, got {:?}", other),
    }
    assert!(ledger.is_empty());
    assert!(store.inner.get(&artifact_key(&item)).is_none());
}

#[tokio::test]
async fn test_catalog_failure_does_not_fail_run() {
    let ledger = Arc::new(MemoryLedger::new());
    let store = Arc::new(FlakyStore {
        inner: MemoryObjectStore::new(),
        reject_audio: false,
        reject_list: true,
    });
    let orchestrator = build(
        Arc::new(StaticFeed(vec![news(1)])),
        ledger.clone(),
        Arc::new(ScriptedSpeech::default()),
        store.clone(),
    );

    let report = orchestrator.run_once().await.unwrap();

    assert_eq!(report.narrated(), 1);
    assert_eq!(ledger.len(), 1);
    assert!(matches!(report.catalog, Some(CatalogOutcome::Failed { .. })));
    assert!(store.inner.get(MANIFEST_KEY).is_none());
}

#[tokio::test]
async fn test_ledger_write_failure_keeps_artifact_and_retries() {
    let ledger = Arc::new(ReadOnlyLedger::default());
    let store = Arc::new(MemoryObjectStore::new());
    let speech = Arc::new(ScriptedSpeech::default());
    let items = vec![news(1), news(2)];
    let orchestrator = build(
        Arc::new(StaticFeed(items.clone())),
        ledger.clone(),
        speech.clone(),
        store.clone(),
    );

    let report = orchestrator.run_once().await.unwrap();

    assert_eq!(report.failed(), 2);
    for (item, outcome) in items.iter().zip(&report.items) {
        match &outcome.status {
            ItemStatus::Failed { stage, error } => {
                assert_eq!(*stage, ItemStage::Recording);
                assert!(error.contains("readonly"));
            }
            other => panic!("expected failure, got {:?}", other),
        }
        assert!(store.get(&artifact_key(item)).is_some());
    }
    assert!(ledger.inner.is_empty());

    // The stored audio is still published
    assert!(report.catalog_published());
    let manifest: Vec<CatalogEntry> =
        serde_json::from_slice(&store.get(MANIFEST_KEY).unwrap()).unwrap();
    assert_eq!(manifest.len(), 2);

    // Not recorded, so the next run narrates them again under the same keys
    let report = orchestrator.run_once().await.unwrap();
    assert_eq!(report.skipped(), 0);
    assert_eq!(speech.calls.load(Ordering::SeqCst), 4);
    assert_eq!(store.len(), 3);
}

#[tokio::test]
async fn test_artifacts_land_under_catalog_prefix() {
    let store = Arc::new(MemoryObjectStore::new());
    let item = news(1);
    let orchestrator = build_with_prefix(
        Arc::new(StaticFeed(vec![item.clone()])),
        Arc::new(MemoryLedger::new()),
        Arc::new(ScriptedSpeech::default()),
        store.clone(),
        "audio/",
    );

    let report = orchestrator.run_once().await.unwrap();

    let key = fingerprint(&item).unwrap().artifact_key("audio/");
    assert!(matches!(&report.items[0].status, ItemStatus::Narrated { key: k } if *k == key));
    assert!(store.get(&key).is_some());
    assert_eq!(report.catalog, Some(CatalogOutcome::Published { entries: 1 }));
}
