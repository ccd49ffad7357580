//! In-process stores.
//!
//! Useful for tests and for trying the pipeline without touching disk.
//! Contents live as long as the value does.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use super::{LedgerStore, ObjectStore, StoredObject};
use crate::domain::LedgerRecord;

#[derive(Debug, Clone)]
struct MemoryObject {
    bytes: Vec<u8>,
    content_type: String,
    last_modified: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct ObjectMap {
    objects: BTreeMap<String, MemoryObject>,
    last_stamp: Option<DateTime<Utc>>,
}

/// Object store held in memory.
///
/// `put` stamps objects with strictly increasing times, so objects written
/// later always list as newer.
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    inner: Mutex<ObjectMap>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an object with an explicit modification time
    pub fn put_at(
        &self,
        key: impl Into<String>,
        bytes: Vec<u8>,
        content_type: impl Into<String>,
        last_modified: DateTime<Utc>,
    ) {
        let mut inner = self.lock();
        inner.objects.insert(
            key.into(),
            MemoryObject {
                bytes,
                content_type: content_type.into(),
                last_modified,
            },
        );
    }

    /// Bytes stored under `key`
    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.lock().objects.get(key).map(|o| o.bytes.clone())
    }

    /// Content type recorded for `key`
    pub fn content_type(&self, key: &str) -> Option<String> {
        self.lock().objects.get(key).map(|o| o.content_type.clone())
    }

    /// All keys, sorted
    pub fn keys(&self) -> Vec<String> {
        self.lock().objects.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ObjectMap> {
        // A panic while holding the lock cannot leave the map half-updated
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<()> {
        let mut inner = self.lock();

        let now = Utc::now();
        let stamp = match inner.last_stamp {
            Some(prev) if now <= prev => prev + Duration::milliseconds(1),
            _ => now,
        };
        inner.last_stamp = Some(stamp);

        inner.objects.insert(
            key.to_string(),
            MemoryObject {
                bytes,
                content_type: content_type.to_string(),
                last_modified: stamp,
            },
        );
        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<StoredObject>> {
        Ok(self
            .lock()
            .objects
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(key, object)| StoredObject::new(key.clone(), object.last_modified))
            .collect())
    }
}

/// Ledger store held in memory
#[derive(Debug, Default)]
pub struct MemoryLedger {
    records: Mutex<HashMap<String, LedgerRecord>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the ledger with an already processed fingerprint
    pub fn insert(&self, key: impl Into<String>, record: LedgerRecord) {
        self.lock().insert(key.into(), record);
    }

    pub fn contains(&self, key: &str) -> bool {
        self.lock().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, LedgerRecord>> {
        self.records.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl LedgerStore for MemoryLedger {
    async fn get(&self, key: &str) -> Result<Option<LedgerRecord>> {
        Ok(self.lock().get(key).cloned())
    }

    async fn put(&self, key: &str, record: &LedgerRecord) -> Result<()> {
        self.lock().insert(key.to_string(), record.clone());
        Ok(())
    }
}
