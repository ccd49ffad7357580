//! SQLite-backed ledger store.
//!
//! One table keyed by fingerprint. Inserts replace, so re-marking an item
//! is harmless.

use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use super::LedgerStore;
use crate::domain::LedgerRecord;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS processed_news (
    news_id      TEXT PRIMARY KEY,
    title        TEXT NOT NULL,
    processed_at TEXT NOT NULL
);";

/// Ledger store persisted in a SQLite database file
#[derive(Clone)]
pub struct SqliteLedger {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteLedger {
    /// Open (or create) the ledger database at `path`
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create ledger directory: {}", parent.display())
            })?;
        }

        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open ledger database: {}", path.display()))?;
        Self::from_connection(conn)
    }

    /// Open a throwaway in-memory ledger
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory ledger")?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)
            .context("Failed to initialize ledger schema")?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `op` against the connection on the blocking pool
    async fn with_connection<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);

        tokio::task::spawn_blocking(move || {
            let guard = conn
                .lock()
                .map_err(|_| anyhow::anyhow!("Ledger connection lock poisoned"))?;
            op(&guard)
        })
        .await
        .context("Ledger task failed")?
    }
}

#[async_trait]
impl LedgerStore for SqliteLedger {
    async fn get(&self, key: &str) -> Result<Option<LedgerRecord>> {
        let key = key.to_string();

        self.with_connection(move |conn| {
            let row = conn
                .query_row(
                    "SELECT title, processed_at FROM processed_news WHERE news_id = ?1",
                    params![key],
                    |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
                )
                .optional()
                .context("Failed to query ledger")?;

            row.map(|(title, processed_at)| -> Result<LedgerRecord> {
                let processed_at = DateTime::parse_from_rfc3339(&processed_at)
                    .with_context(|| format!("Corrupt ledger timestamp: {}", processed_at))?
                    .with_timezone(&Utc);
                Ok(LedgerRecord {
                    title,
                    processed_at,
                })
            })
            .transpose()
        })
        .await
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let key = key.to_string();

        self.with_connection(move |conn| {
            let found = conn
                .query_row(
                    "SELECT 1 FROM processed_news WHERE news_id = ?1",
                    params![key],
                    |_| Ok(()),
                )
                .optional()
                .context("Failed to query ledger")?;
            Ok(found.is_some())
        })
        .await
    }

    async fn put(&self, key: &str, record: &LedgerRecord) -> Result<()> {
        let key = key.to_string();
        let record = record.clone();

        self.with_connection(move |conn| {
            conn.execute(
                "INSERT OR REPLACE INTO processed_news (news_id, title, processed_at) VALUES (?1, ?2, ?3)",
                params![key, record.title, record.processed_at.to_rfc3339()],
            )
            .context("Failed to write ledger record")?;
            Ok(())
        })
        .await
    }
}
