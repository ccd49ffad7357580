//! Catalog builder.
//!
//! The published catalog is a materialized view of the artifact store: every
//! run lists all audio objects, orders them newest first, and overwrites the
//! manifest in one write. Nothing is updated incrementally, so the manifest
//! converges to storage state on the next successful rebuild.
//!
//! # Manifest format
//!
//! ```json
//! [
//!   {
//!     "title": "3f2a9c...",
//!     "url": "https://cdn.example.com/3f2a9c....mp3",
//!     "date": "07.03.2025 14:05"
//!   }
//! ]
//! ```
//!
//! Dates are rendered in UTC. Entries with equal modification times are
//! ordered by key, ascending.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::fingerprint::AUDIO_SUFFIX;
use crate::adapters::{ObjectStore, StoredObject};
use crate::domain::PipelineError;

/// Display format of catalog dates (UTC)
pub const DATE_FORMAT: &str = "%d.%m.%Y %H:%M";

/// Content type of the published manifest
pub const MANIFEST_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// One published audio clip
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Title derived from the artifact key
    pub title: String,

    /// Public URL of the audio
    pub url: String,

    /// Last modification time, `DD.MM.YYYY HH:MM` UTC
    pub date: String,
}

/// Where the catalog reads artifacts from and publishes to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogSettings {
    /// Key prefix shared by all audio artifacts
    pub artifact_prefix: String,

    /// Key of the manifest object
    pub manifest_key: String,

    /// Public base URL fronting the artifact store
    pub public_base_url: String,
}

/// Project a storage listing into catalog entries, newest first
pub fn build_catalog(listing: &[StoredObject], prefix: &str, base_url: &str) -> Vec<CatalogEntry> {
    let mut audio: Vec<&StoredObject> = listing
        .iter()
        .filter(|o| o.key.starts_with(prefix) && o.key.ends_with(AUDIO_SUFFIX))
        .collect();

    audio.sort_by(|a, b| {
        b.last_modified
            .cmp(&a.last_modified)
            .then_with(|| a.key.cmp(&b.key))
    });

    audio
        .into_iter()
        .map(|o| CatalogEntry {
            title: display_title(&o.key, prefix),
            url: public_url(base_url, &o.key),
            date: o.last_modified.format(DATE_FORMAT).to_string(),
        })
        .collect()
}

/// Title shown for an artifact: key without prefix and suffix, separators as spaces
pub fn display_title(key: &str, prefix: &str) -> String {
    let name = key.strip_prefix(prefix).unwrap_or(key);
    let name = name.strip_suffix(AUDIO_SUFFIX).unwrap_or(name);
    name.replace(['_', '-'], " ")
}

/// Join the public base URL and an object key with exactly one slash
pub fn public_url(base_url: &str, key: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        key.trim_start_matches('/')
    )
}

/// Rebuilds and republishes the manifest
pub struct CatalogBuilder {
    artifacts: Arc<dyn ObjectStore>,
    manifest: Arc<dyn ObjectStore>,
    settings: CatalogSettings,
}

impl CatalogBuilder {
    pub fn new(
        artifacts: Arc<dyn ObjectStore>,
        manifest: Arc<dyn ObjectStore>,
        settings: CatalogSettings,
    ) -> Self {
        Self {
            artifacts,
            manifest,
            settings,
        }
    }

    pub fn settings(&self) -> &CatalogSettings {
        &self.settings
    }

    /// List artifacts, rebuild the catalog, and overwrite the manifest.
    ///
    /// Returns the number of published entries.
    pub async fn rebuild(&self) -> Result<usize, PipelineError> {
        let listing = self
            .artifacts
            .list(&self.settings.artifact_prefix)
            .await
            .map_err(|e| PipelineError::CatalogRebuildFailed(PipelineError::describe(&e)))?;

        let entries = build_catalog(
            &listing,
            &self.settings.artifact_prefix,
            &self.settings.public_base_url,
        );

        let body = serde_json::to_vec_pretty(&entries)
            .map_err(|e| PipelineError::CatalogRebuildFailed(e.to_string()))?;

        self.manifest
            .put(&self.settings.manifest_key, body, MANIFEST_CONTENT_TYPE)
            .await
            .map_err(|e| PipelineError::CatalogRebuildFailed(PipelineError::describe(&e)))?;

        info!(
            entries = entries.len(),
            manifest = %self.settings.manifest_key,
            "Published catalog"
        );
        Ok(entries.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn object(key: &str, minute: u32) -> StoredObject {
        StoredObject::new(key, Utc.with_ymd_and_hms(2025, 3, 7, 14, minute, 0).unwrap())
    }

    #[test]
    fn test_newest_first() {
        let listing = vec![object("old.mp3", 1), object("new.mp3", 30), object("mid.mp3", 10)];

        let titles: Vec<String> = build_catalog(&listing, "", "https://cdn.test")
            .into_iter()
            .map(|e| e.title)
            .collect();
        assert_eq!(titles, vec!["new", "mid", "old"]);
    }

    #[test]
    fn test_ties_broken_by_key() {
        let listing = vec![object("b.mp3", 5), object("a.mp3", 5), object("c.mp3", 5)];

        let titles: Vec<String> = build_catalog(&listing, "", "https://cdn.test")
            .into_iter()
            .map(|e| e.title)
            .collect();
        assert_eq!(titles, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_only_audio_under_prefix() {
        let listing = vec![
            object("audio/a.mp3", 1),
            object("audio/notes.txt", 2),
            object("catalog.json", 3),
            object("other/b.mp3", 4),
        ];

        let entries = build_catalog(&listing, "audio/", "https://cdn.test");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].title, "a");
        assert_eq!(entries[0].url, "https://cdn.test/audio/a.mp3");
    }

    #[test]
    fn test_entry_projection() {
        let listing = vec![object("gunun_ozeti-sabah.mp3", 5)];

        let entries = build_catalog(&listing, "", "https://d111.cloudfront.net/");
        assert_eq!(
            entries[0],
            CatalogEntry {
                title: "gunun ozeti sabah".to_string(),
                url: "https://d111.cloudfront.net/gunun_ozeti-sabah.mp3".to_string(),
                date: "07.03.2025 14:05".to_string(),
            }
        );
    }

    #[test]
    fn test_empty_listing() {
        assert!(build_catalog(&[], "", "https://cdn.test").is_empty());
    }

    #[test]
    fn test_non_ascii_is_not_escaped() {
        let entries = vec![CatalogEntry {
            title: "Güncel haber".to_string(),
            url: "https://cdn.test/x.mp3".to_string(),
            date: "01.01.2025 00:00".to_string(),
        }];

        let body = String::from_utf8(serde_json::to_vec_pretty(&entries).unwrap()).unwrap();
        assert!(body.contains("Güncel haber"));
    }
}
