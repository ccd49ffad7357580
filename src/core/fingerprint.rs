//! Stable identifiers for feed items.
//!
//! A fingerprint is SHA-256 of the trimmed permalink, truncated to 16 bytes
//! and hex-encoded. It keys the ledger and names the audio artifact.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::domain::{FeedItem, PipelineError};

/// Suffix of every audio artifact key
pub const AUDIO_SUFFIX: &str = ".mp3";

/// Deterministic digest of a feed item's permalink
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemFingerprint(String);

impl ItemFingerprint {
    /// Fingerprint a permalink
    pub fn from_permalink(permalink: &str) -> Result<Self, PipelineError> {
        let permalink = permalink.trim();
        if permalink.is_empty() {
            return Err(PipelineError::InvalidItem("empty permalink".to_string()));
        }

        let digest = Sha256::digest(permalink.as_bytes());
        Ok(Self(hex::encode(&digest[..16])))
    }

    /// Get the raw hex value
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Storage key of the audio artifact for this item
    pub fn artifact_key(&self, prefix: &str) -> String {
        format!("{}{}{}", prefix, self.0, AUDIO_SUFFIX)
    }
}

impl std::fmt::Display for ItemFingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Fingerprint a feed item by its permalink
pub fn fingerprint(item: &FeedItem) -> Result<ItemFingerprint, PipelineError> {
    match item.link.as_deref() {
        Some(link) => ItemFingerprint::from_permalink(link),
        None => Err(PipelineError::InvalidItem(format!(
            "item '{}' has no permalink",
            item.title
        ))),
    }
}
