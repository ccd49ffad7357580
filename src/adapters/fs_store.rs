//! Directory-backed object store.
//!
//! Object keys map to paths under a root directory (`/` separates
//! components). Writes land in a hidden temporary file next to the target
//! and are renamed into place, so a reader sees either the previous object
//! or the complete new one. Listing reports filesystem modification times.
//!
//! Dot-leading names are reserved for in-flight files: keys with such a
//! component are rejected, and listing skips them.

use std::io::Write;
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::fs;
use tracing::warn;

use super::{ObjectStore, StoredObject};

/// Prefix for in-flight temporary files; listing skips dot files
const STAGING_PREFIX: &str = ".newsvoice-";

/// Object store rooted at a local directory
#[derive(Debug, Clone)]
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    /// Open a store, creating the root directory if needed
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)
            .await
            .with_context(|| format!("Failed to create object store root: {}", root.display()))?;

        Ok(Self { root })
    }

    /// Root directory of the store
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a key to a path under the root, rejecting escapes
    pub fn object_path(&self, key: &str) -> Result<PathBuf> {
        if key.is_empty() || key.ends_with('/') || key.contains('\\') {
            anyhow::bail!("Invalid object key: '{}'", key);
        }

        let relative = Path::new(key);
        let well_formed = relative.components().all(|c| match c {
            Component::Normal(name) => !name.to_string_lossy().starts_with('.'),
            _ => false,
        });
        if !well_formed {
            anyhow::bail!("Invalid object key: '{}'", key);
        }

        Ok(self.root.join(relative))
    }

    /// Key of a file under the root; `None` if the name is not valid UTF-8
    fn key_for(&self, path: &Path) -> Result<Option<String>> {
        let relative = path
            .strip_prefix(&self.root)
            .with_context(|| format!("Path outside store root: {}", path.display()))?;

        let parts: Option<Vec<&str>> = relative
            .components()
            .map(|c| c.as_os_str().to_str())
            .collect();
        Ok(parts.map(|parts| parts.join("/")))
    }
}

/// Stage bytes in a sibling temp file, then rename over the target
fn write_atomically(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = path
        .parent()
        .with_context(|| format!("Object path has no parent: {}", path.display()))?;
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create directory: {}", dir.display()))?;

    let mut staged = tempfile::Builder::new()
        .prefix(STAGING_PREFIX)
        .tempfile_in(dir)
        .with_context(|| format!("Failed to create temp file in {}", dir.display()))?;

    staged
        .write_all(bytes)
        .context("Failed to write object bytes")?;
    staged
        .as_file()
        .sync_all()
        .context("Failed to flush object bytes")?;

    staged
        .persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("Failed to move object into place: {}", path.display()))?;

    Ok(())
}

#[async_trait]
impl ObjectStore for FsObjectStore {
    // The filesystem keeps no content type; it is implied by the key suffix.
    async fn put(&self, key: &str, bytes: Vec<u8>, _content_type: &str) -> Result<()> {
        let path = self.object_path(key)?;

        tokio::task::spawn_blocking(move || write_atomically(&path, &bytes))
            .await
            .context("Object write task failed")?
    }

    async fn list(&self, prefix: &str) -> Result<Vec<StoredObject>> {
        let mut objects = Vec::new();
        let mut pending = vec![self.root.clone()];

        while let Some(dir) = pending.pop() {
            let mut entries = fs::read_dir(&dir)
                .await
                .with_context(|| format!("Failed to list directory: {}", dir.display()))?;

            while let Some(entry) = entries.next_entry().await? {
                if entry.file_name().to_string_lossy().starts_with('.') {
                    continue;
                }

                let file_type = entry.file_type().await?;
                if file_type.is_dir() {
                    pending.push(entry.path());
                    continue;
                }
                if !file_type.is_file() {
                    continue;
                }

                let Some(key) = self.key_for(&entry.path())? else {
                    warn!(
                        path = %entry.path().display(),
                        "Skipping object with non-UTF-8 name"
                    );
                    continue;
                };
                if !key.starts_with(prefix) {
                    continue;
                }

                let modified = entry
                    .metadata()
                    .await?
                    .modified()
                    .with_context(|| format!("No modification time for '{}'", key))?;

                objects.push(StoredObject::new(key, DateTime::<Utc>::from(modified)));
            }
        }

        objects.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(objects)
    }
}
